//! Reading and writing of [Newick](https://en.wikipedia.org/wiki/Newick_format) text.

use crate::{Branch, FromNewick, Node, PhyloError, Phylogeny};
use color_eyre::eyre::{eyre, Report, Result};
use itertools::Itertools;
use petgraph::graph::NodeIndex;

/// A lexical unit of a Newick string.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Open,
    Close,
    Comma,
    End,
    /// Node attributes, a label and/or `:length`, quotes preserved.
    Text(String),
}

/// Splits a Newick string into [`Token`]s, each with the character offset it starts at.
///
/// - Whitespace outside of quotes is dropped.
/// - Square bracket comments are dropped.
///
/// ## Examples
///
/// ```rust
/// use soilmag_phylo::newick::{tokenize, Token};
/// let tokens = tokenize("(A:1, 'B C')90;")?;
/// assert_eq!(tokens, [
///     (0, Token::Open),
///     (1, Token::Text("A:1".to_string())),
///     (4, Token::Comma),
///     (6, Token::Text("'B C'".to_string())),
///     (11, Token::Close),
///     (12, Token::Text("90".to_string())),
///     (14, Token::End),
/// ]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn tokenize(newick: &str) -> Result<Vec<(usize, Token)>, Report> {
    let mut tokens = Vec::new();
    // attribute text being collected, and where it started
    let mut text = String::new();
    let mut start = 0;
    let mut chars = newick.chars().enumerate().peekable();

    let flush = |text: &mut String, start: usize, tokens: &mut Vec<(usize, Token)>| {
        if !text.is_empty() {
            tokens.push((start, Token::Text(std::mem::take(text))));
        }
    };

    while let Some((i, c)) = chars.next() {
        if text.is_empty() {
            start = i;
        }
        match c {
            '(' | ')' | ',' | ';' => {
                flush(&mut text, start, &mut tokens);
                let token = match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    ',' => Token::Comma,
                    _ => Token::End,
                };
                tokens.push((i, token));
            }
            '[' => {
                // comments do not nest
                if !chars.by_ref().any(|(_, c)| c == ']') {
                    Err(PhyloError::Newick { position: i, reason: "unclosed comment".into() })?
                }
            }
            '\'' => {
                text.push(c);
                loop {
                    match chars.next() {
                        // a doubled quote is an escaped quote inside the label
                        Some((_, '\'')) if matches!(chars.peek(), Some((_, '\''))) => {
                            chars.next();
                            text.push_str("''");
                        }
                        Some((_, '\'')) => {
                            text.push('\'');
                            break;
                        }
                        Some((_, c)) => text.push(c),
                        None => Err(PhyloError::Newick {
                            position: i,
                            reason: "unclosed quoted label".into(),
                        })?,
                    }
                }
            }
            c if c.is_whitespace() => {}
            c => text.push(c),
        }
    }
    flush(&mut text, start, &mut tokens);

    Ok(tokens)
}

/// Splits node attributes into a label and a raw branch length.
///
/// ## Examples
///
/// ```rust
/// use soilmag_phylo::newick::split_attributes;
/// assert_eq!(split_attributes("A:0.1")?, (Some("A".to_string()), Some("0.1")));
/// assert_eq!(split_attributes("'x:y'")?, (Some("x:y".to_string()), None));
/// assert_eq!(split_attributes("'it''s'")?, (Some("it's".to_string()), None));
/// assert_eq!(split_attributes(":2")?, (None, Some("2")));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn split_attributes(text: &str) -> Result<(Option<String>, Option<&str>), Report> {
    let text = text.trim().trim_end_matches(';');

    let (label, rest) = match text.strip_prefix('\'') {
        Some(quoted) => {
            // find the closing quote, skipping escaped ('') quotes
            let mut end = None;
            let mut chars = quoted.char_indices().peekable();
            while let Some((i, c)) = chars.next() {
                if c == '\'' {
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                    } else {
                        end = Some(i);
                        break;
                    }
                }
            }
            let end = end.ok_or_else(|| eyre!("Unclosed quoted label in newick: {text}"))?;
            (quoted[..end].replace("''", "'"), &quoted[end + 1..])
        }
        None => match text.find(':') {
            Some(i) => (text[..i].to_string(), &text[i..]),
            None => (text.to_string(), ""),
        },
    };

    let length = match rest.strip_prefix(':') {
        Some(length) => Some(length),
        None if rest.is_empty() => None,
        None => return Err(eyre!("Unexpected characters after label in newick: {text}")),
    };
    let label = (!label.is_empty()).then_some(label);

    Ok((label, length))
}

/// Returns a label quoted for Newick output, if it contains reserved characters.
///
/// ```rust
/// use soilmag_phylo::newick::quote_label;
/// assert_eq!(quote_label("bin_1"), "bin_1");
/// assert_eq!(quote_label("p__Acidobacteriota; 100"), "'p__Acidobacteriota; 100'");
/// assert_eq!(quote_label("it's"), "'it''s'");
/// ```
pub fn quote_label(label: &str) -> String {
    let reserved = |c: char| "()[]':;,".contains(c) || c.is_whitespace();
    match label.chars().any(reserved) {
        true => format!("'{}'", label.replace('\'', "''")),
        false => label.to_string(),
    }
}

/// Returns a [`Phylogeny`] parsed from a Newick string.
///
/// Parsing is iterative, so deeply nested (ex. ladder-like) trees do not
/// exhaust the stack.
///
/// ## Examples
///
/// ```rust
/// use soilmag_phylo::newick;
/// let phylo = newick::str_to_phylogeny("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;")?;
/// assert_eq!(phylo.get_tips(), ["A", "B", "C", "D"]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn str_to_phylogeny(newick: &str) -> Result<Phylogeny, Report> {
    let mut phylo = Phylogeny::new();
    // internal nodes whose closing parenthesis has not been seen yet
    let mut stack: Vec<NodeIndex> = Vec::new();
    // the node that trailing attribute text belongs to
    let mut last: Option<NodeIndex> = None;
    let mut root: Option<NodeIndex> = None;
    let mut finished = false;

    let malformed = |position: usize, reason: &str| -> Report {
        PhyloError::Newick { position, reason: reason.to_string() }.into()
    };

    for (i, token) in tokenize(newick)? {
        if finished {
            return Err(malformed(i, "content after the terminating ';'"));
        }
        match token {
            Token::Open => {
                if last.is_some() {
                    return Err(malformed(i, "'(' must follow '(' or ','"));
                }
                let node = phylo.graph.add_node(Node::new());
                attach(&mut phylo, &stack, &mut root, node, i)?;
                stack.push(node);
            }
            Token::Comma => {
                if stack.is_empty() {
                    return Err(malformed(i, "',' outside of parentheses"));
                }
                // an empty sibling, ex. (A,,B)
                if last.take().is_none() {
                    let node = phylo.graph.add_node(Node::new());
                    attach(&mut phylo, &stack, &mut root, node, i)?;
                }
            }
            Token::Close => {
                if stack.is_empty() {
                    return Err(malformed(i, "unbalanced ')'"));
                }
                // an empty last child, ex. (A,)
                if last.take().is_none() {
                    let node = phylo.graph.add_node(Node::new());
                    attach(&mut phylo, &stack, &mut root, node, i)?;
                }
                let node = stack.pop().ok_or_else(|| malformed(i, "unbalanced ')'"))?;
                last = Some(node);
            }
            Token::Text(text) => {
                let node = match last {
                    Some(node) => node,
                    None => {
                        let node = phylo.graph.add_node(Node::new());
                        attach(&mut phylo, &stack, &mut root, node, i)?;
                        node
                    }
                };
                phylo.graph[node] = Node::from_newick(&text)?;
                let branch = Branch::from_newick(&text)?;
                if let Some(edge) = phylo.get_parent_edge(node) {
                    phylo.graph[edge] = branch;
                }
                last = Some(node);
            }
            Token::End => {
                if !stack.is_empty() {
                    return Err(malformed(i, "unbalanced '('"));
                }
                finished = true;
            }
        }
    }

    if !stack.is_empty() {
        return Err(malformed(newick.chars().count(), "missing ')'"));
    }

    // tip labels identify records, they must be unique
    if let Some(duplicate) = phylo.get_tips().into_iter().duplicates().next() {
        Err(PhyloError::DuplicateTip(duplicate.to_string()))?
    }

    Ok(phylo)
}

/// Connect a new node to the innermost open node, or make it the root.
fn attach(
    phylo: &mut Phylogeny,
    stack: &[NodeIndex],
    root: &mut Option<NodeIndex>,
    node: NodeIndex,
    position: usize,
) -> Result<(), Report> {
    match stack.last() {
        Some(parent) => {
            phylo.graph.add_edge(*parent, node, Branch::new());
        }
        None if root.is_none() => *root = Some(node),
        None => Err(PhyloError::Newick { position, reason: "multiple root nodes".into() })?,
    }
    Ok(())
}

/// Returns the Newick string of a [`Phylogeny`].
///
/// - An empty phylogeny is written as `;`.
///
/// ## Examples
///
/// ```rust
/// use soilmag_phylo::newick;
/// let nwk = "((A:1,B:2)95:0.5,'C D':3);";
/// let phylo = newick::str_to_phylogeny(nwk)?;
/// assert_eq!(newick::phylogeny_to_str(&phylo)?, nwk);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn phylogeny_to_str(phylo: &Phylogeny) -> Result<String, Report> {
    if phylo.is_empty() {
        return Ok(";".to_string());
    }
    let root = phylo.get_root_index()?;
    let mut newick = String::new();
    write_node(phylo, root, &mut newick)?;
    newick.push(';');
    Ok(newick)
}

/// Writes the subtree of `node` with an explicit stack, so that deep trees
/// do not exhaust the call stack.
fn write_node(phylo: &Phylogeny, node: NodeIndex, newick: &mut String) -> Result<(), Report> {
    enum Step {
        Enter(NodeIndex),
        Comma,
        Exit(NodeIndex),
    }

    let attributes = |node: NodeIndex, newick: &mut String| -> Result<(), Report> {
        if let Some(label) = &phylo.get_node(node)?.label {
            newick.push_str(&quote_label(label));
        }
        if let Some(length) = phylo.get_branch(node).and_then(|b| b.length) {
            newick.push_str(&format!(":{length}"));
        }
        Ok(())
    };

    let mut stack = vec![Step::Enter(node)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                let children = phylo.get_children(node);
                if children.is_empty() {
                    attributes(node, newick)?;
                    continue;
                }
                newick.push('(');
                stack.push(Step::Exit(node));
                // pushed in reverse, so children are written in order
                for (i, child) in children.into_iter().rev().enumerate() {
                    if i > 0 {
                        stack.push(Step::Comma);
                    }
                    stack.push(Step::Enter(child));
                }
            }
            Step::Comma => newick.push(','),
            Step::Exit(node) => {
                newick.push(')');
                attributes(node, newick)?;
            }
        }
    }
    Ok(())
}
