//! Create and manipulate a row-based [`Table`].

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::PartialEq;
use std::fmt::{Debug, Display};
use std::io::Read;
use std::path::{Path, PathBuf};


/// A row-based [`Table`] of generic data (`T`) under named headers.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Table<T> {
    /// Names of the table columns.
    pub headers: Vec<String>,
    /// Rows of table values.
    pub rows: Vec<Vec<T>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl<T> Default for Table<T>
where
    T: Clone + Debug + Display + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T>
where
    T: Clone + Debug + Display + PartialEq,
{
    /// Returns a new row-based [`Table`] with empty headers and rows.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = soilmag_table::Table::new();
    /// table.headers = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    /// table.add_row(["A", "B", "C"])?;
    /// # assert_eq!(table.rows, vec![vec!["A", "B", "C"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// | 1 | 2 | 3 |
    /// |---|---|---|
    /// | A | B | C |
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }

    /// Returns true if the [`Table`] has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a new row to the table.
    ///
    /// - Returns an error if the row size does not match the headers.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = soilmag_table::Table::new();
    /// table.headers = vec!["1".to_string(), "2".to_string()];
    /// table.add_row(["A", "B"])?;
    /// assert!(table.add_row(["C"]).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_row<I>(&mut self, row: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = T>,
    {
        let row = row.into_iter().collect::<Vec<T>>();
        let (new, ex) = (row.len(), self.headers.len());
        if new != ex {
            return Err(eyre!("New row size ({new}) does not match the table headers ({ex})."));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the column index (0-based) of the header in the [`Table`].
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table: soilmag_table::Table<String> = soilmag_table::Table::new();
    /// table.headers = vec!["1".to_string(), "2".to_string()];
    /// assert_eq!(table.get_header_index("2")?, 1);
    /// assert!(table.get_header_index("3").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_header_index(&self, header: &str) -> Result<usize, Report> {
        self.headers
            .iter()
            .position(|h| h == header)
            .wrap_err_with(|| eyre!("Column '{header}' was not found in table: {:?}.", self.path))
    }

    /// Returns true if the header exists in the [`Table`].
    pub fn has_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }

    /// Renames a header, returns an error if the header does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), Report> {
        let header_i = self.get_header_index(from)?;
        self.headers[header_i] = to.to_string();
        Ok(())
    }

    /// Returns a new [`Table`] without the named columns.
    ///
    /// - Columns that do not exist are ignored.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = soilmag_table::Table::new();
    /// table.headers = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    /// table.add_row(["A", "B", "C"])?;
    /// let table = table.drop_columns(&["2", "4"]);
    /// assert_eq!(table.headers, ["1", "3"]);
    /// assert_eq!(table.rows, [["A", "C"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn drop_columns<S>(&self, headers: &[S]) -> Table<T>
    where
        S: AsRef<str>,
    {
        let keep = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_i, h)| !headers.iter().any(|d| d.as_ref() == h.as_str()))
            .map(|(i, _h)| i)
            .collect_vec();

        Table {
            headers: keep.iter().map(|i| self.headers[*i].clone()).collect(),
            rows: self.rows.iter().map(|row| keep.iter().map(|i| row[*i].clone()).collect()).collect(),
            path: self.path.clone(),
        }
    }

    /// Write [`Table`] to file [`Path`].
    ///
    /// - If `delim` is [`None`], the delimiter is identified from the file extension.
    ///
    /// ## Examples
    ///
    /// ```
    /// use tempfile::NamedTempFile;
    ///
    /// let mut table = soilmag_table::Table::new();
    /// table.headers = vec!["1".to_string(), "2".to_string()];
    /// table.add_row(["A", "B"])?;
    ///
    /// let file = NamedTempFile::new()?;
    /// table.write(&file.path(), Some(b'\t'))?;
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P, delim: Option<u8>) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = match delim {
            Some(c) => c,
            None => get_delimiter(path)?,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delim)
            .from_path(path)
            .wrap_err_with(|| eyre!("Unable to create file: {path:?}"))?;

        writer
            .write_record(&self.headers)
            .wrap_err_with(|| eyre!("Unable to write table headers: {:?}", self.headers))?;

        self.rows.iter().try_for_each(|row| {
            let record = row.iter().map(|v| v.to_string()).collect_vec();
            writer
                .write_record(&record)
                .wrap_err_with(|| eyre!("Unable to write table row: {record:?}"))?;
            Ok::<(), Report>(())
        })?;

        writer.flush().wrap_err_with(|| eyre!("Unable to flush table to file: {path:?}"))?;
        Ok(())
    }
}

impl Table<String> {
    /// Read a delimited file into a [`Table`].
    ///
    /// - If `delim` is [`None`], the delimiter is identified from the file extension.
    /// - An empty file returns an empty [`Table`] (no headers, no rows).
    ///
    /// ## Examples
    ///
    /// ```
    /// use std::io::Write;
    /// use tempfile::Builder;
    ///
    /// let mut file = Builder::new().suffix(".tsv").tempfile()?;
    /// writeln!(file, "1\t2\t3\nA\tB\tC")?;
    /// let table = soilmag_table::Table::read(&file.path(), None)?;
    /// assert_eq!(table.headers, ["1", "2", "3"]);
    /// assert_eq!(table.rows, [["A", "B", "C"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P, delim: Option<u8>) -> Result<Table<String>, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = match delim {
            Some(c) => c,
            None => get_delimiter(path)?,
        };
        let file =
            std::fs::File::open(path).wrap_err_with(|| eyre!("Failed to read file: {path:?}"))?;
        let mut table = Table::from_reader(file, delim)
            .wrap_err_with(|| eyre!("Failed to parse table: {path:?}"))?;
        table.path = Some(path.as_ref().to_path_buf());
        Ok(table)
    }

    /// Read delimited text from any [`Read`] source into a [`Table`].
    ///
    /// - Quoting is only honored for comma-delimited text, tab-delimited metadata
    ///   regularly contains bare quote characters.
    ///
    /// ## Examples
    ///
    /// ```
    /// let text = "name,value\nA,1\nB,\n";
    /// let table = soilmag_table::Table::from_reader(text.as_bytes(), b',')?;
    /// assert_eq!(table.rows, [["A", "1"], ["B", ""]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_reader<R>(reader: R, delim: u8) -> Result<Table<String>, Report>
    where
        R: Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(true)
            .quoting(delim == b',')
            .from_reader(reader);

        let mut table = Table::new();
        table.headers = reader
            .headers()
            .wrap_err("Failed to read table headers.")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // an empty source has no header line
        if table.headers.iter().all(|h| h.is_empty()) {
            table.headers.clear();
            return Ok(table);
        }

        for (i, record) in reader.records().enumerate() {
            let record = record.wrap_err_with(|| eyre!("Failed to read table row {}.", i + 1))?;
            table.add_row(record.iter().map(String::from))?;
        }

        Ok(table)
    }
}

/// Get delimiter based on file extension.
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// Note that `.txt` is assumed to be tab-delimited!
///
/// ```rust
/// use soilmag_table::get_delimiter;
///
/// assert_eq!(get_delimiter(&"file.tsv")?, b'\t');
/// assert_eq!(get_delimiter(&"file.csv")?, b',');
/// assert_eq!(get_delimiter(&"file.txt")?, b'\t');
/// assert!(get_delimiter(&"file").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn get_delimiter<P>(path: &P) -> Result<u8, Report>
where
    P: AsRef<Path> + Debug,
{
    let ext = path
        .as_ref()
        .extension()
        .wrap_err_with(|| eyre!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| eyre!("Failed to convert file extension to str: {path:?}"))?;
    // convert extension to the expected delimiter
    match ext {
        "tsv" | "txt" => Ok(b'\t'),
        "csv" => Ok(b','),
        _ext => {
            Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt"))
        }
    }
}
