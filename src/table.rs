//! Tabular records with named, typed columns
//!
//! A `Table` is the in-memory form of the processed patient table. Every column is either numeric
//! or categorical and all columns share the same number of rows. Tables are read from and
//! written to delimited files; the column kind is inferred while reading.
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use ndarray::{Array1, Array2};

use crate::dataset::{Records, Select};
use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A single column of a table
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric values, missing cells are NaN
    Numeric(Vec<f64>),
    /// String values
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(x) => x.len(),
            Column::Categorical(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Render the cell at `idx` the way it is written to a delimited file
    pub fn cell(&self, idx: usize) -> String {
        match self {
            Column::Numeric(x) if x[idx].is_nan() => String::new(),
            Column::Numeric(x) => x[idx].to_string(),
            Column::Categorical(x) => x[idx].clone(),
        }
    }

    fn select(&self, indices: &[usize]) -> Column {
        match self {
            Column::Numeric(x) => Column::Numeric(indices.iter().map(|i| x[*i]).collect()),
            Column::Categorical(x) => {
                Column::Categorical(indices.iter().map(|i| x[*i].clone()).collect())
            }
        }
    }

    /// Infer the column kind from raw cells
    ///
    /// A column is numeric when all of its non-empty cells parse as numbers. Empty cells of a
    /// numeric column become NaN.
    fn infer(cells: Vec<String>) -> Column {
        let parsed = cells
            .iter()
            .map(|cell| {
                let cell = cell.trim();
                if cell.is_empty() {
                    Some(f64::NAN)
                } else {
                    cell.parse::<f64>().ok()
                }
            })
            .collect::<Option<Vec<f64>>>();

        match parsed {
            Some(values) => Column::Numeric(values),
            None => Column::Categorical(cells),
        }
    }
}

/// A table of named columns with equal length
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table without columns
    pub fn new() -> Self {
        Table::default()
    }

    /// Create a table from (name, column) pairs
    pub fn from_columns<I: Into<String>>(columns: Vec<(I, Column)>) -> Result<Self> {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }

        Ok(table)
    }

    /// Append a column, replacing an existing column of the same name
    pub fn push_column<I: Into<String>>(&mut self, name: I, column: Column) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.nrows() {
            return Err(Error::LengthMismatch {
                expected: self.nrows(),
                actual: column.len(),
            });
        }

        match self.position(&name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }

        Ok(())
    }

    /// Remove a column and return it
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let idx = self
            .position(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        self.names.remove(idx);

        Ok(self.columns.remove(idx))
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over (name, column) pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|x| x == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Returns the values of a numeric column
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(x) => Ok(x),
            Column::Categorical(_) => Err(Error::ColumnKind {
                name: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    /// Returns the values of a categorical column
    pub fn categorical(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Categorical(x) => Ok(x),
            Column::Numeric(_) => Err(Error::ColumnKind {
                name: name.to_string(),
                expected: "categorical",
            }),
        }
    }

    /// Interpret a numeric 0/1 column as boolean outcome
    pub fn binary(&self, name: &str) -> Result<Array1<bool>> {
        self.numeric(name)?
            .iter()
            .map(|x| match *x {
                x if x == 0.0 => Ok(false),
                x if x == 1.0 => Ok(true),
                _ => Err(Error::NotBinary(name.to_string())),
            })
            .collect()
    }

    /// Stack numeric columns into a matrix with one row per table row
    pub fn to_array(&self, names: &[String]) -> Result<Array2<f64>> {
        let mut array = Array2::zeros((self.nrows(), names.len()));
        for (col_idx, name) in names.iter().enumerate() {
            let values = self.numeric(name)?;
            array
                .column_mut(col_idx)
                .iter_mut()
                .zip(values)
                .for_each(|(a, b)| *a = *b);
        }

        Ok(array)
    }

    /// Keep only the rows for which `mask` is true
    pub fn filter(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.nrows() {
            return Err(Error::LengthMismatch {
                expected: self.nrows(),
                actual: mask.len(),
            });
        }
        let indices = mask
            .iter()
            .enumerate()
            .filter_map(|(idx, keep)| if *keep { Some(idx) } else { None })
            .collect::<Vec<_>>();

        Ok(self.select_rows(&indices))
    }

    /// Restrict the table to the given columns, in the given order
    pub fn select_columns(&self, names: &[String]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.column(name).map(|c| (name.clone(), c.clone())))
            .collect::<Result<Vec<_>>>()?;

        Table::from_columns(columns)
    }

    /// Read a table from a delimited reader with a header line
    pub fn from_reader<R: io::Read>(reader: R, delimiter: u8) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let names = reader
            .headers()?
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>();
        let mut cells = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record?;
            if record.len() != names.len() {
                return Err(Error::LengthMismatch {
                    expected: names.len(),
                    actual: record.len(),
                });
            }
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        Table::from_columns(
            names
                .into_iter()
                .zip(cells.into_iter().map(Column::infer))
                .collect(),
        )
    }

    /// Read a comma-separated file
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
        let file = File::open(path)?;
        Table::from_reader(file, b',')
    }

    /// Write the table with a header line
    pub fn to_writer<W: io::Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        writer.write_record(&self.names)?;
        for row in 0..self.nrows() {
            writer.write_record(self.columns.iter().map(|c| c.cell(row)))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write a comma-separated file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file, b',')
    }
}

impl Select for Table {
    fn select_rows(&self, indices: &[usize]) -> Self {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(indices)).collect(),
        }
    }
}

impl Records for Table {
    fn nsamples(&self) -> usize {
        self.nrows()
    }

    fn nfeatures(&self) -> usize {
        self.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn small_table() -> Table {
        Table::from_columns(vec![
            ("age", Column::Numeric(vec![50.0, 61.0, 45.0])),
            (
                "gender",
                Column::Categorical(vec!["female".into(), "male".into(), "female".into()]),
            ),
            ("flag_cardio", Column::Numeric(vec![1.0, 0.0, 1.0])),
        ])
        .unwrap()
    }

    #[test]
    fn infers_column_kinds() {
        let data = "id,height,gender,flag\n1,170,male,0\n2,,female,1\n3,158.5,female,1\n";
        let table = Table::from_reader(data.as_bytes(), b',').unwrap();

        assert_eq!(table.nrows(), 3);
        assert_eq!(table.names(), &["id", "height", "gender", "flag"]);
        assert!(table.column("height").unwrap().is_numeric());
        assert!(table.numeric("height").unwrap()[1].is_nan());
        assert_eq!(table.categorical("gender").unwrap()[0], "male");
        assert_eq!(table.binary("flag").unwrap(), array![false, true, true]);
    }

    #[test]
    fn rejects_unequal_columns() {
        let mut table = small_table();
        let res = table.push_column("x", Column::Numeric(vec![1.0]));

        assert!(matches!(
            res,
            Err(Error::LengthMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn selects_and_filters_rows() {
        let table = small_table();

        let filtered = table.filter(&[true, false, true]).unwrap();
        assert_eq!(filtered.numeric("age").unwrap(), &[50.0, 45.0]);

        let selected = table.select_rows(&[1, 1]);
        assert_eq!(selected.categorical("gender").unwrap(), &["male", "male"]);

        let array = table.to_array(&["age".to_string(), "flag_cardio".to_string()]).unwrap();
        assert_abs_diff_eq!(array, array![[50.0, 1.0], [61.0, 0.0], [45.0, 1.0]]);
    }

    #[test]
    fn reports_wrong_column_kind() {
        let table = small_table();

        assert!(matches!(table.numeric("gender"), Err(Error::ColumnKind { .. })));
        assert!(matches!(table.column("bmi"), Err(Error::MissingColumn(_))));
        assert!(matches!(table.binary("age"), Err(Error::NotBinary(_))));
    }

    #[test]
    fn csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");

        let mut table = small_table();
        table
            .push_column("bmi", Column::Numeric(vec![21.5, f64::NAN, 30.25]))
            .unwrap();
        table.write_csv(&path).unwrap();

        let loaded = Table::read_csv(&path).unwrap();
        assert_eq!(loaded.names(), table.names());
        assert_eq!(loaded.column("gender").unwrap(), table.column("gender").unwrap());
        assert!(loaded.numeric("bmi").unwrap()[1].is_nan());
        assert_abs_diff_eq!(loaded.numeric("bmi").unwrap()[2], 30.25);
    }
}
