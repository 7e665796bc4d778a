//! Table types produced by the CSV loader

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A row object: column name to converted cell value
pub type RowMap = BTreeMap<String, Cell>;

/// A converted cell value.
///
/// Serializes untagged: a number, a string, or `null`. NaN and `Missing` both
/// serialize as `null`; [`Table`] and [`TableSummary`] turn `null` back into
/// NaN in float columns when deserialized. A lone `Cell` reads `null` as
/// `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Value of a float-typed column (NaN when empty or missing)
    Number(f64),
    /// Value of a string-typed column
    Text(String),
    /// Cell absent from a short row in a string-typed column
    Missing,
}

impl Cell {
    /// Numeric value, if this cell belongs to a float column
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value, if this cell belongs to a string column
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) if n.is_nan() => write!(f, ""),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Missing => write!(f, ""),
        }
    }
}

/// Type inferred for a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Float,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Float => write!(f, "float"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

/// Minimum and maximum of a float column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    /// Range over `values`, counting NaN as zero. `None` when empty.
    pub fn of<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .fold(None, |acc, v| match acc {
                None => Some(NumericRange { min: v, max: v }),
                Some(r) => Some(NumericRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                }),
            })
    }
}

/// A fully loaded CSV table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableFields")]
pub struct Table {
    /// Header rows, in file order
    pub header: Vec<Vec<String>>,
    /// Column names built from the header rows (joined with '→')
    pub names: Vec<String>,
    /// Converted data, row-major
    pub data: Vec<Vec<Cell>>,
    /// One name → value map per data row
    pub rows: Vec<RowMap>,
    /// Column name → values down that column
    pub columns: BTreeMap<String, Vec<Cell>>,
    /// Inferred type of each column
    pub types: Vec<ColumnType>,
    /// Width-clipped string cells, header rows included
    pub raw: Vec<Vec<String>>,
    /// Range of each float column; string columns have no entry
    pub range: BTreeMap<String, NumericRange>,
    /// Column name → zero-based column index
    pub colnum: BTreeMap<String, usize>,
}

impl Table {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Get the number of data rows
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Values of a column by name
    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Inferred type of a column by name
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.colnum.get(name).and_then(|&i| self.types.get(i).copied())
    }

    /// Drop the column-oriented views, keeping the summary fields
    pub fn into_summary(self) -> TableSummary {
        TableSummary {
            rows: self.rows,
            types: self.types,
            range: self.range,
            colnum: self.colnum,
        }
    }
}

/// Row-oriented view of a CSV table with type and range metadata only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SummaryFields")]
pub struct TableSummary {
    pub rows: Vec<RowMap>,
    pub types: Vec<ColumnType>,
    pub range: BTreeMap<String, NumericRange>,
    pub colnum: BTreeMap<String, usize>,
}

impl TableSummary {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// `Table` as it appears in JSON, before float cells are restored
#[derive(Deserialize)]
struct TableFields {
    header: Vec<Vec<String>>,
    names: Vec<String>,
    data: Vec<Vec<Cell>>,
    rows: Vec<RowMap>,
    columns: BTreeMap<String, Vec<Cell>>,
    types: Vec<ColumnType>,
    raw: Vec<Vec<String>>,
    range: BTreeMap<String, NumericRange>,
    colnum: BTreeMap<String, usize>,
}

/// `TableSummary` as it appears in JSON, before float cells are restored
#[derive(Deserialize)]
struct SummaryFields {
    rows: Vec<RowMap>,
    types: Vec<ColumnType>,
    range: BTreeMap<String, NumericRange>,
    colnum: BTreeMap<String, usize>,
}

/// JSON has no NaN: a `null` read back in a float column is NaN
fn restore_nan(cell: &mut Cell, column_type: Option<ColumnType>) {
    if column_type == Some(ColumnType::Float) && cell.is_missing() {
        *cell = Cell::Number(f64::NAN);
    }
}

fn named_type(
    name: &str,
    colnum: &BTreeMap<String, usize>,
    types: &[ColumnType],
) -> Option<ColumnType> {
    colnum.get(name).and_then(|&j| types.get(j).copied())
}

fn restore_rows(rows: &mut [RowMap], colnum: &BTreeMap<String, usize>, types: &[ColumnType]) {
    for row in rows {
        for (name, cell) in row.iter_mut() {
            restore_nan(cell, named_type(name, colnum, types));
        }
    }
}

impl From<TableFields> for Table {
    fn from(mut fields: TableFields) -> Self {
        for row in &mut fields.data {
            for (j, cell) in row.iter_mut().enumerate() {
                restore_nan(cell, fields.types.get(j).copied());
            }
        }
        for (name, column) in fields.columns.iter_mut() {
            let column_type = named_type(name, &fields.colnum, &fields.types);
            for cell in column {
                restore_nan(cell, column_type);
            }
        }
        restore_rows(&mut fields.rows, &fields.colnum, &fields.types);

        Table {
            header: fields.header,
            names: fields.names,
            data: fields.data,
            rows: fields.rows,
            columns: fields.columns,
            types: fields.types,
            raw: fields.raw,
            range: fields.range,
            colnum: fields.colnum,
        }
    }
}

impl From<SummaryFields> for TableSummary {
    fn from(mut fields: SummaryFields) -> Self {
        restore_rows(&mut fields.rows, &fields.colnum, &fields.types);
        TableSummary {
            rows: fields.rows,
            types: fields.types,
            range: fields.range,
            colnum: fields.colnum,
        }
    }
}

/// Result of a load, shaped by [`crate::Shape`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadedTable {
    Full(Table),
    Summary(TableSummary),
}

impl LoadedTable {
    pub fn rows(&self) -> &[RowMap] {
        match self {
            LoadedTable::Full(t) => &t.rows,
            LoadedTable::Summary(s) => &s.rows,
        }
    }

    pub fn types(&self) -> &[ColumnType] {
        match self {
            LoadedTable::Full(t) => &t.types,
            LoadedTable::Summary(s) => &s.types,
        }
    }

    pub fn range(&self) -> &BTreeMap<String, NumericRange> {
        match self {
            LoadedTable::Full(t) => &t.range,
            LoadedTable::Summary(s) => &s.range,
        }
    }

    pub fn colnum(&self) -> &BTreeMap<String, usize> {
        match self {
            LoadedTable::Full(t) => &t.colnum,
            LoadedTable::Summary(s) => &s.colnum,
        }
    }

    /// The full table, if this load kept every view
    pub fn as_full(&self) -> Option<&Table> {
        match self {
            LoadedTable::Full(t) => Some(t),
            LoadedTable::Summary(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_of_values() {
        let range = NumericRange::of([3.0, 1.0, 2.0]).unwrap();
        assert_eq!(range, NumericRange { min: 1.0, max: 3.0 });
    }

    #[test]
    fn test_range_counts_nan_as_zero() {
        let range = NumericRange::of([2.0, f64::NAN, 4.0]).unwrap();
        assert_eq!(range, NumericRange { min: 0.0, max: 4.0 });
    }

    #[test]
    fn test_range_of_nothing() {
        assert_eq!(NumericRange::of(std::iter::empty()), None);
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let cells = vec![Cell::Number(1.5), Cell::from("x"), Cell::Missing];
        assert_eq!(serde_json::to_string(&cells).unwrap(), r#"[1.5,"x",null]"#);
    }

    #[test]
    fn test_nan_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Cell::Number(f64::NAN)).unwrap(), "null");
    }

    #[test]
    fn test_column_type_names() {
        assert_eq!(
            serde_json::to_string(&[ColumnType::Float, ColumnType::String]).unwrap(),
            r#"["float","string"]"#
        );
        assert_eq!(ColumnType::Float.to_string(), "float");
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(2.0).to_string(), "2");
        assert_eq!(Cell::Number(f64::NAN).to_string(), "");
        assert_eq!(Cell::Missing.to_string(), "");
        assert_eq!(Cell::from("abc").to_string(), "abc");
    }

    fn table_with_blanks() -> Table {
        crate::loader::build_table(
            "n,s\n1,a\n,\n3",
            std::path::Path::new("blanks.csv"),
            crate::DuplicatePolicy::LastWins,
        )
        .unwrap()
    }

    #[test]
    fn test_table_json_keeps_nan_in_float_columns() {
        let table = table_with_blanks();
        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();

        assert!(back.data[1][0].as_f64().unwrap().is_nan());
        assert!(back.columns["n"][1].as_f64().unwrap().is_nan());
        assert!(back.rows[1]["n"].as_f64().unwrap().is_nan());
        assert_eq!(back.data[1][1], Cell::Text(String::new()));
        assert_eq!(back.data[2][1], Cell::Missing);
        assert_eq!(back.columns["s"][2], Cell::Missing);
        assert_eq!(back.range, table.range);
    }

    #[test]
    fn test_summary_json_keeps_nan_in_float_columns() {
        let summary = table_with_blanks().into_summary();
        let json = serde_json::to_string(&summary).unwrap();
        let back: TableSummary = serde_json::from_str(&json).unwrap();

        assert!(back.rows[1]["n"].as_f64().unwrap().is_nan());
        assert_eq!(back.rows[2]["s"], Cell::Missing);
    }

    #[test]
    fn test_lone_null_cell_is_missing() {
        assert_eq!(serde_json::from_str::<Cell>("null").unwrap(), Cell::Missing);
    }
}
