//! CSV loader: tokenized rows into a typed table
//!
//! The pipeline is tokenize → clip to the first row's width → split the
//! header from the data → infer column types → convert → build views.
//! Header rows end at a row whose first cell is [`HEADER_SEPARATOR`];
//! without one, the header is the first row only.

use crate::error::{Error, Result};
use crate::infer::{convert, infer_types};
use crate::parser::tokenize;
use crate::table::{Cell, ColumnType, LoadedTable, NumericRange, RowMap, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// First cell of the row that closes a multi-row header
pub const HEADER_SEPARATOR: &str = "---";

/// Joins the fragments of a multi-row header into one column name
pub const NAME_JOINER: &str = "→";

/// Which views a load returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    /// Every view: header, names, data, rows, columns, types, raw, range, colnum
    #[default]
    Full,
    /// Rows, types, range and colnum only
    Summary,
}

/// What to do when two columns end up with the same name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later columns replace earlier ones in the name-keyed views
    #[default]
    LastWins,
    /// Fail the load
    Error,
    /// Rename repeats to `name_2`, `name_3`, ...
    Suffix,
}

/// Options controlling a load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub shape: Shape,
    pub duplicates: DuplicatePolicy,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Load options from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_source(path.as_ref())?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save options to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Load a CSV file, shaped by `options`
pub fn load_csv<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<LoadedTable> {
    let path = path.as_ref();
    let content = read_source(path)?;
    load_str(&content, path, options)
}

/// Load a CSV file with every view
pub fn load_table<P: AsRef<Path>>(path: P, duplicates: DuplicatePolicy) -> Result<Table> {
    let path = path.as_ref();
    let content = read_source(path)?;
    build_table(&content, path, duplicates)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load CSV text; `source` names it in errors and logs
pub fn load_str<P: AsRef<Path>>(
    content: &str,
    source: P,
    options: &LoadOptions,
) -> Result<LoadedTable> {
    let table = build_table(content, source.as_ref(), options.duplicates)?;
    Ok(match options.shape {
        Shape::Full => LoadedTable::Full(table),
        Shape::Summary => LoadedTable::Summary(table.into_summary()),
    })
}

/// Run the whole pipeline and assemble every view
pub fn build_table(content: &str, path: &Path, duplicates: DuplicatePolicy) -> Result<Table> {
    let mut raw = tokenize(content, path)?;

    let width = match raw.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(Error::EmptyHeader { path: path.to_path_buf() }),
    };
    clip_rows(&mut raw, width, path);

    let header_rows = remove_separator(&mut raw);
    if raw.len() <= header_rows {
        return Err(Error::NoData { path: path.to_path_buf() });
    }

    let header = raw[..header_rows].to_vec();
    let names = resolve_duplicates(column_names(&header, width), duplicates, path)?;

    let string_data = &raw[header_rows..];
    let types = infer_types(string_data, width);
    debug!(
        path = %path.display(),
        header_rows,
        data_rows = string_data.len(),
        columns = width,
        "inferred column types"
    );

    let data: Vec<Vec<Cell>> = string_data
        .iter()
        .map(|row| {
            types
                .iter()
                .enumerate()
                .map(|(j, &column_type)| convert(row.get(j).map(String::as_str), column_type))
                .collect()
        })
        .collect();

    let rows = build_rows(&names, &data);
    let columns = build_columns(&names, &data);
    let colnum = build_colnum(&names);
    let range = build_ranges(&names, &types, &data);

    Ok(Table {
        header,
        names,
        data,
        rows,
        columns,
        types,
        raw,
        range,
        colnum,
    })
}

/// Truncate every row to `width` cells; shorter rows stay short
fn clip_rows(rows: &mut [Vec<String>], width: usize, path: &Path) {
    for (row_idx, row) in rows.iter_mut().enumerate() {
        if row.len() > width {
            warn!(
                "row {} in {} has {} cells, truncating to {}",
                row_idx + 1,
                path.display(),
                row.len(),
                width
            );
            row.truncate(width);
        }
    }
}

/// Drop the header separator row, returning the number of header rows
fn remove_separator(rows: &mut Vec<Vec<String>>) -> usize {
    let separator = rows
        .iter()
        .position(|row| row.first().is_some_and(|cell| cell == HEADER_SEPARATOR));

    match separator {
        Some(k) if k > 0 => {
            rows.remove(k);
            k
        }
        _ => 1,
    }
}

/// Build one name per column from the header rows
pub fn column_names(header: &[Vec<String>], width: usize) -> Vec<String> {
    (0..width)
        .map(|j| {
            header.iter().fold(String::new(), |mut name, row| {
                let cell = row.get(j).map(String::as_str).unwrap_or("");
                if !name.is_empty() && !cell.is_empty() {
                    name.push_str(NAME_JOINER);
                }
                name.push_str(cell);
                name
            })
        })
        .collect()
}

fn resolve_duplicates(
    names: Vec<String>,
    policy: DuplicatePolicy,
    path: &Path,
) -> Result<Vec<String>> {
    match policy {
        DuplicatePolicy::LastWins => Ok(names),
        DuplicatePolicy::Error => {
            let mut seen = HashSet::new();
            for name in &names {
                if !seen.insert(name.as_str()) {
                    return Err(Error::DuplicateColumn {
                        path: path.to_path_buf(),
                        name: name.clone(),
                    });
                }
            }
            Ok(names)
        }
        DuplicatePolicy::Suffix => {
            let mut taken: HashSet<String> = names.iter().cloned().collect();
            let mut seen = HashSet::new();
            Ok(names
                .into_iter()
                .map(|name| {
                    if seen.insert(name.clone()) {
                        return name;
                    }
                    let renamed = (2..)
                        .map(|n| format!("{}_{}", name, n))
                        .find(|candidate| !taken.contains(candidate))
                        .unwrap_or_default();
                    taken.insert(renamed.clone());
                    seen.insert(renamed.clone());
                    renamed
                })
                .collect())
        }
    }
}

fn build_rows(names: &[String], data: &[Vec<Cell>]) -> Vec<RowMap> {
    data.iter()
        .map(|row| names.iter().cloned().zip(row.iter().cloned()).collect())
        .collect()
}

fn build_columns(names: &[String], data: &[Vec<Cell>]) -> BTreeMap<String, Vec<Cell>> {
    names
        .iter()
        .enumerate()
        .map(|(j, name)| (name.clone(), data.iter().map(|row| row[j].clone()).collect()))
        .collect()
}

fn build_colnum(names: &[String]) -> BTreeMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(j, name)| (name.clone(), j))
        .collect()
}

/// Ranges of float columns. For a repeated name the last column decides.
fn build_ranges(
    names: &[String],
    types: &[ColumnType],
    data: &[Vec<Cell>],
) -> BTreeMap<String, NumericRange> {
    names
        .iter()
        .enumerate()
        .fold(BTreeMap::new(), |mut ranges, (j, name)| {
            let range = match types[j] {
                ColumnType::Float => {
                    NumericRange::of(data.iter().map(|row| row[j].as_f64().unwrap_or(0.0)))
                }
                ColumnType::String => None,
            };
            match range {
                Some(range) => ranges.insert(name.clone(), range),
                None => ranges.remove(name),
            };
            ranges
        })
}

/// Load every CSV file under `roots`, keyed by file stem
pub fn load_dir<P: AsRef<Path>>(
    roots: &[P],
    options: &LoadOptions,
) -> Result<BTreeMap<String, LoadedTable>> {
    let files = crate::scanner::scan_directory(roots, "csv")?;
    let mut tables = BTreeMap::new();
    for file in files {
        let key = data_key(&file);
        debug!(path = %file.display(), key = %key, "loading data file");
        let table = load_csv(&file, options)?;
        if tables.insert(key.clone(), table).is_some() {
            warn!("data key '{}' loaded twice, keeping {}", key, file.display());
        }
    }
    Ok(tables)
}

/// Key a data file is registered under: its file stem
pub fn data_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
