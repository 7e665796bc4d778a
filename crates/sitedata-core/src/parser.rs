//! CSV tokenizer: raw text into rows of string cells

use crate::error::{Error, Result};
use std::path::Path;

/// Split delimited text into rows of string cells.
///
/// Quoting and escaping follow the `csv` crate. Rows may have differing
/// lengths; nothing is treated as a header here.
pub fn tokenize(content: &str, path: &Path) -> Result<Vec<Vec<String>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // Allow varying number of fields
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(content: &str) -> Vec<Vec<String>> {
        tokenize(content, Path::new("test.csv")).unwrap()
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            rows("a,b\n1,2\n3,4"),
            vec![vec!["a", "b"], vec!["1", "2"], vec!["3", "4"]]
        );
    }

    #[test]
    fn test_tokenize_keeps_ragged_rows() {
        let tokens = rows("a,b\n1,2,3\n2\n");
        assert_eq!(tokens[1].len(), 3);
        assert_eq!(tokens[2], vec!["2"]);
    }

    #[test]
    fn test_tokenize_quoted_fields() {
        let tokens = rows("name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n");
        assert_eq!(tokens[1], vec!["Smith, J", "said \"hi\""]);
    }

    #[test]
    fn test_tokenize_empty_trailing_cell() {
        assert_eq!(rows("a,b\n2,\n")[1], vec!["2", ""]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(rows("").is_empty());
    }
}
