//! Delimited point files: one point per line, coordinates separated by a
//! single ASCII delimiter. Blank lines and lines starting with `#` are
//! skipped.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::CliError;

/// Reads every coordinate row from `reader`.
///
/// A whitespace delimiter accepts runs of that character between fields.
/// Rows may differ in length; the point cloud rejects ragged input.
pub(super) fn parse_points(
    reader: impl Read,
    delimiter: char,
    path: &Path,
) -> Result<Vec<Vec<f64>>, CliError> {
    let byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(CliError::Delimiter { delimiter })?;
    let collapse = delimiter.is_ascii_whitespace();
    let mut input = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(byte)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in input.records() {
        let record = record.map_err(|err| read_error(err, path))?;
        let row = parse_record(&record, collapse, path)?;
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn parse_record(record: &StringRecord, collapse: bool, path: &Path) -> Result<Vec<f64>, CliError> {
    let line = record.position().map_or(0, |position| line_number(position.line()));
    let blank = record.iter().all(str::is_empty);
    record
        .iter()
        .filter(|field| !(blank || (collapse && field.is_empty())))
        .map(|field| {
            field.parse::<f64>().map_err(|err| CliError::Parse {
                path: path.to_path_buf(),
                line,
                message: format!("`{field}` is not a number: {err}"),
            })
        })
        .collect()
}

fn read_error(err: csv::Error, path: &Path) -> CliError {
    let line = err
        .position()
        .map_or(0, |position| line_number(position.line()));
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => CliError::Io {
            path: path.to_path_buf(),
            source,
        },
        _ => CliError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        },
    }
}

fn line_number(line: u64) -> usize {
    usize::try_from(line).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(contents: &str, delimiter: char) -> Result<Vec<Vec<f64>>, CliError> {
        parse_points(contents.as_bytes(), delimiter, Path::new("points.txt"))
    }

    #[rstest]
    #[case("0;1\n2;3\n", ';')]
    #[case("0\t1\n2\t3\n", '\t')]
    #[case("0   1\n 2 3 \n", ' ')]
    #[case("# header\n0, 1\n\n   \n2 ,3\n", ',')]
    fn rows_are_read_for_each_delimiter(#[case] contents: &str, #[case] delimiter: char) {
        let rows = parse(contents, delimiter).expect("rows parse");
        assert_eq!(rows, [vec![0.0, 1.0], vec![2.0, 3.0]]);
    }

    #[test]
    fn ragged_rows_are_left_to_the_point_cloud() {
        let rows = parse("0,0\n1,0,2\n", ',').expect("rows parse");
        assert_eq!(rows, [vec![0.0, 0.0], vec![1.0, 0.0, 2.0]]);
    }

    #[test]
    fn bad_field_reports_the_line_it_starts_on() {
        let err = parse("0,0\n\n# note\n2,nan-ish\n", ',').expect_err("field is not numeric");
        match err {
            CliError::Parse { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("nan-ish"), "message: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case('→')]
    #[case('é')]
    fn non_ascii_delimiters_are_rejected(#[case] delimiter: char) {
        let err = parse("0,0\n", delimiter).expect_err("delimiter is not ASCII");
        assert!(matches!(err, CliError::Delimiter { .. }));
        assert_eq!(err.code(), "CLI_DELIMITER");
    }
}
