// CSV readers for the train, ideal and test datasets

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use idealfit_engine::source::PointIter;
use idealfit_engine::{CandidateRow, CandidateStore, CandidateTable, MatchError, TestPoint, TestPointSource};

use crate::error::IoError;

/// A fully parsed numeric CSV. The first column is always x.
///
/// `rows[i][j]` belongs to `headers[j]`; empty fields are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
    /// Whether `headers` came from the file or were synthesized.
    pub had_header: bool,
}

impl NumericCsv {
    /// Candidate names: every header after x.
    pub fn value_columns(&self) -> &[String] {
        self.headers.get(1..).unwrap_or(&[])
    }

    /// Reinterpret as an ideal-function table. Every row needs an x.
    pub fn into_candidate_table(self, source: &str) -> Result<CandidateTable, MatchError> {
        let first_line = if self.had_header { 2 } else { 1 };
        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, mut fields) in self.rows.into_iter().enumerate() {
            let x = match fields.first().copied().flatten() {
                Some(x) => x,
                None => return Err(MatchError::malformed(source, first_line + i, "")),
            };
            fields.remove(0);
            rows.push(CandidateRow { x, values: fields });
        }
        let columns = self.headers.into_iter().skip(1).collect();
        CandidateTable::new(columns, rows)
    }
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let file_err = |e: std::io::Error| IoError::File {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(file_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Guess the delimiter from the first lines: the candidate that splits
/// every sampled line into the same number (>1) of fields wins, then any
/// candidate that splits every line at all (ragged test files).
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(8).collect();
    let widths = |delim: u8| -> Vec<usize> {
        sample.iter().map(|line| line.split(delim as char).count()).collect()
    };

    for delim in DELIMITERS {
        let w = widths(delim);
        match w.first() {
            Some(&first) if first > 1 && w.iter().all(|&n| n == first) => return delim,
            _ => {}
        }
    }
    for delim in DELIMITERS {
        let w = widths(delim);
        if !w.is_empty() && w.iter().all(|&n| n > 1) {
            return delim;
        }
    }
    b','
}

fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn text(field: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(field)
}

/// Parse one numeric field. Non-finite values are rejected.
fn number(field: &str, source: &str, line: usize) -> Result<f64, IoError> {
    match field.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IoError::Number {
            source: source.into(),
            line,
            value: field.into(),
        }),
    }
}

/// A first record is a header only when neither of its leading (x, y)
/// fields is a number. `0,abc` is a data row with a bad value.
fn is_header<'a>(fields: impl IntoIterator<Item = &'a [u8]>) -> bool {
    let mut leading = fields.into_iter().take(2).peekable();
    leading.peek().is_some() && leading.all(|f| text(f).parse::<f64>().is_err())
}

fn synthesized_headers(width: usize) -> Vec<String> {
    match width {
        0 => vec![],
        1 => vec!["x".into()],
        2 => vec!["x".into(), "y".into()],
        n => std::iter::once("x".to_string())
            .chain((1..n).map(|i| format!("y{i}")))
            .collect(),
    }
}

fn line_of(record: &csv::ByteRecord, fallback: usize) -> usize {
    record.position().map_or(fallback, |p| p.line() as usize)
}

/// Parse a whole numeric table (train or ideal layout).
pub fn parse_numeric(content: &str, delimiter: u8, source: &str) -> Result<NumericCsv, IoError> {
    let mut reader = reader_builder(delimiter).from_reader(content.as_bytes());
    let csv_err = |e: csv::Error| IoError::Csv {
        source: source.into(),
        message: e.to_string(),
    };

    let mut headers: Option<Vec<String>> = None;
    let mut had_header = false;
    let mut rows = Vec::new();

    for (i, record) in reader.byte_records().enumerate() {
        let record = record.map_err(csv_err)?;
        let line = line_of(&record, i + 1);

        if headers.is_none() {
            if is_header(record.iter()) {
                headers = Some(record.iter().map(|f| text(f).into_owned()).collect());
                had_header = true;
                continue;
            }
            headers = Some(synthesized_headers(record.len()));
        }

        let width = headers.as_ref().map_or(0, Vec::len);
        if record.len() != width {
            return Err(IoError::Csv {
                source: source.into(),
                message: format!("line {line}: expected {width} fields, found {}", record.len()),
            });
        }

        let mut row = Vec::with_capacity(width);
        for field in record.iter() {
            let field = text(field);
            row.push(if field.is_empty() {
                None
            } else {
                Some(number(&field, source, line)?)
            });
        }
        rows.push(row);
    }

    Ok(NumericCsv {
        headers: headers.unwrap_or_default(),
        rows,
        had_header,
    })
}

/// Read and parse a numeric table from disk.
pub fn read_numeric_csv(path: &Path, delimiter: Option<u8>) -> Result<NumericCsv, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    parse_numeric(&content, delimiter, &path.display().to_string())
}

/// x and y from the first two fields of a test record; extra fields are ignored.
fn parse_point(record: &csv::ByteRecord, source: &str, line: usize) -> Result<TestPoint, IoError> {
    if record.len() < 2 {
        return Err(IoError::Number {
            source: source.into(),
            line,
            value: text(record.as_slice()).into_owned(),
        });
    }
    let x = number(&text(&record[0]), source, line)?;
    let y = number(&text(&record[1]), source, line)?;
    Ok(TestPoint::new(x, y))
}

/// Parse a test table with the same row rules as [`CsvTestPoints`].
/// Headers are always `x, y`.
pub fn parse_points(content: &str, delimiter: u8, source: &str) -> Result<NumericCsv, IoError> {
    let mut reader = reader_builder(delimiter).from_reader(content.as_bytes());
    let mut had_header = false;
    let mut rows = Vec::new();

    for (i, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| IoError::Csv {
            source: source.into(),
            message: e.to_string(),
        })?;
        if i == 0 && is_header(record.iter()) {
            had_header = true;
            continue;
        }
        let point = parse_point(&record, source, line_of(&record, i + 1))?;
        rows.push(vec![Some(point.x), Some(point.y)]);
    }

    Ok(NumericCsv {
        headers: synthesized_headers(2),
        rows,
        had_header,
    })
}

/// Read and parse a test table from disk.
pub fn read_points_csv(path: &Path, delimiter: Option<u8>) -> Result<NumericCsv, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    parse_points(&content, delimiter, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Engine collaborators
// ---------------------------------------------------------------------------

/// Ideal functions read straight from a CSV file.
pub struct CsvCandidates {
    path: PathBuf,
    delimiter: Option<u8>,
}

impl CsvCandidates {
    pub fn new(path: impl Into<PathBuf>, delimiter: Option<u8>) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }
}

impl CandidateStore for CsvCandidates {
    fn load_candidates(&mut self) -> Result<CandidateTable, MatchError> {
        let source = self.path.display().to_string();
        let csv = read_numeric_csv(&self.path, self.delimiter).map_err(|e| e.into_read_error(&source))?;
        csv.into_candidate_table(&source)
    }
}

/// Test points streamed from a CSV file, one record at a time.
///
/// Each call to [`TestPointSource::points`] reopens the file.
pub struct CsvTestPoints {
    path: PathBuf,
    delimiter: u8,
}

impl CsvTestPoints {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }
}

impl TestPointSource for CsvTestPoints {
    fn points(&mut self) -> Result<PointIter<'_>, MatchError> {
        let source = self.path.display().to_string();
        let file = File::open(&self.path)
            .map_err(|e| MatchError::source_unavailable(source.as_str(), e.to_string()))?;
        let records = reader_builder(self.delimiter).from_reader(file).into_byte_records();
        Ok(Box::new(PointRows {
            records,
            source,
            first: true,
            done: false,
        }))
    }
}

struct PointRows<R: Read> {
    records: csv::ByteRecordsIntoIter<R>,
    source: String,
    first: bool,
    done: bool,
}

impl<R: Read> Iterator for PointRows<R> {
    type Item = Result<TestPoint, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.done = true;
                    return Some(Err(MatchError::source_unavailable(self.source.as_str(), e.to_string())));
                }
            };
            let line = line_of(&record, 0);

            if std::mem::replace(&mut self.first, false) && is_header(record.iter()) {
                continue;
            }

            let parsed = parse_point(&record, &self.source, line).map_err(|e| e.into_read_error(&self.source));
            self.done = parsed.is_err();
            return Some(parsed);
        }
        None
    }
}
