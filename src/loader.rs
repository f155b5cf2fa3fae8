//! Reads a GrayNorm input table into a [`Dataset`]
//!
//! The input is a delimited text file with a `#` header block declaring the
//! sample ID column, the candidate reference genes and the control values:
//!
//! ```text
//! # sampleid: sample
//! # refgenes: G1, G2, G3
//! # controls: exposure = 0, time = 0
//! sample,exposure,time,G1,G2,G3
//! s1,0,0,1.02,0.98,1.10
//! ```
//!
//! `#` lines may appear anywhere. Blank lines, and lines holding nothing but
//! delimiters as spreadsheet exports write them, are skipped. The field
//! delimiter is sniffed from the column header row.

use std::{fs, path::Path};

use csv::{ReaderBuilder, Trim};
use tracing::info;

use crate::{
    dataset::{Control, Dataset, GenePanel, RawRow, VariableValue},
    error::{GrayNormError, Result},
    header::{is_header_line, HeaderDeclarations},
};

const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Loads and validates the input table at `path`
///
/// `refgenes` optionally overrides the header's candidate gene declaration,
/// see [`resolve_gene_spec`].
pub fn read_file(path: &Path, refgenes: Option<&str>) -> Result<Dataset> {
    let text = fs::read_to_string(path).map_err(|source| GrayNormError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_str(&text, refgenes)?;
    info!(
        path = %path.display(),
        samples = dataset.len(),
        genes = dataset.panel().len(),
        controls = dataset.controls().len(),
        "loaded expression table"
    );
    Ok(dataset)
}

/// Parses and validates an input table held in memory
pub fn parse_str(text: &str, refgenes: Option<&str>) -> Result<Dataset> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut header = HeaderDeclarations::default();
    let mut body = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if is_blank_line(line) {
            continue;
        }
        if is_header_line(line) {
            header.ingest(line)?;
        } else {
            body.push((i + 1, line));
        }
    }

    let Some(&(_, column_line)) = body.first() else {
        return Err(GrayNormError::data_format(
            "no column header row found after the header block",
        ));
    };
    let delimiter = sniff_delimiter(column_line);
    let mut records = read_records(&body, delimiter)?.into_iter();
    let columns = records.next().map(|r| r.fields).unwrap_or_default();
    let rows = records.collect::<Vec<_>>();

    let sample_id = header.sample_id.ok_or_else(|| missing_declaration("sampleid"))?;
    let controls = header
        .controls
        .ok_or_else(|| missing_declaration("controls"))?
        .into_iter()
        .map(|(variable, value)| Control::new(variable, VariableValue::parse(&value)))
        .collect();
    let genes = match refgenes {
        Some(spec) => resolve_gene_spec(spec, &columns)?,
        None => header.refgenes.ok_or_else(|| missing_declaration("refgenes"))?,
    };

    Dataset::build(&sample_id, GenePanel::new(genes), controls, &columns, &rows)
}

/// Empty, or only whitespace and delimiters such as `,,,,`
fn is_blank_line(line: &str) -> bool {
    line.bytes()
        .all(|b| b.is_ascii_whitespace() || DELIMITERS.contains(&b))
}

fn missing_declaration(keyword: &str) -> GrayNormError {
    GrayNormError::data_format(format!(
        "no '# {keyword}: ...' declaration in the header block"
    ))
}

/// Picks the most frequent of `,`, `;` and tab in the column header row
///
/// Ties go to the earlier delimiter in that list, and a row without any of
/// them is read as comma-separated.
pub fn sniff_delimiter(line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0;
    for delimiter in DELIMITERS {
        let count = line.bytes().filter(|&b| b == delimiter).count();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }
    best
}

/// Splits the body lines into trimmed fields, keeping input line numbers
fn read_records(body: &[(usize, &str)], delimiter: u8) -> Result<Vec<RawRow>> {
    let joined = body.iter().map(|(_, line)| *line).collect::<Vec<_>>().join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(joined.as_bytes());

    let mut rows = Vec::with_capacity(body.len());
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .and_then(|p| body.get(p.line() as usize - 1))
            .map(|(line, _)| *line)
            .unwrap_or_default();
        rows.push(RawRow::new(
            line,
            record.iter().map(str::to_string).collect(),
        ));
    }
    Ok(rows)
}

/// Resolves a candidate gene override against the table's column header row
///
/// `spec` is a comma-separated list whose items are column names, 1-based
/// column numbers, or inclusive 1-based column ranges such as `3-6`.
pub fn resolve_gene_spec(spec: &str, columns: &[String]) -> Result<Vec<String>> {
    let mut genes = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(range) = parse_range(item) {
            let (start, end) = range?;
            if start == 0 || start > end || end > columns.len() {
                return Err(GrayNormError::data_format(format!(
                    "invalid gene column range '{item}' for a table with {} columns",
                    columns.len()
                )));
            }
            genes.extend(columns[start - 1..end].iter().cloned());
        } else if columns.iter().any(|c| c == item) {
            genes.push(item.to_string());
        } else {
            return Err(GrayNormError::data_format(format!(
                "no column for reference gene '{item}' present in the table header"
            )));
        }
    }
    if genes.is_empty() {
        return Err(GrayNormError::data_format(format!(
            "invalid gene specification '{spec}'"
        )));
    }
    Ok(genes)
}

/// Parses `n` or `a-b` into an inclusive range; `None` if the item is a name
fn parse_range(item: &str) -> Option<Result<(usize, usize)>> {
    let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let (start, end) = match item.split_once('-') {
        Some((a, b)) if is_number(a.trim()) && is_number(b.trim()) => (a.trim(), b.trim()),
        None if is_number(item) => (item, item),
        _ => return None,
    };
    let parse = |s: &str| {
        s.parse::<usize>().map_err(|_| {
            GrayNormError::data_format(format!("invalid gene column number '{s}'"))
        })
    };
    Some(parse(start).and_then(|a| parse(end).map(|b| (a, b))))
}
