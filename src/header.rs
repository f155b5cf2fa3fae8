use crate::error::{GrayNormError, Result};

const SAMPLE_ID_KEY: &str = "sampleid";
const REFGENES_KEY: &str = "refgenes";
const CONTROLS_KEY: &str = "controls";

/// The declarations of a GrayNorm header block
///
/// Each field stays `None` until its `# keyword: value` line has been seen.
/// A later declaration of the same keyword replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderDeclarations {
    /// Name of the column holding the sample identifiers
    pub sample_id: Option<String>,
    /// Candidate reference gene columns, in declaration order
    pub refgenes: Option<Vec<String>>,
    /// `(variable, control value)` pairs, in declaration order
    pub controls: Option<Vec<(String, String)>>,
}

impl HeaderDeclarations {
    /// Feeds one `#` line into the declarations
    ///
    /// Lines that are not of the form `# keyword: value`, or whose keyword is
    /// unknown, are ignored.
    pub fn ingest(&mut self, line: &str) -> Result<()> {
        let Some((key, value)) = split_declaration(line) else {
            return Ok(());
        };
        match key {
            SAMPLE_ID_KEY => self.sample_id = Some(value.to_string()),
            REFGENES_KEY => self.refgenes = Some(split_list(value)),
            CONTROLS_KEY => self.controls = Some(parse_controls(value)?),
            _ => {}
        }
        Ok(())
    }
}

/// Returns true if the raw line belongs to the header block
pub fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("\"#")
}

/// Splits `# keyword: value` into its keyword and value
///
/// Spreadsheet exports tend to quote the line and pad it with empty trailing
/// fields, both are stripped first.
fn split_declaration(line: &str) -> Option<(&str, &str)> {
    let line = line
        .trim()
        .trim_end_matches(|c: char| c == ',' || c == ';' || c == '\t' || c == ' ');
    let line = line
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(line);
    let rest = line.trim_start().strip_prefix('#')?;
    let (key, value) = rest.split_once(':')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty()
        || value.is_empty()
        || !key.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    Some((key, value))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_controls(value: &str) -> Result<Vec<(String, String)>> {
    let mut controls = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((name, control)) = item.split_once('=') else {
            return Err(GrayNormError::data_format(format!(
                "no control value for control parameter '{item}', expected '<variable> = <value>'"
            )));
        };
        let (name, control) = (name.trim(), control.trim());
        if name.is_empty() || control.is_empty() {
            return Err(GrayNormError::data_format(format!(
                "incomplete control declaration '{item}', expected '<variable> = <value>'"
            )));
        }
        controls.push((name.to_string(), control.to_string()));
    }
    Ok(controls)
}
