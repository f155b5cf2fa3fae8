use std::collections::HashSet;
use std::fmt;

use derive_new::new;
use itertools::Itertools;
use tracing::debug;

use crate::{
    enumerator::Combination,
    error::{GrayNormError, Result},
};

/// Value of an experimental variable for one sample
///
/// Cells that parse as a float are numeric so that `0` and `0.0` name the
/// same condition. Everything else, `nan` and `inf` included, is compared as
/// case-sensitive text.
#[derive(Debug, Clone)]
pub enum VariableValue {
    Numeric(f64),
    Text(String),
}
impl VariableValue {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(x) if x.is_finite() => VariableValue::Numeric(x),
            _ => VariableValue::Text(raw.to_string()),
        }
    }
}
impl PartialEq for VariableValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VariableValue::Numeric(a), VariableValue::Numeric(b)) => a == b,
            (VariableValue::Text(a), VariableValue::Text(b)) => a == b,
            _ => false,
        }
    }
}
impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Numeric(x) => write!(f, "{x}"),
            VariableValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A declared control variable and the value marking its unperturbed samples
#[derive(new, Debug, Clone, PartialEq)]
pub struct Control {
    pub variable: String,
    pub value: VariableValue,
}

/// The ordered candidate reference genes
#[derive(Debug, Clone, PartialEq)]
pub struct GenePanel {
    genes: Vec<String>,
}
impl GenePanel {
    /// Builds a panel, dropping repeated names but keeping first occurrences in order
    pub fn new(genes: Vec<String>) -> Self {
        let genes = genes.into_iter().unique().collect();
        Self { genes }
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Joins the names of a combination's genes in panel order
    pub fn label(&self, combination: &Combination) -> String {
        combination
            .indices()
            .iter()
            .map(|&i| self.genes[i].as_str())
            .join(" + ")
    }
}

/// One experimental observation
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub sample_id: String,
    /// One value per declared control variable, in declaration order
    pub variables: Vec<VariableValue>,
    /// One expression value per panel gene, in panel order
    pub expression: Vec<f64>,
}

/// Samples split by one control variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub control: Vec<usize>,
    pub treatment: Vec<usize>,
}

/// Samples sharing one distinct tuple of control-variable values
#[derive(Debug, Clone)]
pub struct ConditionGroup {
    pub values: Vec<VariableValue>,
    pub samples: Vec<usize>,
}

/// A raw table row as read from the input body
#[derive(new, Debug, Clone)]
pub struct RawRow {
    /// 1-based line number in the input file
    pub line: usize,
    pub fields: Vec<String>,
}

/// The validated, immutable expression dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    sample_id_column: String,
    panel: GenePanel,
    controls: Vec<Control>,
    samples: Vec<SampleRecord>,
}
impl Dataset {
    /// Validates the body of an input table against its declarations
    ///
    /// Column presence is checked before any row is looked at, so a missing
    /// declared column is reported even when the rows are malformed too.
    pub fn build(
        sample_id_column: &str,
        panel: GenePanel,
        controls: Vec<Control>,
        columns: &[String],
        rows: &[RawRow],
    ) -> Result<Self> {
        if panel.is_empty() {
            return Err(GrayNormError::data_format(
                "no candidate reference genes declared",
            ));
        }
        if controls.is_empty() {
            return Err(GrayNormError::data_format("no control variables declared"));
        }

        let sample_idx = column_index("sample ID", sample_id_column, columns)?;
        let gene_idx = panel
            .genes()
            .iter()
            .map(|g| column_index("reference gene", g, columns))
            .collect::<Result<Vec<_>>>()?;
        let control_idx = controls
            .iter()
            .map(|c| column_index("control variable", &c.variable, columns))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut samples = Vec::with_capacity(rows.len());
        for row in rows {
            let sample_id = required_field(row, sample_idx, sample_id_column)?.to_string();
            if !seen.insert(sample_id.clone()) {
                return Err(GrayNormError::data_format(format!(
                    "duplicate sample ID '{sample_id}' on line {}",
                    row.line
                )));
            }

            let variables = control_idx
                .iter()
                .zip(controls.iter())
                .map(|(&idx, c)| required_field(row, idx, &c.variable).map(VariableValue::parse))
                .collect::<Result<Vec<_>>>()?;

            let expression = gene_idx
                .iter()
                .zip(panel.genes())
                .map(|(&idx, gene)| parse_expression(row, idx, gene))
                .collect::<Result<Vec<_>>>()?;

            samples.push(SampleRecord {
                sample_id,
                variables,
                expression,
            });
        }

        if samples.is_empty() {
            return Err(GrayNormError::data_format("the table holds no sample rows"));
        }

        debug!(
            samples = samples.len(),
            genes = panel.len(),
            controls = controls.len(),
            "built expression dataset"
        );

        Ok(Self {
            sample_id_column: sample_id_column.to_string(),
            panel,
            controls,
            samples,
        })
    }

    pub fn sample_id_column(&self) -> &str {
        &self.sample_id_column
    }

    pub fn panel(&self) -> &GenePanel {
        &self.panel
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Expression value of a gene for one sample, looked up by name
    pub fn expression(&self, sample: usize, gene: &str) -> Option<f64> {
        let gene_idx = self.panel.genes().iter().position(|g| g == gene)?;
        self.samples.get(sample).map(|s| s.expression[gene_idx])
    }

    /// Value of a control variable for one sample, looked up by name
    pub fn variable(&self, sample: usize, variable: &str) -> Option<&VariableValue> {
        let var_idx = self.controls.iter().position(|c| c.variable == variable)?;
        self.samples.get(sample).map(|s| &s.variables[var_idx])
    }

    /// Splits all samples into control and treatment samples for one variable
    pub fn partition(&self, var_idx: usize) -> Partition {
        let control_value = &self.controls[var_idx].value;
        let (control, treatment): (Vec<usize>, Vec<usize>) = (0..self.samples.len())
            .partition(|&i| self.samples[i].variables[var_idx] == *control_value);
        Partition { control, treatment }
    }

    /// Samples that are controls for every declared variable
    pub fn joint_controls(&self) -> Vec<usize> {
        (0..self.samples.len())
            .filter(|&i| {
                self.samples[i]
                    .variables
                    .iter()
                    .zip(self.controls.iter())
                    .all(|(v, c)| *v == c.value)
            })
            .collect()
    }

    /// Groups samples by their tuple of control-variable values
    ///
    /// Groups appear in the order their first sample appears in the table.
    pub fn condition_groups(&self) -> Vec<ConditionGroup> {
        let mut groups: Vec<ConditionGroup> = Vec::new();
        for (i, sample) in self.samples.iter().enumerate() {
            match groups.iter_mut().find(|g| g.values == sample.variables) {
                Some(group) => group.samples.push(i),
                None => groups.push(ConditionGroup {
                    values: sample.variables.clone(),
                    samples: vec![i],
                }),
            }
        }
        groups
    }

    /// Label of a condition group, e.g. `exposure=0;time=24`
    pub fn condition_label(&self, group: &ConditionGroup) -> String {
        self.controls
            .iter()
            .zip(group.values.iter())
            .map(|(c, v)| format!("{}={}", c.variable, v))
            .join(";")
    }
}

fn column_index(kind: &str, name: &str, columns: &[String]) -> Result<usize> {
    columns.iter().position(|c| c == name).ok_or_else(|| {
        GrayNormError::data_format(format!(
            "no column for {kind} '{name}' present in the table header"
        ))
    })
}

fn required_field<'a>(row: &'a RawRow, idx: usize, column: &str) -> Result<&'a str> {
    match row.fields.get(idx).map(|s| s.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(GrayNormError::data_format(format!(
            "missing value for column '{column}' on line {}",
            row.line
        ))),
    }
}

fn parse_expression(row: &RawRow, idx: usize, gene: &str) -> Result<f64> {
    let raw = required_field(row, idx, gene)?;
    match raw.parse::<f64>() {
        Ok(x) if x.is_finite() && x > 0.0 => Ok(x),
        Ok(_) => Err(GrayNormError::data_format(format!(
            "expression value '{raw}' for gene '{gene}' on line {} must be a positive finite number",
            row.line
        ))),
        Err(_) => Err(GrayNormError::data_format(format!(
            "non-numeric expression value '{raw}' for gene '{gene}' on line {}",
            row.line
        ))),
    }
}
