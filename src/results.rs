use std::{fs, io::Write, path::Path};

use crate::{
    error::{GrayNormError, Result},
    scorer::CombinationScore,
};

/// A scored gene combination
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationResult {
    /// Position of the combination in enumeration order
    pub order: usize,
    /// Gene names joined in panel order
    pub label: String,
    pub size: usize,
    pub score: CombinationScore,
}

/// The ranked table of all scored combinations
#[derive(Debug, Clone, PartialEq)]
pub struct GrayNormResults {
    /// Control variable names, in declaration order
    pub variables: Vec<String>,
    /// Condition group labels, in dataset group order
    pub conditions: Vec<String>,
    /// Results, best first
    pub rows: Vec<CombinationResult>,
}
impl GrayNormResults {
    /// Ranks scored combinations
    ///
    /// Rows are ordered by stability score, then by combination size, then by
    /// enumeration order, so the ranking never depends on the order in which
    /// the results were produced.
    pub fn from_vec(
        variables: Vec<String>,
        conditions: Vec<String>,
        mut rows: Vec<CombinationResult>,
    ) -> Self {
        rows.sort_by(|a, b| {
            a.score
                .stability
                .total_cmp(&b.score.stability)
                .then(a.size.cmp(&b.size))
                .then(a.order.cmp(&b.order))
        });
        Self {
            variables,
            conditions,
            rows,
        }
    }

    pub fn best(&self) -> Option<&CombinationResult> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header_row(&self) -> Vec<String> {
        let mut row = vec!["gene combination".to_string(), "size".to_string()];
        row.extend(self.variables.iter().map(|v| format!("dispersion {v}")));
        row.push("stability score".to_string());
        row.push("CV inter".to_string());
        row.extend(self.conditions.iter().map(|c| format!("CV intra {c}")));
        for c in &self.conditions {
            row.extend(["avg", "stddev", "stderr"].map(|q| format!("{q} {c}")));
        }
        row.extend(
            ["avg 1/NF", "stddev 1/NF", "cumulative 1/NF"].map(str::to_string),
        );
        row
    }

    pub fn output_row(&self, result: &CombinationResult) -> Vec<String> {
        let score = &result.score;

        let mut row = vec![result.label.clone(), result.size.to_string()];
        row.extend(score.dispersions.iter().map(|&d| format_value(d)));
        row.push(format_value(score.stability));

        let Some(conditions) = &score.conditions else {
            // blank condition statistics: CV inter, 4 per group and 3 overall
            row.resize(row.len() + 4 + 4 * self.conditions.len(), String::new());
            return row;
        };
        row.push(format_optional(conditions.cv_inter()));
        row.extend(conditions.groups.iter().map(|g| format_optional(g.cv())));
        for g in &conditions.groups {
            row.push(format_value(g.mean));
            row.push(format_optional(g.stddev));
            row.push(format_optional(g.stderr));
        }
        row.push(format_value(conditions.overall.mean));
        row.push(format_optional(conditions.overall.stddev));
        row.push(format_value(conditions.cumulative));
        row
    }

    /// Writes the ranking as CSV, header row first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.header_row())?;
        for result in &self.rows {
            writer.write_record(self.output_row(result))?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Writes the ranking to a CSV file
    ///
    /// The table is rendered in memory first so the file is only created once
    /// the whole table exists.
    pub fn write_path(&self, path: &Path) -> Result<()> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        fs::write(path, buffer).map_err(|source| GrayNormError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn pprint(&self) {
        println!("{}", self.header_row().join("\t"));
        for result in &self.rows {
            println!("{}", self.output_row(result).join("\t"));
        }
    }
}

fn format_value(x: f64) -> String {
    format!("{x}")
}

fn format_optional(x: Option<f64>) -> String {
    x.map(format_value).unwrap_or_default()
}
