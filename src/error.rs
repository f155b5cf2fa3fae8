use std::path::PathBuf;

use thiserror::Error;

/// Every way a GrayNorm run can fail
///
/// None of these are recoverable: the computation is deterministic, so the
/// caller reports the error and stops without writing any output.
#[derive(Debug, Error)]
pub enum GrayNormError {
    /// Malformed or inconsistent header block or table body
    #[error("DataFormatError: {0}")]
    DataFormat(String),

    /// A control variable has no control samples or no treatment samples
    #[error(
        "InsufficientDataError: control variable '{variable}' needs at least one control and one treatment sample"
    )]
    InsufficientData { variable: String },

    /// The candidate panel is too large for exhaustive enumeration
    #[error(
        "CombinatorialLimitError: {panel_size} candidate reference genes exceed the configured limit of {limit}"
    )]
    CombinatorialLimit { limit: usize, panel_size: usize },

    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),

    #[error("IoError: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CsvError: {0}")]
    Csv(#[from] csv::Error),
}

impl GrayNormError {
    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    pub fn insufficient_data(variable: impl Into<String>) -> Self {
        Self::InsufficientData {
            variable: variable.into(),
        }
    }

    /// Process exit code used by the command line tool for this error class
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { .. } | Self::Csv(_) => 2,
            Self::DataFormat(_) => 3,
            Self::InsufficientData { .. } => 4,
            Self::CombinatorialLimit { .. } => 5,
            Self::InvalidConfig(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, GrayNormError>;
