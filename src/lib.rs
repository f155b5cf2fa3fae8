//! GrayNorm: selection of stable reference gene combinations for RT-qPCR
//!
//! This library implements the GrayNorm algorithm, which ranks combinations
//! of candidate reference genes by how little their normalization factor is
//! disturbed by the experimental conditions.
//!
//! The main components of this library are:
//! - `read_file` / `parse_str`: Load and validate an annotated expression table
//! - `Dataset`: The immutable, validated expression dataset
//! - `CombinationEnumerator`: The restartable sequence of gene combinations
//! - `StabilityScorer`: Scores one combination against the control partitions
//! - `GrayNorm`: The main algorithm implementation
//! - `GrayNormConfig`: Configuration of the combinatorial search
//! - `GrayNormResults`: The ranked table and its CSV writer

mod config;
mod dataset;
mod enumerator;
mod error;
mod graynorm;
mod header;
mod loader;
mod math;
mod normalization;
mod results;
mod scorer;
mod utils;

pub use config::{GrayNormConfig, DEFAULT_COMBINATORIAL_LIMIT};
pub use dataset::{
    ConditionGroup, Control, Dataset, GenePanel, Partition, RawRow, SampleRecord, VariableValue,
};
pub use enumerator::{Combination, CombinationEnumerator, MAX_COMBINATORIAL_LIMIT};
pub use error::{GrayNormError, Result};
pub use graynorm::GrayNorm;
pub use header::HeaderDeclarations;
pub use loader::{parse_str, read_file, resolve_gene_spec};
pub use normalization::{compute as normalization_factor, compute_all as normalization_factors};
pub use results::{CombinationResult, GrayNormResults};
pub use scorer::{CombinationScore, ConditionStats, StabilityScorer};
