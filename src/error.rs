use thiserror::Error;

/// Errors surfaced by the load → series → figure pipeline.
///
/// Every variant is fatal to the current load or figure build; the UI
/// reports it and keeps no partial result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    /// The dataset could not be opened or decoded.
    #[error("cannot access dataset '{location}': {reason}")]
    DataAccess { location: String, reason: String },

    /// A requested variable is absent from the dataset.
    #[error("variable '{name}' not found in dataset")]
    VariableNotFound { name: String },

    /// A plotted series does not line up with the x-axis series.
    #[error("variable '{name}' has {len} samples per dive cycle, expected {expected}")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    /// The requested dive cycle does not exist for a variable.
    #[error("dive cycle {cycle} out of range for '{name}' ({cycles} cycles)")]
    CycleOutOfRange {
        name: String,
        cycle: usize,
        cycles: usize,
    },

    /// The declared shape does not match the number of stored values.
    #[error("variable '{name}' has shape {shape:?} but {len} values")]
    InvalidShape {
        name: String,
        shape: Vec<usize>,
        len: usize,
    },
}

impl ProfileError {
    /// Fold a loader error chain into a [`ProfileError::DataAccess`].
    pub fn data_access(location: &str, err: anyhow::Error) -> Self {
        ProfileError::DataAccess {
            location: location.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;
