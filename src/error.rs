use thiserror::Error;

/// Every failure the dashboard can surface.
///
/// Each variant halts the current render and carries enough context to tell
/// the user which step failed. None of them is retried.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed source file: missing column, wrong field count, bad number.
    #[error("data load failed: {0}")]
    DataLoad(String),

    #[error("invalid year range: {min}..={max} (upper bound below lower bound)")]
    InvalidRange { min: i32, max: i32 },

    #[error("invalid aggregation: '{0}'")]
    InvalidAggregation(String),

    #[error("invalid visualization: '{0}'")]
    InvalidVisualization(String),

    #[error("unknown metric group: '{0}'")]
    UnknownMetricGroup(String),

    /// Two rows for the same (company, period) reached a heatmap pivot.
    #[error("duplicate heatmap cell: company '{company}', period {period}")]
    DuplicateKey { company: String, period: i32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    pub fn data_load(message: impl Into<String>) -> Self {
        Self::DataLoad(message.into())
    }

    /// Process exit code for the binary.
    ///
    /// - 2: data source / filesystem
    /// - 3: invalid input reaching the pipeline
    /// - 4: terminal UI
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DataLoad(_) | Self::Io(_) => 2,
            Self::InvalidRange { .. }
            | Self::InvalidAggregation(_)
            | Self::InvalidVisualization(_)
            | Self::UnknownMetricGroup(_)
            | Self::DuplicateKey { .. } => 3,
            Self::Terminal(_) => 4,
        }
    }
}
