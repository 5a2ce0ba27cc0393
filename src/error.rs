use thiserror::Error;

// ---------------------------------------------------------------------------
// Table construction
// ---------------------------------------------------------------------------

/// Violations of the [`Table`](crate::data::model::Table) invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("column '{column}' has {found} values but the table has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Parse(String),
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        LoadError::Parse(e.to_string())
    }
}

impl From<calamine::Error> for LoadError {
    fn from(e: calamine::Error) -> Self {
        LoadError::Parse(e.to_string())
    }
}

impl From<TableError> for LoadError {
    fn from(e: TableError) -> Self {
        LoadError::Parse(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("No numeric columns available for visualization")]
    NoNumericColumns,

    #[error("'{0}' is not a numeric column")]
    UnknownColumn(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("Error during conversion: {0}")]
    Serialization(String),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Serialization(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Serialization(e.to_string())
    }
}

/// Everything that can stop one file's pipeline. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileError {
    #[error("File {name} ({size_mb:.2} MB) exceeds maximum size limit. Skipping...")]
    SizeLimitExceeded { name: String, size_mb: f64 },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}
