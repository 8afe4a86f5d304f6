use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid cube: {message}")]
    InvalidCube { message: String },

    #[error("Cube shape mismatch: dimensions {shape:?} expect {expected} values, got {actual}")]
    CubeShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Request for table {table} returned HTTP {status}")]
    HttpStatusError { table: String, status: u16 },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::InvalidCube { .. }
            | EtlError::CubeShapeMismatch { .. }
            | EtlError::InsufficientData { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 相關係數無法計算只影響單一比較
            EtlError::InsufficientData { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::InvalidCube { .. }
            | EtlError::CubeShapeMismatch { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => {
                "Check network access to the CSO API or rerun with --offline to use bundled sample data"
            }
            EtlError::InvalidCube { .. } | EtlError::CubeShapeMismatch { .. } => {
                "The statistics service returned a malformed cube; verify the table id and query filters"
            }
            EtlError::InsufficientData { .. } => {
                "Widen the year range so both series share at least two varying observations"
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                "Inspect the series filters and year dimension names in the configuration"
            }
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            EtlError::ZipError(_) | EtlError::IoError(_) => {
                "Check that the output path exists and is writable"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the statistics service: {}", self),
            ErrorCategory::Data => format!("The data could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
