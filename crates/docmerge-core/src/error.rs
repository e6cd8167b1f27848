use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid signature for field {field}: {reason}")]
    InvalidSignature { field: String, reason: String },

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),
}
