use thiserror::Error;

/// Source CSV does not carry the columns a pipeline needs. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("CSV is missing expected columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("sheets api http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("service account key {path}: {message}")]
    ServiceAccount { path: String, message: String },
    #[error("token exchange failed: {message}")]
    Token { message: String },
}
