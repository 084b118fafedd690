use thiserror::Error;

/// Failures that stop the run before any JSON is written.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("text extraction failed for {path}: {reason}")]
    TextExtraction { path: String, reason: String },

    #[error("text extraction produced no text for {path}")]
    EmptyText { path: String },

    #[error("toc extraction failed: no table-of-contents entries recognized")]
    EmptyToc,
}

/// Recoverable issues collected during a run and reported in the summary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    #[error("duplicate toc id {id}; keeping first occurrence")]
    DuplicateTocId { id: String },

    #[error("heading for control {id} not found in body text")]
    HeadingNotFound { id: String },

    #[error("control {id} missing {field} section")]
    MissingField { id: String, field: &'static str },

    #[error("parser worker failed on control {id}: {reason}")]
    WorkerFailure { id: String, reason: String },
}
