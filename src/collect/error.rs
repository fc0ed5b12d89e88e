use thiserror::Error;

/// Errors produced while growing the result table
#[derive(Debug, Error)]
pub enum CollectError {
    /// The allocator could not provide room for more records
    #[error("Cannot grow result table to {requested} records: {reason}")]
    OutOfMemory { requested: usize, reason: String },
}
