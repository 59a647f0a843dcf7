use thiserror::Error;

/// Failure modes of the blocking resolver capability.
///
/// `NotFound` and the failure variants are distinct so workers can log the
/// root cause; callers only ever observe an absent answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No records found for {0}")]
    NotFound(String),

    #[error("Invalid address literal: {0}")]
    InvalidAddress(String),

    #[error("Resolver backend failed for {argument}: {reason}")]
    Backend { argument: String, reason: String },
}

impl ResolveError {
    pub fn backend(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::Backend {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// True when the backend answered authoritatively that no record exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}
