//! Engine errors

use snowplan_model::StepKey;
use snowplan_store::StoreError;

/// Errors surfaced by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Store backend failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Step key does not exist in this project
    #[error("unknown step: {0}")]
    UnknownStep(StepKey),

    /// Session has been torn down
    #[error("session closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_step_names_the_key() {
        let err = SessionError::UnknownStep(StepKey::from("scenes"));
        assert_eq!(err.to_string(), "unknown step: scenes");
    }
}
