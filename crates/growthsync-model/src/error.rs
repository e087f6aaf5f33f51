//! Error types for the data model

/// Errors raised while building payloads from a draft
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Entries and names no longer pair up by index
    #[error("variation count mismatch: {entries} entries, {names} names")]
    VariationCountMismatch {
        /// Number of linked variation entries
        entries: usize,
        /// Number of variation names
        names: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_display() {
        let err = ModelError::VariationCountMismatch {
            entries: 1,
            names: 2,
        };
        assert_eq!(
            err.to_string(),
            "variation count mismatch: 1 entries, 2 names"
        );
    }
}
