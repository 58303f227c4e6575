/// Result of reading a file that is allowed to degrade to a default value.
///
/// The config file and the registries never fail a read because of bad
/// content: they fall back to an empty value. `Degraded` makes that fallback
/// visible to callers instead of hiding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The file was absent or parsed cleanly.
    Parsed(T),
    /// The file could not be read or parsed; `value` is the default.
    Degraded { value: T, reason: String },
}

impl<T> ParseOutcome<T> {
    /// Whether the value is a fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Discard the distinction and return the value.
    pub fn into_inner(self) -> T {
        match self {
            Self::Parsed(value) | Self::Degraded { value, .. } => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_inner_returns_value_for_both_variants() {
        assert_eq!(ParseOutcome::Parsed(3).into_inner(), 3);
        let degraded = ParseOutcome::Degraded {
            value: 0,
            reason: "bad".to_string(),
        };
        assert!(degraded.is_degraded());
        assert_eq!(degraded.into_inner(), 0);
    }
}
