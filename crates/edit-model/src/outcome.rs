//! Results that may have degraded to a fallback value.

use serde::{Deserialize, Serialize};

/// A value produced either normally or by a fallback path.
///
/// Degraded outcomes still carry a usable value; the reason records why
/// the normal path was abandoned so callers and tests can observe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Complete { value: T },
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn complete(value: T) -> Self {
        Self::Complete { value }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Complete { value } | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Complete { value } | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Why the fallback was used, if it was.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Complete { .. } => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_keeps_value_and_reason() {
        let outcome = Outcome::degraded(1u32, "oracle timed out");
        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some("oracle timed out"));
        assert_eq!(*outcome.value(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Outcome::complete(5u32)).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["value"], 5);
    }
}
