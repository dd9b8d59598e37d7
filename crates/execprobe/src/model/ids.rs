use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier shared by every log line, report and driver context of one suite run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new unique run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::RunId;

    #[test]
    fn run_ids_are_unique_and_serialize_as_plain_strings() {
        let first = RunId::new();
        let second = RunId::new();
        assert_ne!(first, second);

        let encoded = serde_json::to_string(&first).unwrap_or_default();
        assert_eq!(encoded, format!("\"{first}\""));
    }
}
