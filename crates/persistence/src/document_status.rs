use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state stored on every resource version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Available,
    Locked,
    Pending,
    PendingDelete,
    Deleted,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Available => "AVAILABLE",
            DocumentStatus::Locked => "LOCKED",
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::PendingDelete => "PENDING_DELETE",
            DocumentStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_as_str() {
        for status in [
            DocumentStatus::Available,
            DocumentStatus::Locked,
            DocumentStatus::Pending,
            DocumentStatus::PendingDelete,
            DocumentStatus::Deleted,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
    }
}
