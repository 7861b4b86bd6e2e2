use std::collections::BTreeMap;

use fhircloud_interface::Operation;
use serde::{Deserialize, Serialize};

/// The only rule table version understood by [`crate::RbacHandler`].
pub const SUPPORTED_RULES_VERSION: f64 = 1.0;

/// What members of one group may do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    pub operations: Vec<Operation>,
    pub resources: Vec<String>,
}

impl GroupRule {
    pub fn new(operations: &[Operation], resources: &[&str]) -> Self {
        Self {
            operations: operations.to_vec(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Returns true when the rule grants `operation`, on `resource_type` when one is given.
    pub fn allows(&self, operation: Operation, resource_type: Option<&str>) -> bool {
        self.operations.contains(&operation)
            && resource_type.is_none_or(|t| self.resources.iter().any(|r| r == t))
    }
}

/// Versioned rule table keyed by group name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacConfig {
    pub version: f64,
    pub group_rules: BTreeMap<String, GroupRule>,
}
