//! FHIR interactions that a resource descriptor or the system level can enable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FhirError;

/// A FHIR interaction as named by resource descriptors and authorization rules.
///
/// The system-level interactions are included because authorization rules
/// name them alongside the resource interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// `GET [type]/[id]`
    Read,
    /// `GET [type]/[id]/_history/[vid]`
    Vread,
    /// `GET [type]?params`
    SearchType,
    /// `GET [type]/_history`
    HistoryType,
    /// `GET [type]/[id]/_history`
    HistoryInstance,
    /// `POST [type]`
    Create,
    /// `PUT [type]/[id]`
    Update,
    /// `DELETE [type]/[id]`
    Delete,
    /// `POST /` with a transaction Bundle
    Transaction,
    /// `GET /?params`
    SearchSystem,
    /// `GET /_history`
    HistorySystem,
}

impl Operation {
    /// Returns the FHIR interaction code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Vread => "vread",
            Operation::SearchType => "search-type",
            Operation::HistoryType => "history-type",
            Operation::HistoryInstance => "history-instance",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Transaction => "transaction",
            Operation::SearchSystem => "search-system",
            Operation::HistorySystem => "history-system",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Operation::Read),
            "vread" => Ok(Operation::Vread),
            "search-type" => Ok(Operation::SearchType),
            "history-type" => Ok(Operation::HistoryType),
            "history-instance" => Ok(Operation::HistoryInstance),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "transaction" => Ok(Operation::Transaction),
            "search-system" => Ok(Operation::SearchSystem),
            "history-system" => Ok(Operation::HistorySystem),
            other => Err(FhirError::InvalidResource(format!(
                "unknown operation: {}",
                other
            ))),
        }
    }
}

/// A system-level FHIR interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemOperation {
    /// Atomic processing of a transaction Bundle.
    Transaction,
    /// `GET /_history`
    HistorySystem,
    /// `GET /?params`
    SearchSystem,
}

impl SystemOperation {
    /// Returns the FHIR interaction code.
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemOperation::Transaction => "transaction",
            SystemOperation::HistorySystem => "history-system",
            SystemOperation::SearchSystem => "search-system",
        }
    }
}

impl fmt::Display for SystemOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
