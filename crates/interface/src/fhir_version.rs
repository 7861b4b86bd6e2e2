//! Supported FHIR protocol versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FhirError;

/// A FHIR protocol version understood by the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FhirVersion {
    /// FHIR STU3 (3.0.1).
    #[serde(rename = "3.0.1")]
    Stu3,
    /// FHIR R4 (4.0.1).
    #[default]
    #[serde(rename = "4.0.1")]
    R4,
}

impl FhirVersion {
    /// Returns the full version string (e.g. `"4.0.1"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FhirVersion::Stu3 => "3.0.1",
            FhirVersion::R4 => "4.0.1",
        }
    }
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FhirVersion {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3.0.1" => Ok(FhirVersion::Stu3),
            "4.0.1" => Ok(FhirVersion::R4),
            other => Err(FhirError::InvalidResource(format!(
                "unsupported FHIR version: {}",
                other
            ))),
        }
    }
}
