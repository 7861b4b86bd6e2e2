//! # fhircloud-authz
//!
//! Role based access control keyed on the `cognito:groups` claim of the
//! caller's access token. A [`RbacConfig`] maps each group to the operations
//! and resource types it may use.

pub mod rbac;
pub mod rules;
mod token;

pub use rbac::RbacHandler;
pub use rules::{GroupRule, RbacConfig, SUPPORTED_RULES_VERSION};
