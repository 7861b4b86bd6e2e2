//! Group rules applied by the RBAC handler.

use std::collections::BTreeMap;

use fhircloud_authz::{GroupRule, RbacConfig, SUPPORTED_RULES_VERSION};
use fhircloud_interface::Operation;

/// Financial resources readable by non-practitioners.
pub const FINANCIAL_RESOURCES: &[&str] = &[
    "Coverage",
    "CoverageEligibilityRequest",
    "CoverageEligibilityResponse",
    "EnrollmentRequest",
    "EnrollmentResponse",
    "Claim",
    "ClaimResponse",
    "Invoice",
    "PaymentNotice",
    "PaymentReconciliation",
    "Account",
    "ChargeItem",
    "ChargeItemDefinition",
    "Contract",
    "ExplanationOfBenefit",
    "InsurancePlan",
];

const READ_ONLY: &[Operation] = &[Operation::Read, Operation::Vread, Operation::SearchType];

/// Builds the rule table for the `practitioner`, `non-practitioner` and `auditor` groups.
pub fn rbac_rules(base_resources: &[&str]) -> RbacConfig {
    let mut group_rules = BTreeMap::new();
    group_rules.insert(
        "practitioner".to_string(),
        GroupRule::new(
            &[
                Operation::Create,
                Operation::Read,
                Operation::Update,
                Operation::Delete,
                Operation::Vread,
                Operation::SearchType,
                Operation::Transaction,
            ],
            base_resources,
        ),
    );
    group_rules.insert(
        "non-practitioner".to_string(),
        GroupRule::new(READ_ONLY, FINANCIAL_RESOURCES),
    );
    group_rules.insert("auditor".to_string(), GroupRule::new(READ_ONLY, &["Patient"]));

    RbacConfig {
        version: SUPPORTED_RULES_VERSION,
        group_rules,
    }
}
