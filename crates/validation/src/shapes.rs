//! Rulesets declared per DTO shape, the one place the constraint tables
//! for entity creation live.

use crate::rules::{EntityKind, FieldType, Rule, Ruleset};

/// Registration payload: every field is mandatory and the email must not
/// already belong to an identity.
pub fn registration_rules() -> Ruleset {
    Ruleset::new()
        .field("name", Rule::Required)
        .field("name", Rule::Type(FieldType::String))
        .field("email", Rule::Required)
        .field("email", Rule::Type(FieldType::Email))
        .field(
            "email",
            Rule::Unique {
                entity: EntityKind::Users,
                field: "email".to_string(),
            },
        )
        .field("password", Rule::Required)
        .field("password", Rule::Type(FieldType::String))
        .field("mobile_number", Rule::Required)
        .field("mobile_number", Rule::Type(FieldType::String))
}

/// Campaign payload: the overall budget must strictly exceed the daily
/// budget; equal values are rejected.
pub fn campaign_rules() -> Ruleset {
    Ruleset::new()
        .field("name", Rule::Required)
        .field("name", Rule::Type(FieldType::String))
        .field("end_date", Rule::Required)
        .field("end_date", Rule::Type(FieldType::Number))
        .field(
            "status",
            Rule::OneOf(vec![
                "active".to_string(),
                "paused".to_string(),
                "finished".to_string(),
            ]),
        )
        .field("budget", Rule::Required)
        .field("budget", Rule::Type(FieldType::Number))
        .field(
            "budget",
            Rule::GreaterThan {
                other: "daily_budget".to_string(),
            },
        )
        .field("daily_budget", Rule::Required)
        .field("daily_budget", Rule::Type(FieldType::Number))
        .field("company_id", Rule::Required)
        .field("company_id", Rule::Type(FieldType::Number))
}

/// Company payload: the registered business id is unique across companies.
pub fn company_rules() -> Ruleset {
    Ruleset::new()
        .field("name", Rule::Required)
        .field("name", Rule::Type(FieldType::String))
        .field("name_for_tax_invoice", Rule::Required)
        .field("name_for_tax_invoice", Rule::Type(FieldType::String))
        .field("business_id", Rule::Required)
        .field(
            "business_id",
            Rule::Unique {
                entity: EntityKind::Companies,
                field: "business_id".to_string(),
            },
        )
        .field("address", Rule::Type(FieldType::String))
}
