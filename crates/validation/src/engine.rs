use app_error::{AppError, AppResult, Violation};
use async_trait::async_trait;
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::rules::{EntityKind, FieldType, Rule, Ruleset};

lazy_static! {
    // Email validation regex
    // This pattern checks for a valid email format with proper domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^([a-z0-9_+]([a-z0-9_+.]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,6})"
    ).unwrap();
}

/// Injected existence query: "does any record with `field = value` already
/// exist in `entity`?" One query is issued per uniqueness rule; the engine
/// does not require them to share a transaction with any later insert.
#[async_trait]
pub trait ExistenceLookup: Send + Sync {
    async fn count_by_field(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Value,
    ) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct ValidationEngine {
    lookup: Arc<dyn ExistenceLookup>,
}

impl ValidationEngine {
    pub fn new(lookup: Arc<dyn ExistenceLookup>) -> Self {
        Self { lookup }
    }

    /// Evaluate every rule in the set and aggregate all failures into one
    /// `BadRequest`. Nothing is mutated before the full set has run.
    pub async fn validate(&self, doc: &Map<String, Value>, ruleset: &Ruleset) -> AppResult<()> {
        let violations = self.violations(doc, ruleset, false).await?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(violations))
        }
    }

    /// Partial-update mode: only rules for fields present in the document
    /// are evaluated; absent fields are skipped entirely, not defaulted.
    pub async fn validate_partial(
        &self,
        doc: &Map<String, Value>,
        ruleset: &Ruleset,
    ) -> AppResult<()> {
        let violations = self.violations(doc, ruleset, true).await?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(violations))
        }
    }

    /// The raw violation list (empty = valid). Synchronous rules run first,
    /// purely on field values; uniqueness queries run after, one per rule.
    /// Lookup infrastructure failures propagate as `Storage`, never as
    /// violations.
    pub async fn violations(
        &self,
        doc: &Map<String, Value>,
        ruleset: &Ruleset,
        partial: bool,
    ) -> AppResult<Vec<Violation>> {
        let mut violations = Vec::new();
        let mut pending_unique = Vec::new();

        for (field, rule) in ruleset.entries() {
            let value = doc.get(field);

            let Some(value) = value else {
                // Absence is only Required's concern; in partial mode even
                // that is skipped.
                if !partial && matches!(rule, Rule::Required) {
                    violations.push(Violation::new(field, "is required"));
                }
                continue;
            };

            match rule {
                Rule::Required => {
                    if is_empty(value) {
                        violations.push(Violation::new(field, "is required"));
                    }
                }
                Rule::Type(expected) => {
                    if !type_matches(value, *expected) {
                        violations.push(Violation::new(
                            field,
                            format!("must be a valid {}", expected.as_str()),
                        ));
                    }
                }
                Rule::OneOf(allowed) => {
                    let matched = value
                        .as_str()
                        .map(|s| allowed.iter().any(|a| a == s))
                        .unwrap_or(false);
                    if !matched {
                        violations.push(Violation::new(
                            field,
                            format!("must be one of: {}", allowed.join(", ")),
                        ));
                    }
                }
                Rule::GreaterThan { other } => {
                    // Strict inequality: equal values fail.
                    let lhs = value.as_f64();
                    let rhs = doc.get(other).and_then(Value::as_f64);
                    let holds = matches!((lhs, rhs), (Some(l), Some(r)) if l > r);
                    if !holds {
                        violations.push(Violation::new(
                            field,
                            format!("must be greater than '{}'", other),
                        ));
                    }
                }
                Rule::Unique { entity, field: lookup_field } => {
                    pending_unique.push((field.clone(), *entity, lookup_field.clone(), value));
                }
            }
        }

        // Independent existence queries, one per uniqueness rule.
        let lookups = pending_unique
            .iter()
            .map(|(_, entity, lookup_field, value)| {
                self.lookup.count_by_field(*entity, lookup_field, value)
            });

        for ((field, entity, _, _), count) in
            pending_unique.iter().zip(join_all(lookups).await)
        {
            let count = count?;
            if count >= 1 {
                tracing::debug!(
                    field = %field,
                    entity = entity.as_str(),
                    "uniqueness rule matched an existing record"
                );
                violations.push(Violation::new(field, "already exists"));
            }
        }

        Ok(violations)
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn type_matches(value: &Value, expected: FieldType) -> bool {
    match expected {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Email => value
            .as_str()
            .map(|s| EMAIL_REGEX.is_match(s))
            .unwrap_or(false),
    }
}
