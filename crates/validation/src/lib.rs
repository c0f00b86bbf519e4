pub mod engine;
pub mod rules;
pub mod shapes;

pub use engine::{ExistenceLookup, ValidationEngine};
pub use rules::{EntityKind, FieldType, Rule, Ruleset};
