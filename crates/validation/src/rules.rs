/// External stores a uniqueness rule can be checked against. The descriptor
/// is explicit on the rule so declarations carry no hidden coupling to
/// storage internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    Companies,
    Campaigns,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Companies => "companies",
            Self::Campaigns => "campaigns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Email,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Email => "email",
        }
    }
}

/// One declarative constraint bound to a field.
///
/// `Required`, `Type`, `OneOf`, and `GreaterThan` are synchronous (pure on
/// field values); `Unique` needs an existence query against an external
/// store and is evaluated in a second, asynchronous pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Type(FieldType),
    OneOf(Vec<String>),
    /// Strict comparison: the bound field must be greater than `other`.
    /// Equal values are rejected.
    GreaterThan { other: String },
    Unique { entity: EntityKind, field: String },
}

/// Rules declared per DTO shape, evaluated as a batch.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    entries: Vec<(String, Rule)>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, rule: Rule) -> Self {
        self.entries.push((name.to_string(), rule));
        self
    }

    pub fn entries(&self) -> &[(String, Rule)] {
        &self.entries
    }
}
