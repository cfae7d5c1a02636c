//! Role-specific profile payloads and their validation rules.
//!
//! Each role has one payload type whose required fields are `Option`s: a
//! draft only has to satisfy the rules for the fields it carries, while a
//! complete profile must also carry every required field.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::types::Role;

/// Smallest amount accepted for funding asks and check sizes.
pub const MIN_AMOUNT: u64 = 1000;

/// How strictly a payload is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Fields may be absent; present fields must be valid.
    Draft,
    /// Every required field must be present and valid.
    Complete,
}

impl Strictness {
    pub fn for_completion(is_complete: bool) -> Self {
        if is_complete {
            Strictness::Complete
        } else {
            Strictness::Draft
        }
    }
}

/// Field path -> messages, returned to clients as `details`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(BTreeMap<String, Vec<String>>);

impl Violations {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut violations = Self::default();
        violations.push(path, message);
        violations
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }

    fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn collect(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = join_path(prefix, &field.to_string());
            match kind {
                ValidationErrorsKind::Field(errors) => {
                    for error in errors {
                        self.push(path.clone(), describe(error));
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(&path, nested),
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        self.collect(&format!("{}[{}]", path, index), nested);
                    }
                }
            }
        }
    }
}

impl From<&ValidationErrors> for Violations {
    fn from(errors: &ValidationErrors) -> Self {
        let mut violations = Violations::default();
        violations.collect("", errors);
        violations
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    // Struct-level (schema) errors are reported against the struct itself.
    match (prefix.is_empty(), field) {
        (_, "__all__") => prefix.to_string(),
        (true, _) => wire_name(field),
        (false, _) => format!("{}.{}", prefix, wire_name(field)),
    }
}

/// Rust field name to the camelCase key clients send.
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        match c {
            '_' if !name.is_empty() => upper = true,
            _ if upper => {
                name.extend(c.to_uppercase());
                upper = false;
            }
            _ => name.push(c),
        }
    }
    name
}

/// Locates serde shape errors by retrying each top-level key on its own.
/// Every field is optional, so a single-key object only fails on that key.
fn shape_violations<T: DeserializeOwned>(data: &Map<String, Value>, err: serde_json::Error) -> Violations {
    let mut violations = Violations::default();
    for (key, value) in data {
        let single = Map::from_iter([(key.clone(), value.clone())]);
        if let Err(e) = serde_json::from_value::<T>(Value::Object(single)) {
            violations.push(key.clone(), e.to_string());
        }
    }
    if violations.is_empty() {
        violations.push("data", err.to_string());
    }
    violations
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' check", error.code),
    }
}

/// Inclusive amount range in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_amount_range"))]
pub struct AmountRange {
    #[validate(range(min = 1000, message = "must be at least 1000"))]
    pub min: u64,
    #[validate(range(min = 1000, message = "must be at least 1000"))]
    pub max: u64,
}

fn validate_amount_range(range: &AmountRange) -> Result<(), ValidationError> {
    if range.max < range.min {
        let mut error = ValidationError::new("range_order");
        error.message = Some("max must be greater than or equal to min".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupStage {
    Idea,
    Mvp,
    Pmf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FounderData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub startup_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "is required"))]
    pub industry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StartupStage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub funding_ask: Option<AmountRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 50, max = 500, message = "must be between 50 and 500 characters"))]
    pub brief_pitch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub team_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traction_metrics: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub pitch_deck_url: Option<String>,
}

impl FounderData {
    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.startup_name.is_none() {
            missing.push("startupName");
        }
        if self.industry.is_none() {
            missing.push("industry");
        }
        if self.stage.is_none() {
            missing.push("stage");
        }
        if self.funding_ask.is_none() {
            missing.push("fundingAsk");
        }
        if self.brief_pitch.is_none() {
            missing.push("briefPitch");
        }
        if self.website.is_none() {
            missing.push("website");
        }
        if self.location.is_none() {
            missing.push("location");
        }
        missing
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvestorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "select at least one sector"))]
    pub sectors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "select at least one stage"))]
    pub stages: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "select at least one geography"))]
    pub geography: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub check_size: Option<AmountRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 50, max = 500, message = "must be between 50 and 500 characters"))]
    pub intro_note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_links: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theses: Option<String>,
}

impl InvestorData {
    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sectors.is_none() {
            missing.push("sectors");
        }
        if self.stages.is_none() {
            missing.push("stages");
        }
        if self.geography.is_none() {
            missing.push("geography");
        }
        if self.check_size.is_none() {
            missing.push("checkSize");
        }
        if self.intro_note.is_none() {
            missing.push("introNote");
        }
        missing
    }

    /// Collapses repeated entries in the set-valued fields, keeping first occurrence.
    fn dedup_sets(&mut self) {
        for set in [&mut self.sectors, &mut self.stages, &mut self.geography]
            .into_iter()
            .flatten()
        {
            let mut seen = std::collections::HashSet::new();
            set.retain(|entry| seen.insert(entry.clone()));
        }
    }
}

/// Profile payload, tagged by role. Validation dispatches on the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProfileData {
    Founder(FounderData),
    Investor(InvestorData),
}

impl ProfileData {
    /// Parses and validates `data` against the schema selected by `role`.
    /// Unknown keys are dropped; the returned value is the canonical form.
    pub fn parse(role: Role, data: Value, strictness: Strictness) -> Result<Self, Violations> {
        let fields = match data {
            Value::Object(fields) => fields,
            _ => return Err(Violations::single("data", "must be an object")),
        };

        let parsed = match role {
            Role::Founder => serde_json::from_value::<FounderData>(Value::Object(fields.clone()))
                .map(ProfileData::Founder)
                .map_err(|e| shape_violations::<FounderData>(&fields, e)),
            Role::Investor => serde_json::from_value::<InvestorData>(Value::Object(fields.clone()))
                .map(|mut investor| {
                    investor.dedup_sets();
                    ProfileData::Investor(investor)
                })
                .map_err(|e| shape_violations::<InvestorData>(&fields, e)),
        }?;

        parsed.check(strictness)?;
        Ok(parsed)
    }

    /// Rebuilds persisted data without re-running the rules.
    pub fn from_stored(role: Role, data: Value) -> Result<Self, serde_json::Error> {
        match role {
            Role::Founder => serde_json::from_value(data).map(ProfileData::Founder),
            Role::Investor => serde_json::from_value(data).map(ProfileData::Investor),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ProfileData::Founder(_) => Role::Founder,
            ProfileData::Investor(_) => Role::Investor,
        }
    }

    /// Runs the role's rules; `Complete` additionally requires every required field.
    pub fn check(&self, strictness: Strictness) -> Result<(), Violations> {
        let (rules, missing) = match self {
            ProfileData::Founder(founder) => (founder.validate(), founder.missing_required()),
            ProfileData::Investor(investor) => (investor.validate(), investor.missing_required()),
        };

        let mut violations = match rules {
            Ok(()) => Violations::default(),
            Err(errors) => Violations::from(&errors),
        };
        if strictness == Strictness::Complete {
            for field in missing {
                violations.push(field, "is required");
            }
        }
        violations.into_result()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn pitch_deck_url(&self) -> Option<&str> {
        match self {
            ProfileData::Founder(founder) => founder.pitch_deck_url.as_deref(),
            ProfileData::Investor(_) => None,
        }
    }
}
