//! Schema gate for plan documents.
//!
//! [`PlanSchema::validate`] walks the whole candidate document and collects
//! every violation instead of stopping at the first one, so a client gets the
//! complete list in a single 400 response. Acceptance is all-or-nothing.

use super::{
    embedded,
    types::{AttributeDefinition, AttributeType, Schema},
};
use crate::error::{ValidationErrors, Violation};
use crate::resource::plan::Plan;
use serde_json::{Map, Value};

/// A document that passed the schema gate.
///
/// Holds both the typed plan and the exact bytes that will be persisted. The
/// bytes are the compact serialization of the validated JSON with object
/// members in sorted order, so equal documents always produce equal bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedPlan {
    plan: Plan,
    canonical: Vec<u8>,
}

impl AcceptedPlan {
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn object_id(&self) -> &str {
        self.plan.object_id()
    }

    /// Bytes to hand to the store.
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    pub fn into_parts(self) -> (Plan, Vec<u8>) {
        (self.plan, self.canonical)
    }
}

/// Why a candidate was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The document does not have the shape of a plan
    #[error(transparent)]
    Rejected(#[from] ValidationErrors),

    /// The schema accepted a document the typed plan model cannot hold.
    /// This is a disagreement between schema and model, not a client error.
    #[error("Accepted document does not fit the plan model: {0}")]
    ModelMismatch(String),
}

impl GateError {
    /// The violations, if the document itself was at fault.
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            GateError::Rejected(errors) => Some(errors),
            GateError::ModelMismatch(_) => None,
        }
    }
}

/// The structural validator in front of storage.
#[derive(Debug, Clone)]
pub struct PlanSchema {
    schema: Schema,
}

impl PlanSchema {
    /// Load the embedded plan schema.
    pub fn new() -> Result<Self, serde_json::Error> {
        Self::from_json(embedded::plan_schema())
    }

    /// Load a schema from its JSON definition.
    pub fn from_json(definition: &str) -> Result<Self, serde_json::Error> {
        let schema: Schema = serde_json::from_str(definition)?;
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate a candidate plan.
    ///
    /// On success the typed plan and its canonical bytes are returned. On
    /// rejection every violation found is returned, each with the path of the
    /// offending member.
    pub fn validate(&self, candidate: &Value) -> Result<AcceptedPlan, GateError> {
        let mut violations = Vec::new();

        match candidate {
            Value::Object(obj) => {
                Self::validate_attributes(&self.schema.attributes, obj, "", &mut violations)
            }
            other => violations.push(Violation::new(
                "",
                format!("expected object, got {}", Self::get_value_type(other)),
            )),
        }

        if !violations.is_empty() {
            return Err(ValidationErrors::new(violations).into());
        }

        let plan: Plan = serde_json::from_value(candidate.clone())
            .map_err(|e| GateError::ModelMismatch(e.to_string()))?;
        let canonical =
            serde_json::to_vec(candidate).map_err(|e| GateError::ModelMismatch(e.to_string()))?;

        Ok(AcceptedPlan { plan, canonical })
    }

    fn validate_attributes(
        definitions: &[AttributeDefinition],
        obj: &Map<String, Value>,
        prefix: &str,
        violations: &mut Vec<Violation>,
    ) {
        for definition in definitions {
            let path = Self::join_path(prefix, &definition.name);

            match obj.get(&definition.name) {
                None | Some(Value::Null) => {
                    if definition.required {
                        violations.push(Violation::new(path, "is required"));
                    }
                }
                Some(value) => Self::validate_attribute_value(definition, value, &path, violations),
            }
        }
    }

    fn validate_attribute_value(
        definition: &AttributeDefinition,
        value: &Value,
        path: &str,
        violations: &mut Vec<Violation>,
    ) {
        if !definition.multi_valued {
            Self::validate_single_value(definition, value, path, violations);
            return;
        }

        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, index);
                    Self::validate_single_value(definition, item, &item_path, violations);
                }
            }
            other => violations.push(Violation::new(
                path,
                format!(
                    "expected array, got {}",
                    Self::get_value_type(other)
                ),
            )),
        }
    }

    fn validate_single_value(
        definition: &AttributeDefinition,
        value: &Value,
        path: &str,
        violations: &mut Vec<Violation>,
    ) {
        let type_matches = match (definition.data_type, value) {
            (AttributeType::Complex, Value::Object(obj)) => {
                Self::validate_attributes(&definition.sub_attributes, obj, path, violations);
                true
            }
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Boolean, Value::Bool(_)) => true,
            (AttributeType::Decimal, Value::Number(_)) => true,
            (AttributeType::Integer, Value::Number(n)) => n.is_i64(),
            _ => false,
        };

        if !type_matches {
            violations.push(Violation::new(
                path,
                format!(
                    "expected {}, got {}",
                    definition.data_type.expected_name(),
                    Self::get_value_type(value)
                ),
            ));
        }
    }

    fn join_path(prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        }
    }

    /// Get the JSON type name of a value.
    fn get_value_type(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}
