//! Minimal input-schema validation — enough to enforce §4.8's
//! "input validation against declared schema -> VALIDATION_ERROR with
//! `field` set" without pulling in a full JSON Schema engine the teacher
//! pack never depended on.

use turngate_core::fields::canonical_name;

/// A declared required string field, by its canonical name.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
}

pub fn field(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec { name, required }
}

/// Validate canonicalized args against a tool's declared fields.
/// Returns the offending canonical field name on the first failure.
pub fn validate(args: &serde_json::Value, spec: &[FieldSpec]) -> Result<(), String> {
    let obj = args.as_object().ok_or_else(|| "args".to_string())?;
    // Canonicalize incoming keys before checking so aliases are accepted (§6).
    let canonical_keys: std::collections::HashSet<String> =
        obj.keys().map(|k| canonical_name(k).to_string()).collect();

    for f in spec {
        if f.required && !canonical_keys.contains(f.name) {
            return Err(f.name.to_string());
        }
    }
    Ok(())
}

/// Build a JSON Schema document for the tool definition sent to the LLM.
pub fn to_json_schema(spec: &[FieldSpec]) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for f in spec {
        properties.insert(f.name.to_string(), serde_json::json!({"type": "string"}));
        if f.required {
            required.push(f.name.to_string());
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
