//! Agent card discovery and schema validation
//!
//! Agents publish their card at a handful of conventional locations; the
//! chat client guesses them from the agent's endpoint URL. Validation runs
//! the raw JSON document through a JSON Schema and collects every problem
//! instead of stopping at the first one.

use std::collections::HashSet;

use jsonschema::{Draft, Validator};
use serde_json::{Value, json};
use tracing::debug;

use crate::protocol::{AGENT_CARD_WELL_KNOWN_PATH, AgentCard};

/// Version inserted into cards that omit it when connecting
pub const COMPAT_CARD_VERSION: &str = "1.0.0";

/// Guess where an agent publishes its card, most specific location first
pub fn candidate_card_urls(agent_url: &str) -> Vec<String> {
    let mut urls = Vec::new();

    if agent_url.contains("/a2a") {
        urls.push(agent_url.replace("/a2a", AGENT_CARD_WELL_KNOWN_PATH));
    }

    // Room-scoped agents on the local dev server serve the card next to the room
    if agent_url.contains("localhost:3003") {
        urls.push(
            agent_url
                .replace("/api/rooms/", "/rooms/")
                .replace("/a2a", "/agent-card.json"),
        );
    }

    urls.push(format!("{}{}", agent_url, AGENT_CARD_WELL_KNOWN_PATH));

    let mut seen = HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
    urls
}

/// Fill in fields that older agents leave out but the schema requires
pub fn apply_compat_defaults(document: &mut Value) {
    if let Value::Object(map) = document {
        map.entry("version")
            .or_insert_with(|| Value::String(COMPAT_CARD_VERSION.to_string()));
    }
}

/// One segment of the path to an offending field
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub loc: Vec<PathSegment>,
    pub msg: String,
    pub input: Option<Value>,
    /// Extra detail, e.g. the types a nullable field accepts
    pub ctx: Option<Value>,
}

impl FieldError {
    /// Location rendered as `skills → 0 → id`
    pub fn path(&self) -> String {
        if self.loc.is_empty() {
            return "(root)".to_string();
        }
        self.loc
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// Every schema violation found in an agent card document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, error) in self.errors.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}. Field: {}", idx + 1, error.path())?;
            write!(f, "   Error: {}", error.msg)?;
            if let Some(input) = &error.input {
                write!(f, "\n   Input value: {}", input)?;
            }
            if let Some(ctx) = &error.ctx {
                write!(f, "\n   Context: {}", ctx)?;
            }
        }
        Ok(())
    }
}

/// JSON Schema (draft 7) for the AgentCard document
///
/// Optional fields also accept `null`. Unknown fields are allowed.
pub fn card_schema() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    let optional_string_list = json!({"type": ["array", "null"], "items": {"type": "string"}});

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "AgentCard",
        "type": "object",
        "required": [
            "name", "description", "url", "version",
            "defaultInputModes", "defaultOutputModes", "capabilities", "skills"
        ],
        "properties": {
            "name": {"type": "string"},
            "description": {"type": "string"},
            "url": {"type": "string"},
            "version": {"type": "string"},
            "protocolVersion": {"type": ["string", "null"]},
            "preferredTransport": {"type": ["string", "null"]},
            "documentationUrl": {"type": ["string", "null"]},
            "iconUrl": {"type": ["string", "null"]},
            "supportsAuthenticatedExtendedCard": {"type": ["boolean", "null"]},
            "defaultInputModes": string_list,
            "defaultOutputModes": string_list,
            "capabilities": {
                "type": "object",
                "properties": {
                    "streaming": {"type": ["boolean", "null"]},
                    "pushNotifications": {"type": ["boolean", "null"]},
                    "stateTransitionHistory": {"type": ["boolean", "null"]},
                    "extensions": {
                        "type": ["array", "null"],
                        "items": {
                            "type": "object",
                            "required": ["uri"],
                            "properties": {
                                "uri": {"type": "string"},
                                "description": {"type": ["string", "null"]},
                                "required": {"type": ["boolean", "null"]},
                                "params": {"type": ["object", "null"]}
                            }
                        }
                    }
                }
            },
            "skills": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name", "description", "tags"],
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "tags": string_list,
                        "examples": optional_string_list,
                        "inputModes": optional_string_list,
                        "outputModes": optional_string_list
                    }
                }
            },
            "provider": {
                "type": ["object", "null"],
                "required": ["organization", "url"],
                "properties": {
                    "organization": {"type": "string"},
                    "url": {"type": "string"}
                }
            },
            "additionalInterfaces": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "required": ["url", "transport"],
                    "properties": {
                        "url": {"type": "string"},
                        "transport": {"type": "string"}
                    }
                }
            }
        }
    })
}

/// Check a raw card document against the AgentCard schema
///
/// Every violation is collected, ordered by location.
pub fn validate_card(document: &Value) -> Result<AgentCard, ValidationReport> {
    let schema = card_schema();
    let validator = Validator::options()
        .with_draft(Draft::Draft7)
        .build(&schema)
        .map_err(|e| ValidationReport {
            errors: vec![FieldError {
                loc: vec![],
                msg: format!("Invalid agent card schema: {}", e),
                input: None,
                ctx: None,
            }],
        })?;

    let mut report = ValidationReport::default();
    let mut visited = HashSet::new();
    for error in validator.iter_errors(document) {
        let pointer = error.instance_path().to_string();
        if !visited.insert(pointer.clone()) {
            continue;
        }
        let found = field_errors_at(&schema, document, &pointer);
        if found.is_empty() {
            report.errors.push(FieldError {
                loc: locate(document, &pointer),
                msg: error.to_string(),
                input: document.pointer(&pointer).cloned(),
                ctx: None,
            });
        } else {
            report.errors.extend(found);
        }
    }

    if !report.is_empty() {
        report.errors.sort_by(|a, b| a.loc.cmp(&b.loc));
        debug!("Agent card has {} schema violations", report.len());
        return Err(report);
    }

    serde_json::from_value(document.clone()).map_err(|e| ValidationReport {
        errors: vec![FieldError {
            loc: vec![],
            msg: e.to_string(),
            input: None,
            ctx: None,
        }],
    })
}

/// Split a JSON pointer into path segments, using the document to tell
/// array indices from object keys
fn locate(document: &Value, pointer: &str) -> Vec<PathSegment> {
    let mut loc = Vec::new();
    let mut current = Some(document);
    for raw in pointer.split('/').skip(1) {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let index = match current {
            Some(Value::Array(_)) => token.parse::<usize>().ok(),
            _ => None,
        };
        current = match (current, index) {
            (Some(Value::Array(items)), Some(idx)) => items.get(idx),
            (Some(Value::Object(map)), _) => map.get(&token),
            _ => None,
        };
        loc.push(match index {
            Some(idx) => PathSegment::Index(idx),
            None => PathSegment::Key(token),
        });
    }
    loc
}

/// Subschema governing the value at `loc`
fn subschema<'a>(schema: &'a Value, loc: &[PathSegment]) -> Option<&'a Value> {
    loc.iter().try_fold(schema, |node, segment| match segment {
        PathSegment::Key(key) => node.get("properties")?.get(key),
        PathSegment::Index(_) => node.get("items"),
    })
}

fn matches_type(value: &Value, ty: &str) -> bool {
    match ty {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_message(ty: &str) -> String {
    let noun = match ty {
        "array" => "list",
        "object" => "dictionary",
        other => other,
    };
    format!("Input should be a valid {}", noun)
}

/// Pydantic-style errors for the value at `pointer`: a type mismatch, or one
/// "Field required" per missing property (reported against the parent)
fn field_errors_at(schema: &Value, document: &Value, pointer: &str) -> Vec<FieldError> {
    let loc = locate(document, pointer);
    let (Some(node), Some(value)) = (subschema(schema, &loc), document.pointer(pointer)) else {
        return Vec::new();
    };

    let allowed: Vec<&str> = match node.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    if !allowed.is_empty() && !allowed.iter().any(|ty| matches_type(value, ty)) {
        let expected = allowed.iter().find(|ty| **ty != "null").unwrap_or(&allowed[0]);
        let ctx = (allowed.len() > 1).then(|| json!({"expected": allowed.join(" or ")}));
        return vec![FieldError {
            loc,
            msg: type_message(expected),
            input: Some(value.clone()),
            ctx,
        }];
    }

    let Some(obj) = value.as_object() else {
        return Vec::new();
    };
    node.get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|key| !obj.contains_key(*key))
        .map(|key| {
            let mut field_loc = loc.clone();
            field_loc.push(PathSegment::Key(key.to_string()));
            FieldError {
                loc: field_loc,
                msg: "Field required".to_string(),
                input: Some(value.clone()),
                ctx: None,
            }
        })
        .collect()
}
