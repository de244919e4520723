//! Terminal rendering of agent cards, tasks and messages

use std::fmt::Write as _;

use parley_a2a::protocol::{AgentCard, Role};
use parley_a2a::{FieldError, Message, Task};

pub const RULE: &str = "============================================================";
pub const THIN_RULE: &str = "----------------------------------------";

/// First `max` characters of `s`, never splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "not set",
    }
}

// ── Chat ────────────────────────────────────────────────────────

/// Summary of a task returned by `message/send`
pub fn task_update(number: usize, task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n   📋 Task Update #{}:", number);
    let _ = writeln!(out, "      Task ID: {}", task.id);
    let context = if task.context_id.is_empty() {
        "None"
    } else {
        task.context_id.as_str()
    };
    let _ = writeln!(out, "      Context ID: {}", context);
    let _ = writeln!(out, "      State: {}", task.status.state);
    if let Some(msg) = &task.status.message {
        for text in msg.parts.iter().filter_map(|p| p.as_text()) {
            let _ = writeln!(out, "      Last message: {}...", truncate_chars(text, 100));
        }
    }
    if let Some(metadata) = task.metadata.as_ref().filter(|m| !m.is_empty()) {
        let json = serde_json::to_string(metadata).unwrap_or_default();
        let _ = writeln!(out, "      Metadata: {}", json);
    }
    out
}

/// A message returned directly by `message/send`
pub fn received_message(number: usize, msg: &Message) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n📨 Received message #{} (role: {})", number, msg.role);
    let heading = match msg.role {
        Role::Agent => "🤖 Agent says:",
        Role::User => "👤 User echo:",
    };
    let _ = writeln!(out, "{}", heading);
    for text in msg.parts.iter().filter_map(|p| p.as_text()) {
        let _ = writeln!(out, "   {}", text);
    }
    out
}

/// Text of an agent message, or a placeholder when it carries none
pub fn agent_text(msg: &Message) -> String {
    let text = msg.text();
    if text.is_empty() {
        "[No text content in agent message]".to_string()
    } else {
        text
    }
}

// ── Validator ───────────────────────────────────────────────────

/// Human-readable breakdown of a validated card
pub fn card_details(card: &AgentCard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Agent Card Details:");
    let _ = writeln!(out, "{}", THIN_RULE);
    let _ = writeln!(out, "  Name: {}", card.name);
    let _ = writeln!(out, "  Protocol Version: {}", card.protocol_version);
    let _ = writeln!(out, "  Description: {}...", truncate_chars(&card.description, 80));
    let _ = writeln!(out, "  URL: {}", card.url);
    let _ = writeln!(out, "  Version: {}", card.version);
    let _ = writeln!(out, "  Preferred Transport: {}", card.preferred_transport);

    if let Some(provider) = &card.provider {
        let _ = writeln!(out, "\nProvider:");
        let _ = writeln!(out, "  Organization: {}", provider.organization);
        if !provider.url.is_empty() {
            let _ = writeln!(out, "  URL: {}", provider.url);
        }
    }

    let caps = &card.capabilities;
    let _ = writeln!(out, "\nCapabilities:");
    let _ = writeln!(out, "  Streaming: {}", flag(caps.streaming));
    let _ = writeln!(out, "  Push Notifications: {}", flag(caps.push_notifications));
    let _ = writeln!(
        out,
        "  State Transition History: {}",
        flag(caps.state_transition_history)
    );
    if let Some(extensions) = caps.extensions.as_ref().filter(|e| !e.is_empty()) {
        let _ = writeln!(out, "\nExtensions ({}):", extensions.len());
        for ext in extensions {
            let _ = writeln!(out, "  - URI: {}", ext.uri);
            let description = ext.description.as_deref().unwrap_or_default();
            let _ = writeln!(out, "    Description: {}...", truncate_chars(description, 60));
            let _ = writeln!(out, "    Required: {}", flag(ext.required));
        }
    }

    if !card.skills.is_empty() {
        let _ = writeln!(out, "\nSkills ({}):", card.skills.len());
        for skill in &card.skills {
            let _ = writeln!(out, "  - {} (id: {})", skill.name, skill.id);
            let _ = writeln!(
                out,
                "    Description: {}...",
                truncate_chars(&skill.description, 60)
            );
            if !skill.tags.is_empty() {
                let _ = writeln!(out, "    Tags: {}", skill.tags.join(", "));
            }
        }
    }

    if let Some(interfaces) = card.additional_interfaces.as_ref().filter(|i| !i.is_empty()) {
        let _ = writeln!(out, "\nAdditional Interfaces ({}):", interfaces.len());
        for interface in interfaces {
            let _ = writeln!(out, "  - URL: {}", interface.url);
            let _ = writeln!(out, "    Transport: {}", interface.transport);
        }
    }

    if !card.default_input_modes.is_empty() {
        let _ = writeln!(
            out,
            "\nDefault Input Modes: {}",
            card.default_input_modes.join(", ")
        );
    }
    if !card.default_output_modes.is_empty() {
        let _ = writeln!(
            out,
            "Default Output Modes: {}",
            card.default_output_modes.join(", ")
        );
    }
    out
}

/// One numbered validation error, preceded by a blank line
pub fn field_error(number: usize, error: &FieldError) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}. Field: {}", number, error.path());
    let _ = writeln!(out, "   Error: {}", error.msg);
    if let Some(input) = &error.input {
        let _ = writeln!(out, "   Input value: {}", input);
    }
    if let Some(ctx) = &error.ctx {
        let _ = writeln!(out, "   Context: {}", ctx);
    }
    out
}

/// Boxed section heading
pub fn section(title: &str) -> String {
    format!("{}\n{}\n{}", RULE, title, RULE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card() -> AgentCard {
        serde_json::from_value(json!({
            "name": "Insurance Auth Specialist",
            "description": "x".repeat(120),
            "url": "https://example.org/a2a",
            "version": "1.0.0",
            "defaultInputModes": ["text/plain"],
            "defaultOutputModes": ["text/plain", "application/json"],
            "capabilities": {"streaming": true},
            "skills": [{
                "id": "triage",
                "name": "Triage",
                "description": "Reviews prior authorization requests",
                "tags": ["medical", "insurance"]
            }],
            "provider": {"organization": "Example Health", "url": ""}
        }))
        .unwrap()
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_card_details() {
        let text = card_details(&card());
        assert!(text.contains("  Name: Insurance Auth Specialist"));
        assert!(text.contains(&format!("  Description: {}...", "x".repeat(80))));
        assert!(text.contains("  Protocol Version: 0.3.0"));
        assert!(text.contains("  Preferred Transport: JSONRPC"));
        assert!(text.contains("  Organization: Example Health"));
        assert!(!text.contains("  URL: \n"));
        assert!(text.contains("  Streaming: true"));
        assert!(text.contains("  Push Notifications: not set"));
        assert!(text.contains("  - Triage (id: triage)"));
        assert!(text.contains("    Tags: medical, insurance"));
        assert!(text.contains("Default Output Modes: text/plain, application/json"));
        assert!(!text.contains("Additional Interfaces"));
        assert!(!text.contains("Extensions"));
    }

    #[test]
    fn test_task_update() {
        let task: Task = serde_json::from_value(json!({
            "id": "t-1",
            "contextId": "c-9",
            "status": {
                "state": "working",
                "message": {
                    "messageId": "m-1",
                    "role": "agent",
                    "parts": [{"kind": "text", "text": "y".repeat(150)}]
                }
            },
            "metadata": {"room": "r1"}
        }))
        .unwrap();
        let text = task_update(1, &task);
        assert!(text.contains("📋 Task Update #1:"));
        assert!(text.contains("      Context ID: c-9"));
        assert!(text.contains("      State: working"));
        assert!(text.contains(&format!("      Last message: {}...\n", "y".repeat(100))));
        assert!(text.contains(r#"      Metadata: {"room":"r1"}"#));
    }

    #[test]
    fn test_received_message_by_role() {
        let msg: Message = serde_json::from_value(json!({
            "messageId": "m-1",
            "role": "user",
            "parts": [{"kind": "text", "text": "echo"}]
        }))
        .unwrap();
        let text = received_message(2, &msg);
        assert!(text.contains("📨 Received message #2 (role: user)"));
        assert!(text.contains("👤 User echo:\n   echo\n"));
    }

    #[test]
    fn test_agent_text_placeholder() {
        let msg: Message = serde_json::from_value(json!({
            "messageId": "m-1",
            "role": "agent",
            "parts": [{"kind": "data", "data": {}}]
        }))
        .unwrap();
        assert_eq!(agent_text(&msg), "[No text content in agent message]");
    }

    #[test]
    fn test_field_error_rendering() {
        let error = FieldError {
            loc: vec![
                parley_a2a::card::PathSegment::Key("skills".into()),
                parley_a2a::card::PathSegment::Index(0),
            ],
            msg: "Input should be a valid dictionary".into(),
            input: Some(json!("chat")),
            ctx: None,
        };
        assert_eq!(
            field_error(1, &error),
            "\n1. Field: skills → 0\n   Error: Input should be a valid dictionary\n   Input value: \"chat\"\n"
        );

        let nullable = FieldError {
            loc: vec![parley_a2a::card::PathSegment::Key("iconUrl".into())],
            msg: "Input should be a valid string".into(),
            input: Some(json!(3)),
            ctx: Some(json!({"expected": "string or null"})),
        };
        assert!(field_error(2, &nullable).ends_with("   Input value: 3\n   Context: {\"expected\":\"string or null\"}\n"));
    }
}
