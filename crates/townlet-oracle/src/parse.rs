//! Oracle response parsing into typed actions.
//!
//! The oracle returns raw text (ideally JSON). This module extracts and
//! validates the response into an [`Action`]. Parsing is total: any
//! response that survives no recovery strategy becomes `idle`, so a
//! misbehaving oracle can never inject an unknown action into the bus.

use townlet_types::{Action, NpcId};
use tracing::warn;

/// Parse a raw oracle response into an action for the given NPC.
///
/// Recovery strategies, in order:
/// 1. Direct JSON parse of the trimmed response
/// 2. Extract JSON from a markdown code fence
/// 3. Extract the first balanced `{...}` block from surrounding prose
///
/// A response missing `npc_id` has it filled in; a response carrying a
/// different `npc_id` keeps its own. If every strategy fails, the NPC
/// idles.
pub fn parse_action(raw: &str, npc_id: &NpcId) -> Action {
    match try_parse(raw, npc_id) {
        Some(action) => action,
        None => {
            warn!(npc_id = %npc_id, raw_response = raw, "unparseable oracle response, falling back to idle");
            Action::idle(npc_id.clone())
        }
    }
}

/// Attempt the recovery strategies in order.
fn try_parse(raw: &str, npc_id: &NpcId) -> Option<Action> {
    let trimmed = raw.trim();

    if let Some(action) = parse_candidate(trimmed, npc_id) {
        return Some(action);
    }

    if let Some(fenced) = extract_code_fence(trimmed)
        && let Some(action) = parse_candidate(fenced, npc_id)
    {
        return Some(action);
    }

    extract_balanced_object(trimmed).and_then(|block| parse_candidate(block, npc_id))
}

/// Parse one candidate JSON string, injecting `npc_id` if absent.
fn parse_candidate(candidate: &str, npc_id: &NpcId) -> Option<Action> {
    let mut value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    if let Some(object) = value.as_object_mut()
        && !object.contains_key("npc_id")
    {
        object.insert(
            "npc_id".to_owned(),
            serde_json::Value::String(npc_id.as_str().to_owned()),
        );
    }
    serde_json::from_value(value).ok()
}

/// Extract the body of the first markdown code fence, if any.
fn extract_code_fence(text: &str) -> Option<&str> {
    let after_open = text.split_once("```")?.1;
    // Skip a language tag like `json` on the fence line.
    let body = after_open.split_once('\n').map_or(after_open, |(_, b)| b);
    let inner = body.split_once("```")?.0;
    Some(inner.trim())
}

/// Extract the first balanced `{...}` block, ignoring braces inside
/// JSON string literals.
fn extract_balanced_object(text: &str) -> Option<&str> {
    let mut start = None;
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if start.is_none() {
                    start = Some(index);
                }
                depth = depth.saturating_add(1);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && start.is_some() {
                    let end = index.checked_add(ch.len_utf8())?;
                    return text.get(start?..end);
                }
            }
            _ => {}
        }
    }
    None
}
