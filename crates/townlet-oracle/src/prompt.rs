//! Prompt rendering via `minijinja`.
//!
//! Two templates are compiled into the binary: the per-NPC decision
//! prompt and the long-memory summarization prompt. Rendering is
//! deterministic for a given context, so a prompt can be asserted on
//! byte-for-byte in tests.

use minijinja::Environment;

use crate::error::OracleError;

/// The decision prompt: identity, stats, inventory, memory, and the
/// catalog of action shapes the oracle may answer with.
const DECISION_TEMPLATE: &str = r#"You are {{ npc.name }}, a townsperson in a simulated town.
Current town time: {{ town_time }}.

Your state:
- id: {{ npc.id }}
{% if npc.player_id %}- player: {{ npc.player_id }}
{% endif %}- location: {{ npc.location_id }}
- status: {{ npc.status }}
- hunger: {{ npc.hunger }}/100
- energy: {{ npc.energy }}/100
- mood: {{ npc.mood }}/100

Your inventory:
{% for item, count in npc.inventory|items %}- {{ item }} x{{ count }}
{% else %}- (empty)
{% endfor %}
What you remember:
{{ npc.long_memory }}

Decide what to do next. Respond with a single JSON object and nothing
else, using exactly one of these shapes:
- {"action_type": "move", "place_id": "<place id>"}
- {"action_type": "eat", "item_id": "<item id>", "item_amount": 1}
- {"action_type": "sleep", "duration_hours": 8}
- {"action_type": "work", "duration_hours": 4}
- {"action_type": "buy", "item_id": "<item id>", "item_amount": 1}
- {"action_type": "sell", "item_id": "<item id>", "item_amount": 1}
- {"action_type": "idle"}
"#;

/// The summarization prompt used when long memory exceeds its cap.
const SUMMARY_TEMPLATE: &str = r"Condense this townsperson's diary into a short summary. Keep names,
debts, plans, and anything worth acting on later. Respond with the
summary text only.

<long_memory>{{ long_memory }}</long_memory>
";

/// Renders the compiled-in prompt templates.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Compile the built-in templates.
    pub fn new() -> Result<Self, OracleError> {
        let mut env = Environment::new();
        env.add_template("decision", DECISION_TEMPLATE)
            .map_err(|e| OracleError::Template(format!("decision template: {e}")))?;
        env.add_template("summary", SUMMARY_TEMPLATE)
            .map_err(|e| OracleError::Template(format!("summary template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the decision prompt from a context with `npc` and
    /// `town_time` keys.
    pub fn render_decision(&self, context: &serde_json::Value) -> Result<String, OracleError> {
        self.env
            .get_template("decision")
            .map_err(|e| OracleError::Template(format!("missing decision template: {e}")))?
            .render(context)
            .map_err(|e| OracleError::Template(format!("decision render failed: {e}")))
    }

    /// Render the long-memory summarization prompt.
    pub fn render_summary(&self, long_memory: &str) -> Result<String, OracleError> {
        self.env
            .get_template("summary")
            .map_err(|e| OracleError::Template(format!("missing summary template: {e}")))?
            .render(serde_json::json!({ "long_memory": long_memory }))
            .map_err(|e| OracleError::Template(format!("summary render failed: {e}")))
    }
}
