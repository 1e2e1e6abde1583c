use serde::{Deserialize, Serialize};
use tracing::warn;

const BASE_INSTRUCTIONS: &str = "\
You are role-playing as a patient calling a medical office. You are talking \
to an AI receptionist on the phone.

RULES:
- Speak the way people talk on the phone. Short sentences, one or two at most.
- Use the occasional filler word (\"um\", \"so\", \"yeah\").
- Answer the receptionist's questions directly.
- When the receptionist says goodbye or your task is done, say goodbye.
- Stay in character. Never mention testing, AI or scripts.
- Reply only with the words you would say out loud. No stage directions.";

/// A test persona and what it is trying to get done on the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub persona: String,
    pub goal: String,
    #[serde(default)]
    pub extra: Option<String>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        persona: impl Into<String>,
        goal: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            persona: persona.into(),
            goal: goal.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Full system prompt for the dialogue model
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "{}\n\nYOUR PERSONA:\n{}\n\nYOUR GOAL:\n{}",
            BASE_INSTRUCTIONS, self.persona, self.goal
        );
        if let Some(extra) = &self.extra {
            prompt.push_str("\n\nADDITIONAL INSTRUCTIONS:\n");
            prompt.push_str(extra);
        }
        prompt
    }
}

/// Named scenarios; the first one is the fallback
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        if scenarios.is_empty() {
            return Self::builtin();
        }
        Self { scenarios }
    }

    pub fn builtin() -> Self {
        Self {
            scenarios: vec![
                Scenario::new(
                    "simple_scheduling",
                    "New patient books a general checkup",
                    "Maria Delgado, 41, recently moved to town and has no primary care doctor yet.",
                    "Book a new-patient physical sometime in the next two weeks, mornings preferred.",
                ),
                Scenario::new(
                    "reschedule",
                    "Existing patient moves an appointment",
                    "Tom Becker, 58, has a follow-up this Thursday at 2pm but a work trip came up.",
                    "Move the Thursday appointment to any afternoon next week.",
                ),
                Scenario::new(
                    "prescription_refill",
                    "Patient asks for a medication refill",
                    "Priya Raman, 36, takes lisinopril daily and has three pills left.",
                    "Get the refill sent to the pharmacy on Main Street before the weekend.",
                ),
                Scenario::new(
                    "office_hours",
                    "Caller asks about hours and location",
                    "Dave Okafor, 29, is thinking of switching clinics.",
                    "Find out the weekend hours, the address, and whether parking is free.",
                ),
                Scenario::new(
                    "insurance_question",
                    "Caller checks insurance coverage",
                    "Linda Park, 63, just changed to a new Medicare Advantage plan.",
                    "Confirm the office accepts the plan before booking anything.",
                )
                .with_extra("If asked for the plan name, say it is the Blue Horizon Advantage plan."),
                Scenario::new(
                    "confused_caller",
                    "Vague caller who needs steering",
                    "Walter Hughes, 80, is hard of hearing and not sure why he is calling.",
                    "Eventually remember you need to ask about your blood test results.",
                )
                .with_extra("Ask the receptionist to repeat themselves at least once."),
            ],
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.name.clone()).collect()
    }

    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn find(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn default_scenario(&self) -> &Scenario {
        &self.scenarios[0]
    }

    /// Look up `name`, falling back to the default scenario
    pub fn resolve(&self, name: &str) -> &Scenario {
        match self.find(name) {
            Some(scenario) => scenario,
            None => {
                let fallback = self.default_scenario();
                warn!(
                    "Unknown scenario '{}', falling back to '{}'",
                    name, fallback.name
                );
                fallback
            }
        }
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_default() {
        let catalog = ScenarioCatalog::builtin();
        assert_eq!(catalog.resolve("no_such_thing").name, "simple_scheduling");
        assert_eq!(catalog.resolve("reschedule").name, "reschedule");
    }

    #[test]
    fn test_system_prompt_includes_persona_goal_and_extra() {
        let scenario = Scenario::new("x", "d", "A persona.", "A goal.").with_extra("Be brief.");
        let prompt = scenario.system_prompt();

        assert!(prompt.contains("YOUR PERSONA:\nA persona."));
        assert!(prompt.contains("YOUR GOAL:\nA goal."));
        assert!(prompt.ends_with("ADDITIONAL INSTRUCTIONS:\nBe brief."));
    }

    #[test]
    fn test_empty_catalog_uses_builtin() {
        let catalog = ScenarioCatalog::new(Vec::new());
        assert!(catalog.contains("simple_scheduling"));
    }
}
