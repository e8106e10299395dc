//! Collaborator calls with their failure policy
//!
//! | call            | on failure                         |
//! |-----------------|------------------------------------|
//! | follow-up       | caller falls back to local list    |
//! | DNA synthesis   | local default DNA                  |
//! | plan            | error returned, caller retries     |
//! | draft, chat     | visible placeholder / error text   |
//! | intervention    | silently "no intervention"         |
//! | visual          | none, logged                       |

use std::sync::Arc;

use serde::Deserialize;

use crate::ai::LlmService;
use crate::dna::ProjectDna;
use crate::interview::Interview;
use crate::json::{self, JsonError};
use crate::prompts;
use crate::state::{ChatMessage, Persona};
use crate::task::{materialize_plan, MicroTask, TaskDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("AI service failed: {0}")]
    Service(anyhow::Error),

    #[error("could not read the plan: {0}")]
    Malformed(#[from] JsonError),

    #[error("the plan came back empty")]
    Empty,
}

impl From<anyhow::Error> for PlanError {
    fn from(e: anyhow::Error) -> Self {
        PlanError::Service(e)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanResponse {
    Wrapped { tasks: Vec<TaskDescriptor> },
    Bare(Vec<TaskDescriptor>),
}

#[derive(Deserialize)]
struct InterventionDecision {
    intervene: bool,
    #[serde(default)]
    message: String,
}

/// Handle to the completion service, constructed once at startup and cloned
/// into background jobs
#[derive(Clone)]
pub struct Assistant {
    llm: Arc<dyn LlmService>,
}

impl Assistant {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    pub fn describe(&self) -> String {
        format!("{} · {}", self.llm.name(), self.llm.model())
    }

    /// Ask for the next interview question. The raw candidate is cleaned of
    /// quotes and preamble lines; validation happens in `Interview::accept_question`.
    pub async fn next_question(&self, interview: &Interview) -> anyhow::Result<String> {
        let prompt = prompts::follow_up_question(&interview.transcript_text());
        let response = self.llm.complete(&prompt).await?;
        Ok(clean_question(&response))
    }

    /// Synthesize the brief from the interview, falling back to the default DNA
    pub async fn synthesize_dna(&self, transcript: &str) -> ProjectDna {
        let prompt = prompts::synthesize_dna(transcript);
        let decoded = match self.llm.complete_json(&prompt).await {
            Ok(response) => json::decode::<ProjectDna>(&response).map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(mut dna) => {
                dna.raw_context = transcript.to_string();
                dna.normalize()
            }
            Err(e) => {
                tracing::warn!(error = %e, "DNA synthesis failed, using default brief");
                ProjectDna::fallback(transcript)
            }
        }
    }

    pub async fn generate_plan(&self, dna: &ProjectDna) -> Result<Vec<MicroTask>, PlanError> {
        let response = self.llm.complete_json(&prompts::generate_plan(dna)).await?;
        let descriptors = match json::decode::<PlanResponse>(&response)? {
            PlanResponse::Wrapped { tasks } => tasks,
            PlanResponse::Bare(tasks) => tasks,
        };

        let tasks = materialize_plan(descriptors);
        if tasks.is_empty() {
            return Err(PlanError::Empty);
        }
        tracing::info!(tasks = tasks.len(), "Plan generated");
        Ok(tasks)
    }

    pub async fn draft(&self, dna: &ProjectDna, task: &MicroTask) -> String {
        match self.llm.complete(&prompts::draft_task(dna, task)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => draft_placeholder("the AI returned an empty draft"),
            Err(e) => {
                tracing::warn!(task = %task.id, error = %e, "Draft failed");
                draft_placeholder(&e.to_string())
            }
        }
    }

    pub async fn chat(
        &self,
        dna: &ProjectDna,
        task: &MicroTask,
        draft: &str,
        message: &str,
    ) -> ChatMessage {
        let persona = Persona::for_agent(task.agent_type);
        let prompt = prompts::chat_reply(dna, task, draft, message);
        match self.llm.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => ChatMessage::ai(text.trim(), persona),
            Ok(_) => ChatMessage::ai("(No reply. Try rephrasing.)", persona),
            Err(e) => {
                tracing::warn!(task = %task.id, error = %e, "Chat reply failed");
                ChatMessage::ai(format!("Error: couldn't reach the AI ({}).", e), persona)
            }
        }
    }

    /// Returns the critique to inject, or `None` (including on any failure)
    pub async fn check_intervention(
        &self,
        dna: &ProjectDna,
        task: &MicroTask,
        draft: &str,
    ) -> Option<String> {
        let prompt = prompts::intervention_check(dna, task, draft);
        let response = match self.llm.complete_json(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "Intervention check failed");
                return None;
            }
        };

        match json::decode::<InterventionDecision>(&response) {
            Ok(decision) if decision.intervene && !decision.message.trim().is_empty() => {
                Some(decision.message.trim().to_string())
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable intervention decision");
                None
            }
        }
    }

    /// Mermaid source for the task, with any code fence removed
    pub async fn visual(&self, task: &MicroTask, draft: &str) -> Option<String> {
        match self.llm.complete(&prompts::visual_diagram(task, draft)).await {
            Ok(text) => {
                let source = json::strip_code_fences(&text).unwrap_or(text.trim()).to_string();
                (!source.is_empty()).then_some(source)
            }
            Err(e) => {
                tracing::warn!(task = %task.id, error = %e, "Visual generation failed");
                None
            }
        }
    }
}

fn draft_placeholder(reason: &str) -> String {
    format!(
        "_Draft unavailable: {}._\n\nStart writing here, or clear this text and reopen the task to retry.",
        reason
    )
}

fn clean_question(response: &str) -> String {
    let lines: Vec<&str> = response
        .lines()
        .map(|line| line.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '*').trim())
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .find(|line| line.ends_with('?'))
        .or_else(|| lines.first())
        .map(|line| line.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::scripted::ScriptedLlm;
    use crate::dna::{
        FALLBACK_ANTI_GOALS, FALLBACK_AUDIENCE, FALLBACK_PROBLEM, FALLBACK_STAKES, FALLBACK_TONE,
    };
    use crate::state::ChatRole;
    use crate::task::{AgentType, TaskStatus};

    fn assistant(llm: ScriptedLlm) -> Assistant {
        Assistant::new(Arc::new(llm))
    }

    fn three_answer_interview() -> Interview {
        let mut interview = Interview::new();
        interview.answer("A cookbook for students");
        interview.accept_question(Some("Who buys it?".to_string()));
        interview.answer("Parents, as a gift");
        interview.accept_question(Some("What must it avoid?".to_string()));
        interview.answer("Expensive ingredients");
        interview
    }

    fn sample_task() -> MicroTask {
        TaskDescriptor {
            title: "Write intro".to_string(),
            description: "Two paragraphs".to_string(),
            estimated_minutes: 15,
            agent_type: "Writer".to_string(),
        }
        .into_task()
    }

    #[tokio::test]
    async fn test_dna_from_three_exchanges() {
        let interview = three_answer_interview();
        let llm = ScriptedLlm::new().reply(
            "Here's the brief:\n```json\n{\"audience\": \"Parents of students\", \"problem\": \"Students eat badly\", \
             \"tone\": \"Playful\", \"antiGoals\": \"No pricey ingredients\", \"stakes\": \"Holiday sales\"}\n```",
        );

        let dna = assistant(llm).synthesize_dna(&interview.transcript_text()).await;
        assert_eq!(dna.audience, "Parents of students");
        assert_eq!(dna.anti_goals, "No pricey ingredients");
        assert!(dna.raw_context.contains("A cookbook for students"));
    }

    #[tokio::test]
    async fn test_dna_fills_missing_fields() {
        let llm = ScriptedLlm::new().reply("{\"audience\": \"Parents\"}");
        let dna = assistant(llm).synthesize_dna("Q: a\nA: b").await;
        assert_eq!(dna.audience, "Parents");
        assert_eq!(dna.problem, FALLBACK_PROBLEM);
        assert_eq!(dna.stakes, FALLBACK_STAKES);
    }

    #[tokio::test]
    async fn test_dna_fallback_on_failure() {
        let interview = three_answer_interview();
        let dna = assistant(ScriptedLlm::new().fail("offline"))
            .synthesize_dna(&interview.transcript_text())
            .await;

        assert_eq!(dna.audience, FALLBACK_AUDIENCE);
        assert_eq!(dna.problem, FALLBACK_PROBLEM);
        assert_eq!(dna.tone, FALLBACK_TONE);
        assert_eq!(dna.anti_goals, FALLBACK_ANTI_GOALS);
        assert_eq!(dna.stakes, FALLBACK_STAKES);
        assert_eq!(dna.raw_context, interview.transcript_text());
    }

    #[tokio::test]
    async fn test_dna_fallback_on_garbage() {
        let dna = assistant(ScriptedLlm::new().reply("I'd love to help!"))
            .synthesize_dna("Q: a\nA: b")
            .await;
        assert_eq!(dna.tone, FALLBACK_TONE);
    }

    #[tokio::test]
    async fn test_plan_of_five() {
        let response = r#"Sure, here it is:
{"tasks": [
  {"title": "Survey students", "description": "10 interviews", "estimatedMinutes": 45, "agentType": "Researcher"},
  {"title": "Pick 20 recipes", "description": "Under $5 each", "estimatedMinutes": 30, "agentType": "Strategist"},
  {"title": "Write intro", "description": "Two paragraphs", "estimatedMinutes": 20, "agentType": "Writer"},
  {"title": "Build order page", "description": "Static page", "estimatedMinutes": 50, "agentType": "Coder"},
  {"title": "Draft gift email", "description": "For parents", "estimatedMinutes": 15, "agentType": "Writer"}
]}"#;
        let tasks = assistant(ScriptedLlm::new().reply(response))
            .generate_plan(&ProjectDna::fallback(""))
            .await
            .unwrap();

        assert_eq!(tasks.len(), 5);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
        assert_eq!(tasks[0].agent_type, AgentType::Researcher);
        assert_eq!(tasks[3].agent_type, AgentType::Coder);
    }

    #[tokio::test]
    async fn test_plan_accepts_bare_array() {
        let response = r#"[{"title": "One", "agentType": "Writer"}, {"title": "Two", "agentType": "Coder"}]"#;
        let tasks = assistant(ScriptedLlm::new().reply(response))
            .generate_plan(&ProjectDna::fallback(""))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_plan_failure_propagates() {
        let result = assistant(ScriptedLlm::new().fail("timeout"))
            .generate_plan(&ProjectDna::fallback(""))
            .await;
        assert!(matches!(result, Err(PlanError::Service(_))));

        let result = assistant(ScriptedLlm::new().reply("{\"tasks\": []}"))
            .generate_plan(&ProjectDna::fallback(""))
            .await;
        assert!(matches!(result, Err(PlanError::Empty)));

        let result = assistant(ScriptedLlm::new().reply("{\"tasks\": [{\"title\": \"cut o"))
            .generate_plan(&ProjectDna::fallback(""))
            .await;
        assert!(matches!(result, Err(PlanError::Malformed(JsonError::Truncated))));
    }

    #[tokio::test]
    async fn test_draft_degrades_to_placeholder() {
        let text = assistant(ScriptedLlm::new().fail("connection refused"))
            .draft(&ProjectDna::fallback(""), &sample_task())
            .await;
        assert!(text.starts_with("_Draft unavailable"));
        assert!(text.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_chat_reply_uses_persona_and_degrades() {
        let task = sample_task();
        let dna = ProjectDna::fallback("");

        let reply = assistant(ScriptedLlm::new().reply("  Cut the second sentence.  "))
            .chat(&dna, &task, "draft", "too long?")
            .await;
        assert_eq!(reply.role, ChatRole::Ai);
        assert_eq!(reply.sender_name, "Quill");
        assert_eq!(reply.text, "Cut the second sentence.");

        let reply = assistant(ScriptedLlm::new().fail("503"))
            .chat(&dna, &task, "draft", "too long?")
            .await;
        assert!(reply.text.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_intervention_decisions() {
        let task = sample_task();
        let dna = ProjectDna::fallback("");

        let critique = assistant(ScriptedLlm::new().reply(
            "{\"intervene\": true, \"message\": \"This reads like an ad.\"}",
        ))
        .check_intervention(&dna, &task, "Buy now!!!")
        .await;
        assert_eq!(critique.as_deref(), Some("This reads like an ad."));

        let none = assistant(ScriptedLlm::new().reply("{\"intervene\": false, \"message\": \"\"}"))
            .check_intervention(&dna, &task, "fine")
            .await;
        assert!(none.is_none());

        let silent = assistant(ScriptedLlm::new().fail("down"))
            .check_intervention(&dna, &task, "fine")
            .await;
        assert!(silent.is_none());

        let garbage = assistant(ScriptedLlm::new().reply("maybe?"))
            .check_intervention(&dna, &task, "fine")
            .await;
        assert!(garbage.is_none());
    }

    #[tokio::test]
    async fn test_visual_strips_fence() {
        let source = assistant(ScriptedLlm::new().reply("```mermaid\ngraph TD\n  A-->B\n```"))
            .visual(&sample_task(), "draft")
            .await;
        assert_eq!(source.as_deref(), Some("graph TD\n  A-->B"));

        let none = assistant(ScriptedLlm::new().fail("x"))
            .visual(&sample_task(), "draft")
            .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_next_question_is_cleaned() {
        let llm = Arc::new(ScriptedLlm::new().reply("Great answer!\n\n\"Who will pay for it?\""));
        let assistant = Assistant::new(llm.clone());
        let mut interview = Interview::new();
        interview.answer("A tool for plumbers");

        let question = assistant.next_question(&interview).await.unwrap();
        assert_eq!(question, "Who will pay for it?");
        assert!(llm.prompts()[0].contains("A tool for plumbers"));
    }
}
