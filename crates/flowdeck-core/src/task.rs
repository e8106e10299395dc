use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::state::ChatMessage;

/// Plans are clamped to this many tasks
pub const MAX_PLAN_TASKS: usize = 7;
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Drafting,
    Ready,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Drafting => "drafting",
            TaskStatus::Ready => "ready",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Pending,
    Reviewing,
    NeedsRevision,
    Approved,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "unreviewed",
            VerificationStatus::Reviewing => "reviewing",
            VerificationStatus::NeedsRevision => "needs revision",
            VerificationStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentType {
    Researcher,
    Coder,
    Writer,
    Strategist,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Researcher => "Researcher",
            AgentType::Coder => "Coder",
            AgentType::Writer => "Writer",
            AgentType::Strategist => "Strategist",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "researcher" | "research" => Some(AgentType::Researcher),
            "coder" | "engineer" | "developer" => Some(AgentType::Coder),
            "writer" | "copywriter" => Some(AgentType::Writer),
            "strategist" | "strategy" => Some(AgentType::Strategist),
            _ => None,
        }
    }
}

/// One unit of generated work with its own draft and chat thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub estimated_minutes: u32,
    pub status: TaskStatus,
    pub verification_status: VerificationStatus,
    pub agent_type: AgentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_code: Option<String>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

impl MicroTask {
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Never opened, drafted, discussed or illustrated
    pub fn is_untouched(&self) -> bool {
        self.status == TaskStatus::Pending
            && !self.has_content()
            && self.chat_history.is_empty()
            && self.visual_code.is_none()
    }
}

/// A plan item as returned by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_minutes", deserialize_with = "lenient_minutes")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub agent_type: String,
}

fn default_minutes() -> u32 {
    DEFAULT_ESTIMATED_MINUTES
}

// Models sometimes answer "20" or "20 minutes" instead of 20
fn lenient_minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let minutes = match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f.round().max(1.0) as u32),
        serde_json::Value::String(s) => s
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())
            .and_then(|part| part.parse().ok()),
        _ => None,
    };
    Ok(minutes.unwrap_or(DEFAULT_ESTIMATED_MINUTES))
}

impl TaskDescriptor {
    /// Wrap the descriptor into a fresh task
    pub fn into_task(self) -> MicroTask {
        let agent_type = AgentType::from_str(&self.agent_type).unwrap_or_else(|| {
            tracing::debug!(agent_type = %self.agent_type, "Unknown agent type, using Strategist");
            AgentType::Strategist
        });

        MicroTask {
            id: Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            estimated_minutes: self.estimated_minutes,
            status: TaskStatus::Pending,
            verification_status: VerificationStatus::Pending,
            agent_type,
            content: None,
            visual_code: None,
            chat_history: Vec::new(),
        }
    }
}

/// Turn a generated plan into tasks, dropping untitled items and clamping the length
pub fn materialize_plan(descriptors: Vec<TaskDescriptor>) -> Vec<MicroTask> {
    let total = descriptors.len();
    let tasks: Vec<MicroTask> = descriptors
        .into_iter()
        .filter(|d| !d.title.trim().is_empty())
        .take(MAX_PLAN_TASKS)
        .map(TaskDescriptor::into_task)
        .collect();

    if tasks.len() < total {
        tracing::warn!(received = total, kept = tasks.len(), "Plan trimmed");
    }
    tasks
}
