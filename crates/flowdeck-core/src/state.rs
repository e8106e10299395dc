//! UI-agnostic chat types
//!
//! Chat history is stored per task and persisted with the session, so these
//! types don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::AgentType;

/// A chat message in a task's conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    /// Unix time in milliseconds
    pub timestamp: i64,
    pub sender_name: String,
    pub personality: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

/// Who an AI message claims to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub personality: &'static str,
}

impl Persona {
    pub const CRITIC: Persona = Persona {
        name: "Critic",
        personality: "Blunt reviewer who guards the brief's anti-goals and tone",
    };

    pub fn for_agent(agent: AgentType) -> Self {
        match agent {
            AgentType::Researcher => Persona {
                name: "Scout",
                personality: "Curious researcher who cites sources and flags unknowns",
            },
            AgentType::Coder => Persona {
                name: "Forge",
                personality: "Pragmatic engineer who prefers small, working steps",
            },
            AgentType::Writer => Persona {
                name: "Quill",
                personality: "Clear, warm writer who cuts filler",
            },
            AgentType::Strategist => Persona {
                name: "Atlas",
                personality: "Calm strategist who ties every step back to the stakes",
            },
        }
    }
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            sender_name: "You".to_string(),
            personality: String::new(),
        }
    }

    pub fn ai(text: impl Into<String>, persona: Persona) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Ai,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            sender_name: persona.name.to_string(),
            personality: persona.personality.to_string(),
        }
    }
}
