pub mod ai;
pub mod assistant;
pub mod autosave;
pub mod config;
pub mod dna;
pub mod flow;
pub mod interview;
pub mod json;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod state;
pub mod task;
pub mod workspace;

// Re-export main types for convenience
pub use ai::{build_service, ClaudeClient, LlmService, OllamaClient, OpenAIClient};
pub use assistant::{Assistant, PlanError};
pub use config::Config;
pub use dna::{DnaField, ProjectDna};
pub use flow::FlowMeter;
pub use interview::{Interview, InterviewStep};
pub use json::JsonError;
pub use provider::Provider;
pub use session::{Session, SessionStore, StoreError};
pub use state::{ChatMessage, ChatRole, Persona};
pub use task::{AgentType, MicroTask, TaskDescriptor, TaskStatus, VerificationStatus};
pub use workspace::{DraftOutcome, OpenedTask, View, Workspace, WorkspaceError};
