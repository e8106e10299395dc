//! Prompt builders for every collaborator call

use crate::dna::ProjectDna;
use crate::state::{ChatMessage, ChatRole, Persona};
use crate::task::{MicroTask, MAX_PLAN_TASKS};

/// Chat turns included as context for a reply
pub const CHAT_CONTEXT_MESSAGES: usize = 10;

pub fn follow_up_question(transcript: &str) -> String {
    format!(
        r"You are interviewing someone to understand a project before planning it.

Interview so far:
{transcript}

Ask ONE short follow-up question that uncovers something not yet covered:
the audience, the real problem, the desired tone, what to avoid, or what is at stake.
Output only the question, with no preamble and no quotes."
    )
}

pub fn synthesize_dna(transcript: &str) -> String {
    format!(
        r#"Summarize this interview into a project brief.

Interview:
{transcript}

Respond with a single JSON object and nothing else:
{{"audience": "...", "problem": "...", "tone": "...", "antiGoals": "...", "stakes": "..."}}
Each value is one or two concrete sentences."#
    )
}

pub fn generate_plan(dna: &ProjectDna) -> String {
    format!(
        r#"You are planning a project as a sequence of small, concrete tasks.

Project brief:
{brief}
Context:
{context}

Produce between 4 and {max} tasks, each finishable in under an hour.
Assign each task to one agent type: Researcher, Coder, Writer or Strategist.
Respond with a single JSON object and nothing else:
{{"tasks": [{{"title": "...", "description": "...", "estimatedMinutes": 20, "agentType": "Writer"}}]}}"#,
        brief = dna.as_prompt_block(),
        context = dna.raw_context,
        max = MAX_PLAN_TASKS,
    )
}

pub fn draft_task(dna: &ProjectDna, task: &MicroTask) -> String {
    let persona = Persona::for_agent(task.agent_type);
    format!(
        r"You are {name}, a {agent}. {personality}.

Project brief:
{brief}
Task: {title}
Details: {description}

Write a complete first draft for this task in Markdown.
Respect the tone and never do anything listed under anti-goals.
Output only the draft.",
        name = persona.name,
        agent = task.agent_type.as_str(),
        personality = persona.personality,
        brief = dna.as_prompt_block(),
        title = task.title,
        description = task.description,
    )
}

pub fn chat_reply(dna: &ProjectDna, task: &MicroTask, draft: &str, message: &str) -> String {
    let persona = Persona::for_agent(task.agent_type);
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are {}, a {}. {}.\n\n",
        persona.name,
        task.agent_type.as_str(),
        persona.personality
    ));
    prompt.push_str("Project brief:\n");
    prompt.push_str(&dna.as_prompt_block());
    prompt.push_str(&format!("\nTask: {}\n{}\n\n", task.title, task.description));

    if !draft.trim().is_empty() {
        prompt.push_str("Current draft:\n");
        prompt.push_str(draft);
        prompt.push_str("\n\n");
    }

    let history = &task.chat_history;
    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        let skip = history.len().saturating_sub(CHAT_CONTEXT_MESSAGES);
        for msg in history.iter().skip(skip) {
            push_turn(&mut prompt, msg);
        }
        prompt.push('\n');
    }

    prompt.push_str("User: ");
    prompt.push_str(message);
    prompt.push_str("\n\nReply briefly and concretely. Suggest exact wording when it helps.");
    prompt
}

fn push_turn(prompt: &mut String, msg: &ChatMessage) {
    match msg.role {
        ChatRole::User => prompt.push_str(&format!("User: {}\n", msg.text)),
        ChatRole::Ai => prompt.push_str(&format!("{}: {}\n", msg.sender_name, msg.text)),
    }
}

pub fn intervention_check(dna: &ProjectDna, task: &MicroTask, draft: &str) -> String {
    format!(
        r#"You review drafts against a project brief.

Project brief:
{brief}
Task: {title}

Draft:
{draft}

Does the draft clearly violate the anti-goals, drift from the tone, or miss the audience?
Only intervene for real problems.
Respond with a single JSON object and nothing else:
{{"intervene": true or false, "message": "one or two sentences of critique, empty if not intervening"}}"#,
        brief = dna.as_prompt_block(),
        title = task.title,
    )
}

pub fn visual_diagram(task: &MicroTask, draft: &str) -> String {
    format!(
        r"Turn this work into a small Mermaid diagram (flowchart or mindmap, at most 12 nodes).

Task: {title}
Draft:
{draft}

Output only Mermaid source, no explanation.",
        title = task.title,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDescriptor;

    fn task() -> MicroTask {
        TaskDescriptor {
            title: "Draft FAQ".to_string(),
            description: "Five questions".to_string(),
            estimated_minutes: 15,
            agent_type: "writer".to_string(),
        }
        .into_task()
    }

    #[test]
    fn test_plan_prompt_includes_brief() {
        let mut dna = ProjectDna::fallback("Q: what\nA: a zine");
        dna.audience = "Skaters in Lisbon".to_string();
        let prompt = generate_plan(&dna);
        assert!(prompt.contains("Skaters in Lisbon"));
        assert!(prompt.contains("a zine"));
        assert!(prompt.contains("\"tasks\""));
    }

    #[test]
    fn test_chat_prompt_keeps_recent_history_only() {
        let mut task = task();
        for i in 0..15 {
            task.chat_history.push(ChatMessage::user(format!("message {}", i)));
        }
        let prompt = chat_reply(&ProjectDna::fallback(""), &task, "", "and now?");
        assert!(!prompt.contains("message 4\n"));
        assert!(prompt.contains("message 5\n"));
        assert!(prompt.contains("message 14\n"));
        assert!(prompt.ends_with("Suggest exact wording when it helps."));
        assert!(!prompt.contains("Current draft"));
    }

    #[test]
    fn test_draft_prompt_uses_persona() {
        let prompt = draft_task(&ProjectDna::fallback(""), &task());
        assert!(prompt.starts_with("You are Quill, a Writer."));
    }
}
