use serde::{Deserialize, Serialize};

pub const MAX_EXCHANGES: usize = 3;
pub const OPENING_QUESTION: &str = "What are you working on, and who is it for?";
pub const FALLBACK_QUESTIONS: [&str; 4] = [
    "What problem does this solve, and what happens if it stays unsolved?",
    "How should the result sound or feel, and what must it never be?",
    "What does a win look like by the end of this week?",
    "What would make you abandon this project?",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// What the caller should do after an answer is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStep {
    /// Ask the collaborator for a follow-up, then call `accept_question`
    NeedQuestion,
    /// All exchanges are in; synthesize the DNA
    Synthesize,
}

/// The onboarding question/answer loop
#[derive(Debug, Clone)]
pub struct Interview {
    transcript: Vec<Exchange>,
    pending_question: Option<String>,
}

impl Default for Interview {
    fn default() -> Self {
        Self::new()
    }
}

fn same_question(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end_matches(['?', '.', '!'])
            .to_lowercase()
    };
    normalize(a) == normalize(b)
}

impl Interview {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            pending_question: Some(OPENING_QUESTION.to_string()),
        }
    }

    pub fn current_question(&self) -> Option<&str> {
        self.pending_question.as_deref()
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    pub fn exchanges(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_complete(&self) -> bool {
        self.transcript.len() >= MAX_EXCHANGES
    }

    /// Waiting on a follow-up question from the collaborator
    pub fn awaiting_question(&self) -> bool {
        self.pending_question.is_none() && !self.is_complete()
    }

    /// Record an answer to the pending question. Blank answers and answers
    /// with no question pending are ignored.
    pub fn answer(&mut self, text: &str) -> Option<InterviewStep> {
        let answer = text.trim();
        if answer.is_empty() {
            return None;
        }
        let question = self.pending_question.take()?;
        self.transcript.push(Exchange {
            question,
            answer: answer.to_string(),
        });

        if self.is_complete() {
            Some(InterviewStep::Synthesize)
        } else {
            Some(InterviewStep::NeedQuestion)
        }
    }

    /// Install the next question. A missing, empty or repeated candidate is
    /// replaced by the next unused fallback question.
    pub fn accept_question(&mut self, candidate: Option<String>) -> &str {
        let asked = |q: &str| self.transcript.iter().any(|e| same_question(&e.question, q));

        let question = match candidate.map(|c| c.trim().to_string()) {
            Some(c) if !c.is_empty() && !asked(&c) => c,
            rejected => {
                tracing::debug!(candidate = ?rejected, "Using fallback interview question");
                FALLBACK_QUESTIONS
                    .iter()
                    .find(|q| !asked(q))
                    .unwrap_or(&FALLBACK_QUESTIONS[0])
                    .to_string()
            }
        };

        self.pending_question.insert(question).as_str()
    }

    /// Plain-text transcript, used as the DNA's raw context and in prompts
    pub fn transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|e| format!("Q: {}\nA: {}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_exchanges_then_synthesize() {
        let mut interview = Interview::new();
        assert_eq!(interview.current_question(), Some(OPENING_QUESTION));

        assert_eq!(interview.answer("A newsletter for nurses"), Some(InterviewStep::NeedQuestion));
        assert!(interview.awaiting_question());
        interview.accept_question(Some("Why now?".to_string()));

        assert_eq!(interview.answer("Burnout is peaking"), Some(InterviewStep::NeedQuestion));
        interview.accept_question(None);

        assert_eq!(interview.answer("Warm, never preachy"), Some(InterviewStep::Synthesize));
        assert!(interview.is_complete());
        assert!(!interview.awaiting_question());
        assert_eq!(interview.current_question(), None);
        assert_eq!(interview.exchanges(), 3);
    }

    #[test]
    fn test_blank_answer_is_ignored() {
        let mut interview = Interview::new();
        assert_eq!(interview.answer("   "), None);
        assert_eq!(interview.exchanges(), 0);
        assert_eq!(interview.current_question(), Some(OPENING_QUESTION));
    }

    #[test]
    fn test_answer_without_question_is_ignored() {
        let mut interview = Interview::new();
        interview.answer("first");
        assert_eq!(interview.answer("second"), None);
        assert_eq!(interview.exchanges(), 1);
    }

    #[test]
    fn test_duplicate_question_falls_back() {
        let mut interview = Interview::new();
        interview.answer("A budgeting app");
        let q = interview
            .accept_question(Some("  what are you WORKING on, and who is it for ".to_string()))
            .to_string();
        assert_eq!(q, FALLBACK_QUESTIONS[0]);
    }

    #[test]
    fn test_fallbacks_are_not_repeated() {
        let mut interview = Interview::new();
        interview.answer("one");
        interview.accept_question(Some(String::new()));
        interview.answer("two");
        let second = interview.accept_question(None).to_string();
        assert_eq!(second, FALLBACK_QUESTIONS[1]);
    }

    #[test]
    fn test_transcript_text() {
        let mut interview = Interview::new();
        interview.answer("A podcast");
        interview.accept_question(Some("For whom?".to_string()));
        interview.answer("Students");
        assert_eq!(
            interview.transcript_text(),
            format!("Q: {}\nA: A podcast\n\nQ: For whom?\nA: Students", OPENING_QUESTION)
        );
    }
}
