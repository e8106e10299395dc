use std::time::{Duration, Instant};

use flowdeck_core::{
    Assistant, ChatMessage, DnaField, DraftOutcome, FlowMeter, InterviewStep, Persona,
    VerificationStatus, View, Workspace, WorkspaceError,
};
use ratatui::widgets::ListState;

use crate::jobs::{JobKind, JobOutput, Jobs};

/// Drafts shorter than this are not worth reviewing
pub const MIN_INTERVENTION_CHARS: usize = 80;
const STATUS_TTL: Duration = Duration::from_secs(5);
const FLOW_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Draft,
    Chat,
    Brief(DnaField),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub workspace: Workspace,
    pub assistant: Assistant,
    pub jobs: Jobs,

    // Engagement
    pub flow: FlowMeter,
    last_flow_sample: Instant,

    // Inputs
    pub answer_input: String,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub brief_input: String,

    // Navigation and scrolling
    pub task_state: ListState,
    pub editor_scroll: u16,
    pub chat_scroll: u16,
    pub summary_scroll: u16,

    // Feedback
    pub status: Option<(String, Instant)>,
    pub plan_error: Option<String>,
    pub show_reset_confirm: bool,
    pub show_visual: bool,

    // Interventions
    intervention_interval: Duration,
    next_intervention: Option<Instant>,

    // Animation state
    pub animation_frame: u8,
}

impl App {
    pub fn new(
        workspace: Workspace,
        assistant: Assistant,
        intervention_interval: Duration,
    ) -> Self {
        let mut task_state = ListState::default();
        if !workspace.tasks().is_empty() {
            task_state.select(Some(0));
        }

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            workspace,
            assistant,
            jobs: Jobs::default(),
            flow: FlowMeter::new(),
            last_flow_sample: Instant::now(),
            answer_input: String::new(),
            chat_input: String::new(),
            chat_cursor: 0,
            brief_input: String::new(),
            task_state,
            editor_scroll: 0,
            chat_scroll: 0,
            summary_scroll: 0,
            status: None,
            plan_error: None,
            show_reset_confirm: false,
            show_visual: false,
            intervention_interval,
            next_intervention: None,
            animation_frame: 0,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    /// Surface a failed workspace operation in the status line
    fn report<T>(&mut self, result: Result<T, WorkspaceError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Workspace operation failed");
                self.set_status(e.to_string());
                None
            }
        }
    }

    /// Like `report`, but a result for a task that no longer exists is dropped quietly
    fn report_late(&mut self, result: Result<(), WorkspaceError>) {
        match result {
            Err(WorkspaceError::UnknownTask(id)) => {
                tracing::debug!(task = %id, "Result for a task that no longer exists");
            }
            other => {
                self.report(other);
            }
        }
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
    }

    pub fn plan_pending(&self) -> bool {
        self.jobs.is_running(&JobKind::Plan)
    }

    pub fn draft_pending(&self) -> bool {
        self.workspace
            .current_task_id()
            .is_some_and(|id| self.jobs.is_running(&JobKind::Draft(id.to_string())))
    }

    pub fn chat_pending(&self) -> bool {
        self.workspace
            .current_task_id()
            .is_some_and(|id| self.jobs.is_running(&JobKind::Chat(id.to_string())))
    }

    pub async fn on_tick(&mut self, now: Instant) {
        self.tick_animation();

        for output in self.jobs.collect_finished().await {
            self.apply(output);
        }

        let flushed = self.workspace.tick(now);
        self.report(flushed);

        if now.saturating_duration_since(self.last_flow_sample) >= FLOW_SAMPLE_PERIOD {
            self.flow.sample(now);
            self.last_flow_sample = now;
        }

        self.maybe_check_intervention(now);

        if let Some((_, at)) = &self.status {
            if now.saturating_duration_since(*at) > STATUS_TTL {
                self.status = None;
            }
        }
    }

    /// Fold a finished job into the workspace. Task results go to the task
    /// they were requested for, whatever is open now.
    fn apply(&mut self, output: JobOutput) {
        match output {
            JobOutput::Question(result) => {
                let candidate = match result {
                    Ok(question) => Some(question),
                    Err(e) => {
                        tracing::warn!(error = %e, "Follow-up question failed");
                        None
                    }
                };
                if let Some(interview) = self.workspace.interview_mut() {
                    interview.accept_question(candidate);
                }
            }
            JobOutput::Dna(dna) => {
                let done = self.workspace.complete_interview(dna);
                if self.report(done).is_some() {
                    self.task_state.select(None);
                    self.request_plan();
                }
            }
            JobOutput::Plan(Ok(tasks)) => {
                let count = tasks.len();
                match self.workspace.install_plan(tasks) {
                    Ok(()) => {
                        self.task_state.select(Some(0));
                        self.set_status(format!("Plan ready: {} tasks", count));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Generated plan was not installed");
                        self.set_status(format!("New plan not applied: {}", e));
                        self.plan_error = Some(e.to_string());
                    }
                }
            }
            JobOutput::Plan(Err(e)) => {
                tracing::warn!(error = %e, "Plan generation failed");
                self.plan_error = Some(e.to_string());
            }
            JobOutput::Draft { task_id, text } => {
                let completed = self.workspace.task(&task_id).is_some_and(|t| t.is_completed());
                match self.workspace.apply_draft(&task_id, &text) {
                    Ok(DraftOutcome::Applied) => {}
                    Ok(DraftOutcome::Discarded) if completed => {}
                    Ok(DraftOutcome::Discarded) => {
                        self.set_status("Draft arrived after you started writing; kept your text");
                    }
                    Err(e) => self.report_late(Err(e)),
                }
            }
            JobOutput::Chat { task_id, reply } => {
                let appended = self.workspace.append_chat(&task_id, reply);
                self.report_late(appended);
                if self.workspace.current_task_id() == Some(task_id.as_str()) {
                    self.chat_scroll = u16::MAX;
                }
            }
            JobOutput::Intervention { task_id, critique } => {
                let is_current = self.workspace.current_task_id() == Some(task_id.as_str());
                let result = match critique {
                    Some(text) if is_current => self
                        .workspace
                        .append_chat(&task_id, ChatMessage::ai(text, Persona::CRITIC))
                        .and_then(|_| {
                            self.workspace
                                .set_verification(&task_id, VerificationStatus::NeedsRevision)
                        }),
                    Some(_) => {
                        tracing::debug!(
                            task = %task_id,
                            "Discarding intervention for a closed task"
                        );
                        self.workspace.set_verification(&task_id, VerificationStatus::Pending)
                    }
                    None => self.workspace.set_verification(&task_id, VerificationStatus::Pending),
                };
                if is_current {
                    self.chat_scroll = u16::MAX;
                }
                self.report_late(result);
            }
            JobOutput::Visual { task_id, source } => match source {
                Some(source) => {
                    let stored = self.workspace.set_visual(&task_id, source);
                    let is_current = self.workspace.current_task_id() == Some(task_id.as_str());
                    if stored.is_ok() && is_current {
                        self.show_visual = true;
                    }
                    self.report_late(stored);
                }
                None => self.set_status("Couldn't generate a diagram"),
            },
        }
    }

    // Onboarding

    pub fn start_interview(&mut self) {
        let started = self.workspace.initiate();
        if self.report(started).is_some() {
            self.answer_input.clear();
        }
    }

    pub fn submit_answer(&mut self) {
        let answer = std::mem::take(&mut self.answer_input);
        let Some(interview) = self.workspace.interview_mut() else {
            return;
        };

        match interview.answer(&answer) {
            Some(InterviewStep::NeedQuestion) => {
                let assistant = self.assistant.clone();
                let snapshot = interview.clone();
                self.jobs.spawn(JobKind::Question, async move {
                    JobOutput::Question(assistant.next_question(&snapshot).await)
                });
            }
            Some(InterviewStep::Synthesize) => {
                let assistant = self.assistant.clone();
                let transcript = interview.transcript_text();
                self.jobs.spawn(JobKind::Dna, async move {
                    JobOutput::Dna(assistant.synthesize_dna(&transcript).await)
                });
            }
            // Blank, or still waiting on the next question
            None => self.answer_input = answer,
        }
    }

    // Dashboard

    pub fn request_plan(&mut self) {
        if self.plan_pending() {
            return;
        }
        let Some(dna) = self.workspace.dna().cloned() else {
            return;
        };
        self.plan_error = None;
        let assistant = self.assistant.clone();
        self.jobs.spawn(JobKind::Plan, async move {
            JobOutput::Plan(assistant.generate_plan(&dna).await)
        });
    }

    pub fn task_nav_down(&mut self) {
        let len = self.workspace.tasks().len();
        if len == 0 {
            return;
        }
        let next = self.task_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.task_state.select(Some(next));
    }

    pub fn task_nav_up(&mut self) {
        let prev = self.task_state.selected().map_or(0, |i| i.saturating_sub(1));
        if !self.workspace.tasks().is_empty() {
            self.task_state.select(Some(prev));
        }
    }

    pub fn selected_task_id(&self) -> Option<String> {
        let idx = self.task_state.selected()?;
        self.workspace.tasks().get(idx).map(|t| t.id.clone())
    }

    pub fn open_selected_task(&mut self, now: Instant) {
        // A plan on its way would replace the task being opened
        if self.plan_pending() {
            self.set_status("Still planning; tasks open once the plan lands");
            return;
        }
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let selected = self.workspace.select_task(&id);
        let Some(opened) = self.report(selected) else {
            return;
        };

        if opened.needs_draft {
            self.request_draft(&opened.task_id);
        }

        self.flow.reset();
        self.editor_scroll = 0;
        self.chat_scroll = u16::MAX;
        self.show_visual = false;
        self.input_mode = InputMode::Normal;
        self.next_intervention = (!opened.read_only).then(|| now + self.intervention_interval);
    }

    fn request_draft(&mut self, task_id: &str) {
        let kind = JobKind::Draft(task_id.to_string());
        if self.jobs.is_running(&kind) {
            return;
        }
        let dna = self.workspace.dna().cloned();
        let task = self.workspace.task(task_id).cloned();
        let (Some(dna), Some(task)) = (dna, task) else {
            return;
        };
        let assistant = self.assistant.clone();
        self.jobs.spawn(kind, async move {
            let text = assistant.draft(&dna, &task).await;
            JobOutput::Draft { task_id: task.id, text }
        });
    }

    pub fn start_brief_edit(&mut self, field: DnaField) {
        let Some(dna) = self.workspace.dna() else {
            return;
        };
        self.brief_input = dna.get(field).to_string();
        self.input_mode = InputMode::Brief(field);
    }

    /// Save the edited field; returns false if nothing was saved
    pub fn commit_brief(&mut self, field: DnaField) -> bool {
        if self.brief_input.trim().is_empty() {
            self.set_status(format!("{} can't be empty", field.label()));
            return false;
        }
        let value = std::mem::take(&mut self.brief_input);
        let updated = self.workspace.update_dna(field, &value);
        self.report(updated).is_some()
    }

    pub fn show_summary(&mut self) {
        let shown = self.workspace.show_summary();
        if self.report(shown).is_some() {
            self.summary_scroll = 0;
        }
    }

    pub fn back_to_dashboard(&mut self) {
        let back = self.workspace.back_to_dashboard();
        self.report(back);
    }

    // Working

    pub fn edit_draft<F>(&mut self, now: Instant, f: F)
    where
        F: FnOnce(&mut String),
    {
        let edited = self.workspace.edit(now, f);
        if self.report(edited).is_some() {
            self.flow.record_edit(now);
        }
    }

    pub fn send_chat(&mut self) {
        let message = self.chat_input.trim().to_string();
        if message.is_empty() {
            return;
        }
        let dna = self.workspace.dna().cloned();
        let task = self.workspace.current_task().cloned();
        let (Some(dna), Some(task)) = (dna, task) else {
            return;
        };
        let kind = JobKind::Chat(task.id.clone());
        if self.jobs.is_running(&kind) {
            self.set_status("Still waiting on the last reply");
            return;
        }

        let draft = self.workspace.buffer().to_string();
        let appended = self.workspace.append_chat(&task.id, ChatMessage::user(message.clone()));
        if self.report(appended).is_none() {
            return;
        }
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_scroll = u16::MAX;

        // History snapshot predates the new message; the prompt adds it itself
        let assistant = self.assistant.clone();
        self.jobs.spawn(kind, async move {
            let reply = assistant.chat(&dna, &task, &draft, &message).await;
            JobOutput::Chat { task_id: task.id, reply }
        });
    }

    pub fn request_visual(&mut self) {
        let Some(task) = self.workspace.current_task().cloned() else {
            return;
        };
        if task.is_completed() {
            if task.visual_code.is_some() {
                self.show_visual = true;
            }
            return;
        }
        let kind = JobKind::Visual(task.id.clone());
        if self.jobs.is_running(&kind) {
            return;
        }
        let draft = self.workspace.buffer().to_string();
        let assistant = self.assistant.clone();
        self.set_status("Sketching a diagram...");
        self.jobs.spawn(kind, async move {
            let source = assistant.visual(&task, &draft).await;
            JobOutput::Visual { task_id: task.id, source }
        });
    }

    fn maybe_check_intervention(&mut self, now: Instant) {
        let Some(due) = self.next_intervention else {
            return;
        };
        if self.workspace.view() != View::Working || now < due {
            return;
        }
        self.next_intervention = Some(now + self.intervention_interval);

        let Some(task) = self.workspace.current_task().cloned() else {
            return;
        };
        if task.is_completed() || self.workspace.buffer().chars().count() < MIN_INTERVENTION_CHARS {
            return;
        }
        let kind = JobKind::Intervention(task.id.clone());
        if self.jobs.is_running(&kind) {
            return;
        }
        let Some(dna) = self.workspace.dna().cloned() else {
            return;
        };

        let reviewing = self.workspace.set_verification(&task.id, VerificationStatus::Reviewing);
        if self.report(reviewing).is_none() {
            return;
        }
        let draft = self.workspace.buffer().to_string();
        let assistant = self.assistant.clone();
        self.jobs.spawn(kind, async move {
            let critique = assistant.check_intervention(&dna, &task, &draft).await;
            JobOutput::Intervention { task_id: task.id, critique }
        });
    }

    pub fn exit_task(&mut self) {
        let exited = self.workspace.exit_task();
        if self.report(exited).is_some() {
            self.leave_working();
        }
    }

    pub fn complete_task(&mut self) {
        let completed = self.workspace.complete_task();
        if let Some(view) = self.report(completed) {
            self.leave_working();
            if view == View::Summary {
                self.summary_scroll = 0;
                self.set_status("Every task is done");
            }
        }
    }

    fn leave_working(&mut self) {
        self.next_intervention = None;
        self.show_visual = false;
        self.input_mode = InputMode::Normal;
        self.chat_input.clear();
        self.chat_cursor = 0;
    }

    // Reset and shutdown

    pub fn confirm_reset(&mut self) {
        self.show_reset_confirm = false;
        self.jobs.abort_all();
        let reset = self.workspace.reset();
        if self.report(reset).is_some() {
            self.leave_working();
            self.flow.reset();
            self.answer_input.clear();
            self.brief_input.clear();
            self.plan_error = None;
            self.task_state.select(None);
            self.set_status("Everything cleared");
        }
    }

    /// Flush pending edits; in-flight jobs are abandoned
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        self.jobs.abort_all();
        self.workspace.close()?;
        Ok(())
    }
}
