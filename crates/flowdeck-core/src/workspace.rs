//! The view controller: which screen is active, which task is open, and the
//! persistence contract around them.
//!
//! ```text
//! Idle ──initiate──▶ DnaExtraction ──complete_interview──▶ Dashboard ⇄ Working
//!   ▲                                                        │  ▲
//!   └───────────────────────── reset ◀──── (any) ────────────┘  │
//!                                         Dashboard ⇄ Summary ──┘
//! ```
//!
//! At most one task is `InProgress`, and it is always the open task. Edits go
//! to an in-memory buffer that [`Autosave`] writes back after a debounce;
//! leaving or completing a task writes it back immediately.

use std::time::{Duration, Instant};

use crate::autosave::Autosave;
use crate::dna::{DnaField, ProjectDna};
use crate::interview::Interview;
use crate::session::{Session, SessionStore, StoreError};
use crate::state::ChatMessage;
use crate::task::{MicroTask, TaskStatus, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Idle,
    DnaExtraction,
    Dashboard,
    Working,
    Summary,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("cannot {action} from the {from:?} view")]
    InvalidTransition { from: View, action: &'static str },

    #[error("no task with id {0}")]
    UnknownTask(String),

    #[error("task {0} is completed and read-only")]
    TaskLocked(String),

    #[error("no project brief yet")]
    MissingDna,

    #[error("work has started on the current plan; reset to plan again")]
    PlanInUse,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// What the caller needs to know after opening a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTask {
    pub task_id: String,
    /// The task has no content and no draft request in flight
    pub needs_draft: bool,
    pub read_only: bool,
}

/// How a late draft was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOutcome {
    Applied,
    /// The task already had user text; the draft was dropped
    Discarded,
}

pub struct Workspace {
    view: View,
    session: Session,
    current_task: Option<String>,
    buffer: String,
    interview: Option<Interview>,
    autosave: Autosave,
    store: SessionStore,
}

impl Workspace {
    /// Restore the persisted session. A corrupt record is logged and replaced
    /// with an empty session rather than failing startup.
    pub fn open(store: SessionStore, debounce: Duration) -> Result<Self> {
        let mut session = match store.load() {
            Ok(session) => session.unwrap_or_default(),
            Err(StoreError::Corrupt(e)) => {
                tracing::warn!(error = %e, "Stored session unreadable, starting fresh");
                Session::default()
            }
            Err(e) => return Err(e.into()),
        };

        // Nothing is open or in flight right after startup
        for task in &mut session.tasks {
            if matches!(task.status, TaskStatus::InProgress | TaskStatus::Drafting) {
                task.status = if task.has_content() {
                    TaskStatus::Ready
                } else {
                    TaskStatus::Pending
                };
            }
            if task.verification_status == VerificationStatus::Reviewing {
                task.verification_status = VerificationStatus::Pending;
            }
        }

        let view = if session.dna.is_some() { View::Dashboard } else { View::Idle };
        tracing::info!(view = ?view, tasks = session.tasks.len(), "Workspace opened");

        Ok(Self {
            view,
            session,
            current_task: None,
            buffer: String::new(),
            interview: None,
            autosave: Autosave::new(debounce),
            store,
        })
    }

    // Accessors

    pub fn view(&self) -> View {
        self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn dna(&self) -> Option<&ProjectDna> {
        self.session.dna.as_ref()
    }

    pub fn tasks(&self) -> &[MicroTask] {
        &self.session.tasks
    }

    pub fn task(&self, id: &str) -> Option<&MicroTask> {
        self.session.task(id)
    }

    pub fn current_task_id(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    pub fn current_task(&self) -> Option<&MicroTask> {
        self.current_task.as_deref().and_then(|id| self.session.task(id))
    }

    /// The open task's working text
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    pub fn is_read_only(&self) -> bool {
        self.current_task().is_some_and(MicroTask::is_completed)
    }

    pub fn interview(&self) -> Option<&Interview> {
        self.interview.as_ref()
    }

    pub fn interview_mut(&mut self) -> Option<&mut Interview> {
        self.interview.as_mut()
    }

    pub fn all_completed(&self) -> bool {
        !self.session.tasks.is_empty() && self.session.tasks.iter().all(MicroTask::is_completed)
    }

    /// (completed, total)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.session.tasks.iter().filter(|t| t.is_completed()).count();
        (done, self.session.tasks.len())
    }

    /// No task has been opened, drafted, discussed or illustrated
    pub fn plan_replaceable(&self) -> bool {
        self.session.tasks.iter().all(MicroTask::is_untouched)
    }

    fn transition(&mut self, to: View) {
        tracing::info!(from = ?self.view, to = ?to, "View transition");
        self.view = to;
    }

    fn expect_view(&self, expected: View, action: &'static str) -> Result<()> {
        if self.view == expected {
            Ok(())
        } else {
            Err(WorkspaceError::InvalidTransition { from: self.view, action })
        }
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut MicroTask> {
        self.session
            .task_mut(id)
            .ok_or_else(|| WorkspaceError::UnknownTask(id.to_string()))
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.session)?;
        Ok(())
    }

    // Onboarding

    pub fn initiate(&mut self) -> Result<()> {
        self.expect_view(View::Idle, "start the interview")?;
        self.interview = Some(Interview::new());
        self.transition(View::DnaExtraction);
        Ok(())
    }

    pub fn complete_interview(&mut self, dna: ProjectDna) -> Result<()> {
        self.expect_view(View::DnaExtraction, "finish the interview")?;
        self.session.dna = Some(dna);
        self.session.tasks.clear();
        self.interview = None;
        self.persist()?;
        self.transition(View::Dashboard);
        Ok(())
    }

    pub fn update_dna(&mut self, field: DnaField, value: &str) -> Result<()> {
        let dna = self.session.dna.as_mut().ok_or(WorkspaceError::MissingDna)?;
        dna.set(field, value.trim());
        self.persist()
    }

    // Planning

    /// Replace the task list with a freshly generated plan. Refused once any
    /// task has been worked on; only a reset discards tasks.
    pub fn install_plan(&mut self, tasks: Vec<MicroTask>) -> Result<()> {
        self.expect_view(View::Dashboard, "install a plan")?;
        if self.session.dna.is_none() {
            return Err(WorkspaceError::MissingDna);
        }
        if !self.plan_replaceable() {
            return Err(WorkspaceError::PlanInUse);
        }
        self.session.tasks = tasks;
        self.persist()
    }

    // Working on a task

    pub fn select_task(&mut self, id: &str) -> Result<OpenedTask> {
        self.expect_view(View::Dashboard, "open a task")?;

        let task = self.task_mut(id)?;
        let read_only = task.is_completed();
        let mut needs_draft = false;

        if !read_only {
            if task.has_content() {
                task.status = TaskStatus::InProgress;
            } else if task.status != TaskStatus::Drafting {
                task.status = TaskStatus::Drafting;
                needs_draft = true;
            }
        }
        let buffer = task.content.clone().unwrap_or_default();

        self.buffer = buffer;
        self.current_task = Some(id.to_string());
        self.persist()?;
        self.transition(View::Working);

        Ok(OpenedTask {
            task_id: id.to_string(),
            needs_draft,
            read_only,
        })
    }

    /// Apply a draft to the task it was requested for. Drafts never replace
    /// text the user already has, whether saved or still in the editor.
    pub fn apply_draft(&mut self, id: &str, text: &str) -> Result<DraftOutcome> {
        let is_current = self.current_task.as_deref() == Some(id);
        let editor_has_text = is_current && !self.buffer.trim().is_empty();

        let task = self.task_mut(id)?;
        if task.is_completed() {
            return Ok(DraftOutcome::Discarded);
        }

        let outcome = if task.has_content() || editor_has_text {
            tracing::debug!(task = %id, "Draft arrived after user text, discarding");
            DraftOutcome::Discarded
        } else {
            task.content = Some(text.to_string());
            DraftOutcome::Applied
        };

        if task.status == TaskStatus::Drafting {
            task.status = if is_current { TaskStatus::InProgress } else { TaskStatus::Ready };
        }

        if is_current && outcome == DraftOutcome::Applied {
            self.buffer = text.to_string();
        }
        self.persist()?;
        Ok(outcome)
    }

    /// Mutate the open task's text; schedules a debounced flush
    pub fn edit<F>(&mut self, now: Instant, f: F) -> Result<()>
    where
        F: FnOnce(&mut String),
    {
        self.expect_view(View::Working, "edit")?;
        if let Some(task) = self.current_task() {
            if task.is_completed() {
                return Err(WorkspaceError::TaskLocked(task.id.clone()));
            }
        }
        f(&mut self.buffer);
        self.autosave.mark_dirty(now);
        Ok(())
    }

    /// Flush if the debounce deadline has passed. Returns whether it flushed.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        if self.autosave.is_due(now) {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Write the editor buffer into the open task and save the session
    pub fn flush(&mut self) -> Result<()> {
        if let Some(id) = self.current_task.clone() {
            let content = (!self.buffer.trim().is_empty()).then(|| self.buffer.clone());
            let task = self.task_mut(&id)?;
            if !task.is_completed() {
                task.content = content;
            }
        }
        self.persist()?;
        self.autosave.mark_flushed();
        tracing::debug!("Autosave flushed");
        Ok(())
    }

    fn close_current(&mut self) {
        self.current_task = None;
        self.buffer.clear();
    }

    pub fn exit_task(&mut self) -> Result<()> {
        self.expect_view(View::Working, "leave the task")?;

        if let Some(id) = self.current_task.clone() {
            let typed = !self.buffer.trim().is_empty();
            let task = self.task_mut(&id)?;
            if !task.is_completed() {
                // Drafting with typed text: written while the draft was pending
                if task.status == TaskStatus::InProgress
                    || (task.status == TaskStatus::Drafting && typed)
                {
                    task.status = TaskStatus::Ready;
                }
            }
        }
        self.flush()?;
        self.close_current();
        self.transition(View::Dashboard);
        Ok(())
    }

    /// Lock the open task with the editor's text. Returns the view landed on.
    pub fn complete_task(&mut self) -> Result<View> {
        self.expect_view(View::Working, "complete the task")?;
        let id = self.current_task.clone().ok_or(WorkspaceError::InvalidTransition {
            from: self.view,
            action: "complete without an open task",
        })?;

        self.flush()?;
        let task = self.task_mut(&id)?;
        if task.is_completed() {
            return Err(WorkspaceError::TaskLocked(id));
        }
        task.status = TaskStatus::Completed;
        task.verification_status = VerificationStatus::Approved;
        self.persist()?;

        self.close_current();
        let next = if self.all_completed() { View::Summary } else { View::Dashboard };
        self.transition(next);
        Ok(next)
    }

    pub fn append_chat(&mut self, id: &str, message: ChatMessage) -> Result<()> {
        self.task_mut(id)?.chat_history.push(message);
        self.persist()
    }

    pub fn set_visual(&mut self, id: &str, source: String) -> Result<()> {
        let task = self.task_mut(id)?;
        if task.is_completed() {
            return Err(WorkspaceError::TaskLocked(id.to_string()));
        }
        task.visual_code = Some(source);
        self.persist()
    }

    /// Completed tasks keep their Approved status
    pub fn set_verification(&mut self, id: &str, status: VerificationStatus) -> Result<()> {
        let task = self.task_mut(id)?;
        if task.is_completed() {
            return Ok(());
        }
        task.verification_status = status;
        self.persist()
    }

    // Summary

    pub fn show_summary(&mut self) -> Result<()> {
        self.expect_view(View::Dashboard, "show the summary")?;
        if !self.all_completed() {
            return Err(WorkspaceError::InvalidTransition {
                from: self.view,
                action: "show the summary before every task is complete",
            });
        }
        self.transition(View::Summary);
        Ok(())
    }

    pub fn back_to_dashboard(&mut self) -> Result<()> {
        self.expect_view(View::Summary, "return to the dashboard")?;
        self.transition(View::Dashboard);
        Ok(())
    }

    /// Destroy everything: stored record, brief, tasks, interview
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear()?;
        self.session = Session::default();
        self.interview = None;
        self.close_current();
        self.autosave.mark_flushed();
        self.transition(View::Idle);
        tracing::info!("Workspace reset");
        Ok(())
    }

    /// Flush pending edits before shutdown
    pub fn close(&mut self) -> Result<()> {
        if self.autosave.is_dirty() {
            self.flush()?;
        }
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "Failed to flush session on shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDescriptor;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn plan(n: usize) -> Vec<MicroTask> {
        (0..n)
            .map(|i| {
                TaskDescriptor {
                    title: format!("Task {}", i),
                    description: String::new(),
                    estimated_minutes: 10,
                    agent_type: "Writer".to_string(),
                }
                .into_task()
            })
            .collect()
    }

    fn dashboard_with_plan(n: usize) -> Workspace {
        let mut ws = Workspace::open(SessionStore::open_in_memory().unwrap(), DEBOUNCE).unwrap();
        ws.initiate().unwrap();
        ws.complete_interview(ProjectDna::fallback("transcript")).unwrap();
        ws.install_plan(plan(n)).unwrap();
        ws
    }

    fn id(ws: &Workspace, i: usize) -> String {
        ws.tasks()[i].id.clone()
    }

    fn assert_single_in_progress(ws: &Workspace) {
        let in_progress: Vec<&MicroTask> = ws
            .tasks()
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .collect();
        assert!(in_progress.len() <= 1);
        if let Some(task) = in_progress.first() {
            assert_eq!(ws.current_task_id(), Some(task.id.as_str()));
        }
    }

    fn stored(ws: &Workspace) -> Session {
        ws.store.load().unwrap().unwrap()
    }

    #[test]
    fn test_fresh_workspace_is_idle() {
        let ws = Workspace::open(SessionStore::open_in_memory().unwrap(), DEBOUNCE).unwrap();
        assert_eq!(ws.view(), View::Idle);
        assert!(ws.tasks().is_empty());
    }

    #[test]
    fn test_onboarding_flow() {
        let mut ws = Workspace::open(SessionStore::open_in_memory().unwrap(), DEBOUNCE).unwrap();
        ws.initiate().unwrap();
        assert_eq!(ws.view(), View::DnaExtraction);
        assert!(ws.interview().is_some());

        ws.complete_interview(ProjectDna::fallback("ctx")).unwrap();
        assert_eq!(ws.view(), View::Dashboard);
        assert!(ws.interview().is_none());
        assert_eq!(stored(&ws).dna.unwrap().raw_context, "ctx");
    }

    #[test]
    fn test_invalid_transitions_leave_state_alone() {
        let mut ws = Workspace::open(SessionStore::open_in_memory().unwrap(), DEBOUNCE).unwrap();
        assert!(matches!(
            ws.complete_interview(ProjectDna::default()),
            Err(WorkspaceError::InvalidTransition { from: View::Idle, .. })
        ));
        assert!(ws.exit_task().is_err());
        assert!(ws.install_plan(plan(2)).is_err());
        assert_eq!(ws.view(), View::Idle);
    }

    #[test]
    fn test_select_without_content_needs_draft() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);

        let opened = ws.select_task(&first).unwrap();
        assert!(opened.needs_draft);
        assert!(!opened.read_only);
        assert_eq!(ws.view(), View::Working);
        assert_eq!(ws.current_task().unwrap().status, TaskStatus::Drafting);
        assert_single_in_progress(&ws);

        assert_eq!(ws.apply_draft(&first, "# Draft").unwrap(), DraftOutcome::Applied);
        assert_eq!(ws.current_task().unwrap().status, TaskStatus::InProgress);
        assert_eq!(ws.buffer(), "# Draft");
        assert_single_in_progress(&ws);
    }

    #[test]
    fn test_reopening_while_draft_in_flight_does_not_request_again() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);

        assert!(ws.select_task(&first).unwrap().needs_draft);
        ws.exit_task().unwrap();
        assert_eq!(ws.task(&first).unwrap().status, TaskStatus::Drafting);

        assert!(!ws.select_task(&first).unwrap().needs_draft);
    }

    #[test]
    fn test_late_draft_goes_to_its_own_task() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);
        let second = id(&ws, 1);

        ws.select_task(&first).unwrap();
        ws.exit_task().unwrap();
        ws.select_task(&second).unwrap();

        assert_eq!(ws.apply_draft(&first, "late").unwrap(), DraftOutcome::Applied);
        assert_eq!(ws.task(&first).unwrap().status, TaskStatus::Ready);
        assert_eq!(ws.task(&first).unwrap().content.as_deref(), Some("late"));
        assert_eq!(ws.buffer(), "");
        assert_single_in_progress(&ws);
    }

    #[test]
    fn test_draft_never_overwrites_typed_text() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);
        let now = Instant::now();

        ws.select_task(&first).unwrap();
        ws.edit(now, |buf| buf.push_str("my own words")).unwrap();

        assert_eq!(ws.apply_draft(&first, "AI words").unwrap(), DraftOutcome::Discarded);
        assert_eq!(ws.buffer(), "my own words");
        assert_eq!(ws.current_task().unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn test_at_most_one_in_progress_across_navigation() {
        let mut ws = dashboard_with_plan(5);
        for i in 0..5 {
            let task_id = id(&ws, i);
            ws.select_task(&task_id).unwrap();
            ws.apply_draft(&task_id, &format!("draft {}", i)).unwrap();
            assert_single_in_progress(&ws);
            ws.exit_task().unwrap();
            assert_single_in_progress(&ws);
        }
        for i in [3, 1, 4] {
            let task_id = id(&ws, i);
            ws.select_task(&task_id).unwrap();
            assert_eq!(ws.current_task().unwrap().status, TaskStatus::InProgress);
            assert_single_in_progress(&ws);
            ws.exit_task().unwrap();
        }
        assert!(ws.tasks().iter().all(|t| t.status == TaskStatus::Ready));
    }

    #[test]
    fn test_autosave_waits_for_debounce() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);
        let start = Instant::now();

        ws.select_task(&first).unwrap();
        ws.apply_draft(&first, "v1").unwrap();
        ws.edit(start, |buf| buf.push_str(" edited")).unwrap();

        assert!(!ws.tick(start + Duration::from_millis(100)).unwrap());
        assert_eq!(stored(&ws).task(&first).unwrap().content.as_deref(), Some("v1"));

        // Another edit pushes the deadline out
        ws.edit(start + Duration::from_millis(400), |buf| buf.push('!')).unwrap();
        assert!(!ws.tick(start + Duration::from_millis(600)).unwrap());

        assert!(ws.tick(start + Duration::from_millis(900)).unwrap());
        assert_eq!(stored(&ws).task(&first).unwrap().content.as_deref(), Some("v1 edited!"));
        assert!(!ws.is_dirty());
    }

    #[test]
    fn test_exit_flushes_synchronously() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);

        ws.select_task(&first).unwrap();
        ws.apply_draft(&first, "draft").unwrap();
        ws.edit(Instant::now(), |buf| *buf = "rewritten".to_string()).unwrap();
        ws.exit_task().unwrap();

        assert_eq!(ws.view(), View::Dashboard);
        let saved = stored(&ws);
        let task = saved.task(&first).unwrap();
        assert_eq!(task.content.as_deref(), Some("rewritten"));
        assert_eq!(task.status, TaskStatus::Ready);
    }

    #[test]
    fn test_exit_with_text_typed_during_pending_draft() {
        let mut ws = dashboard_with_plan(3);
        let first = id(&ws, 0);

        assert!(ws.select_task(&first).unwrap().needs_draft);
        ws.edit(Instant::now(), |buf| buf.push_str("started before the draft")).unwrap();
        ws.exit_task().unwrap();

        let task = ws.task(&first).unwrap();
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(task.content.as_deref(), Some("started before the draft"));
        assert_eq!(
            stored(&ws).task(&first).unwrap().content.as_deref(),
            Some("started before the draft")
        );

        // The draft landing afterwards leaves the text alone
        assert_eq!(ws.apply_draft(&first, "AI draft").unwrap(), DraftOutcome::Discarded);
        assert_eq!(ws.task(&first).unwrap().content.as_deref(), Some("started before the draft"));
    }

    #[test]
    fn test_plan_cannot_replace_worked_tasks() {
        let mut ws = dashboard_with_plan(2);
        assert!(ws.plan_replaceable());
        ws.install_plan(plan(3)).unwrap();
        assert_eq!(ws.tasks().len(), 3);

        let first = id(&ws, 0);
        ws.select_task(&first).unwrap();
        ws.apply_draft(&first, "AI draft").unwrap();
        ws.edit(Instant::now(), |buf| buf.push_str(" + my paragraph")).unwrap();
        ws.exit_task().unwrap();

        assert!(!ws.plan_replaceable());
        assert!(matches!(ws.install_plan(plan(2)), Err(WorkspaceError::PlanInUse)));
        assert_eq!(ws.tasks().len(), 3);
        assert_eq!(ws.task(&first).unwrap().content.as_deref(), Some("AI draft + my paragraph"));
        assert_eq!(stored(&ws).tasks.len(), 3);
    }

    #[test]
    fn test_chat_alone_blocks_plan_replacement() {
        let mut ws = dashboard_with_plan(2);
        let first = id(&ws, 0);
        ws.append_chat(&first, ChatMessage::user("where do I start?")).unwrap();
        assert!(matches!(ws.install_plan(plan(2)), Err(WorkspaceError::PlanInUse)));
    }

    #[test]
    fn test_complete_locks_task_and_reaches_summary() {
        let mut ws = dashboard_with_plan(2);
        let first = id(&ws, 0);
        let second = id(&ws, 1);

        ws.select_task(&first).unwrap();
        ws.edit(Instant::now(), |buf| buf.push_str("final text")).unwrap();
        assert_eq!(ws.complete_task().unwrap(), View::Dashboard);

        let task = ws.task(&first).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.verification_status, VerificationStatus::Approved);
        assert_eq!(task.content.as_deref(), Some("final text"));

        // Reopened completed tasks are read-only
        let opened = ws.select_task(&first).unwrap();
        assert!(opened.read_only);
        assert!(matches!(
            ws.edit(Instant::now(), |b| b.push('x')),
            Err(WorkspaceError::TaskLocked(_))
        ));
        assert!(matches!(ws.complete_task(), Err(WorkspaceError::TaskLocked(_))));
        ws.exit_task().unwrap();
        assert_eq!(ws.task(&first).unwrap().status, TaskStatus::Completed);

        ws.select_task(&second).unwrap();
        ws.apply_draft(&second, "done").unwrap();
        assert_eq!(ws.complete_task().unwrap(), View::Summary);
        assert_eq!(ws.progress(), (2, 2));

        ws.back_to_dashboard().unwrap();
        ws.show_summary().unwrap();
        assert_eq!(ws.view(), View::Summary);
    }

    #[test]
    fn test_summary_requires_all_complete() {
        let mut ws = dashboard_with_plan(3);
        assert!(ws.show_summary().is_err());
        assert_eq!(ws.view(), View::Dashboard);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);
        ws.select_task(&first).unwrap();
        ws.edit(Instant::now(), |buf| buf.push_str("unsaved")).unwrap();

        ws.reset().unwrap();
        assert_eq!(ws.view(), View::Idle);
        assert!(ws.tasks().is_empty());
        assert!(ws.dna().is_none());
        assert!(ws.current_task_id().is_none());
        assert!(!ws.is_dirty());
        assert!(ws.store.load().unwrap().is_none());
    }

    #[test]
    fn test_restore_demotes_open_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");
        let (first, second) = {
            let mut ws = Workspace::open(SessionStore::open(&path).unwrap(), DEBOUNCE).unwrap();
            ws.initiate().unwrap();
            ws.complete_interview(ProjectDna::fallback("ctx")).unwrap();
            ws.install_plan(plan(4)).unwrap();
            let first = id(&ws, 0);
            let second = id(&ws, 1);
            ws.select_task(&second).unwrap();
            ws.exit_task().unwrap();
            ws.select_task(&first).unwrap();
            ws.apply_draft(&first, "draft").unwrap();
            ws.edit(Instant::now(), |buf| buf.push_str(" plus unsaved")).unwrap();
            (first, second)
            // dropped while Working and dirty
        };

        let ws = Workspace::open(SessionStore::open(&path).unwrap(), DEBOUNCE).unwrap();
        assert_eq!(ws.view(), View::Dashboard);
        assert!(ws.current_task_id().is_none());
        let task = ws.task(&first).unwrap();
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(task.content.as_deref(), Some("draft plus unsaved"));
        assert_eq!(ws.task(&second).unwrap().status, TaskStatus::Pending);
        assert_single_in_progress(&ws);
    }

    #[test]
    fn test_chat_and_verification_are_persisted() {
        let mut ws = dashboard_with_plan(4);
        let first = id(&ws, 0);

        ws.append_chat(&first, ChatMessage::user("hi")).unwrap();
        ws.set_verification(&first, VerificationStatus::NeedsRevision).unwrap();
        ws.set_visual(&first, "graph TD; A-->B".to_string()).unwrap();

        let saved = stored(&ws);
        let task = saved.task(&first).unwrap();
        assert_eq!(task.chat_history.len(), 1);
        assert_eq!(task.verification_status, VerificationStatus::NeedsRevision);
        assert!(task.visual_code.is_some());

        assert!(matches!(
            ws.append_chat("missing", ChatMessage::user("x")),
            Err(WorkspaceError::UnknownTask(_))
        ));
    }

    #[test]
    fn test_update_dna_requires_brief() {
        let mut ws = Workspace::open(SessionStore::open_in_memory().unwrap(), DEBOUNCE).unwrap();
        assert!(matches!(ws.update_dna(DnaField::Tone, "dry"), Err(WorkspaceError::MissingDna)));

        let mut ws = dashboard_with_plan(4);
        ws.update_dna(DnaField::Tone, "  dry  ").unwrap();
        assert_eq!(ws.dna().unwrap().tone, "dry");
        assert_eq!(stored(&ws).dna.unwrap().tone, "dry");
    }
}
