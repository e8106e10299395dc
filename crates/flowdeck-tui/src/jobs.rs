//! Background collaborator calls. Each job runs on its own tokio task and is
//! collected on the tick; only the UI task touches the workspace.

use std::future::Future;

use flowdeck_core::{ChatMessage, MicroTask, PlanError, ProjectDna};
use tokio::task::JoinHandle;

/// What a job is for. Task-scoped jobs carry the task id they were started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    Question,
    Dna,
    Plan,
    Draft(String),
    Chat(String),
    Intervention(String),
    Visual(String),
}

#[derive(Debug)]
pub enum JobOutput {
    Question(anyhow::Result<String>),
    Dna(ProjectDna),
    Plan(Result<Vec<MicroTask>, PlanError>),
    Draft { task_id: String, text: String },
    Chat { task_id: String, reply: ChatMessage },
    Intervention { task_id: String, critique: Option<String> },
    Visual { task_id: String, source: Option<String> },
}

#[derive(Default)]
pub struct Jobs {
    running: Vec<(JobKind, JoinHandle<JobOutput>)>,
}

impl Jobs {
    pub fn spawn<F>(&mut self, kind: JobKind, job: F)
    where
        F: Future<Output = JobOutput> + Send + 'static,
    {
        tracing::debug!(job = ?kind, "Job started");
        self.running.push((kind, tokio::spawn(job)));
    }

    pub fn is_running(&self, kind: &JobKind) -> bool {
        self.running.iter().any(|(k, _)| k == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Take the output of every finished job, in start order
    pub async fn collect_finished(&mut self) -> Vec<JobOutput> {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.running.len() {
            if !self.running[i].1.is_finished() {
                i += 1;
                continue;
            }
            let (kind, handle) = self.running.remove(i);
            match handle.await {
                Ok(output) => finished.push(output),
                Err(e) => tracing::error!(job = ?kind, error = %e, "Job panicked"),
            }
        }
        finished
    }

    /// Drop every in-flight job; their results are never applied
    pub fn abort_all(&mut self) {
        for (_, handle) in self.running.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collects_only_finished_jobs() {
        let mut jobs = Jobs::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        jobs.spawn(JobKind::Question, async { JobOutput::Question(Ok("Why?".to_string())) });
        jobs.spawn(JobKind::Draft("t1".to_string()), async move {
            let _ = rx.await;
            JobOutput::Draft { task_id: "t1".to_string(), text: "late".to_string() }
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let done = jobs.collect_finished().await;
        assert_eq!(done.len(), 1);
        assert!(matches!(&done[0], JobOutput::Question(Ok(q)) if q == "Why?"));
        assert!(jobs.is_running(&JobKind::Draft("t1".to_string())));
        assert!(!jobs.is_running(&JobKind::Draft("t2".to_string())));

        tx.send(()).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(jobs.collect_finished().await.len(), 1);
        assert!(jobs.is_empty());
    }
}
