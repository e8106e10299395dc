use std::time::{Duration, Instant};

/// Debounced write-back: a dirty flag plus the instant a flush is due.
///
/// Every edit pushes the deadline out by the debounce delay, so a flush
/// happens once typing pauses. The owner polls [`Autosave::is_due`] on its
/// tick and calls [`Autosave::mark_flushed`] after writing.
#[derive(Debug, Clone)]
pub struct Autosave {
    debounce: Duration,
    dirty: bool,
    due_at: Option<Instant>,
}

impl Autosave {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            dirty: false,
            due_at: None,
        }
    }

    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        self.due_at = Some(now + self.debounce);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty && self.due_at.is_some_and(|due| now >= due)
    }

    pub fn mark_flushed(&mut self) {
        self.dirty = false;
        self.due_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_due_before_debounce() {
        let start = Instant::now();
        let mut autosave = Autosave::new(Duration::from_millis(500));
        autosave.mark_dirty(start);

        assert!(autosave.is_dirty());
        assert!(!autosave.is_due(start + Duration::from_millis(499)));
        assert!(autosave.is_due(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_edit_pushes_deadline_out() {
        let start = Instant::now();
        let mut autosave = Autosave::new(Duration::from_millis(500));
        autosave.mark_dirty(start);
        autosave.mark_dirty(start + Duration::from_millis(400));

        assert!(!autosave.is_due(start + Duration::from_millis(600)));
        assert!(autosave.is_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_clean_is_never_due() {
        let start = Instant::now();
        let mut autosave = Autosave::new(Duration::from_millis(10));
        assert!(!autosave.is_due(start + Duration::from_secs(60)));

        autosave.mark_dirty(start);
        autosave.mark_flushed();
        assert!(!autosave.is_dirty());
        assert!(!autosave.is_due(start + Duration::from_secs(60)));
    }
}
