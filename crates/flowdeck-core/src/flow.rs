use std::time::{Duration, Instant};

pub const MAX_SCORE: f32 = 100.0;
const SCORE_DECAY: f32 = 0.7;
const SCORE_PER_EDIT: f32 = 12.0;
pub const STREAK_IDLE_TIMEOUT: Duration = Duration::from_secs(2);
pub const FLOW_STREAK_THRESHOLD: u32 = 25;

/// Typing-cadence heuristic. Presentation only: nothing else reads it.
#[derive(Debug, Clone)]
pub struct FlowMeter {
    edits_this_second: u32,
    score: f32,
    streak: u32,
    last_edit: Option<Instant>,
    in_flow: bool,
}

impl Default for FlowMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowMeter {
    pub fn new() -> Self {
        Self {
            edits_this_second: 0,
            score: 0.0,
            streak: 0,
            last_edit: None,
            in_flow: false,
        }
    }

    pub fn record_edit(&mut self, now: Instant) {
        let continues = self
            .last_edit
            .is_some_and(|last| now.saturating_duration_since(last) <= STREAK_IDLE_TIMEOUT);
        self.streak = if continues { self.streak + 1 } else { 1 };
        self.last_edit = Some(now);
        self.edits_this_second += 1;
        self.in_flow = self.streak >= FLOW_STREAK_THRESHOLD;
    }

    /// Fold the last second of edits into the score; call once per second
    pub fn sample(&mut self, now: Instant) {
        self.score = (self.score * SCORE_DECAY + self.edits_this_second as f32 * SCORE_PER_EDIT)
            .clamp(0.0, MAX_SCORE);
        self.edits_this_second = 0;

        let idle = self
            .last_edit
            .map_or(true, |last| now.saturating_duration_since(last) > STREAK_IDLE_TIMEOUT);
        if idle {
            self.streak = 0;
            self.in_flow = false;
        }
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn in_flow(&self) -> bool {
        self.in_flow
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
