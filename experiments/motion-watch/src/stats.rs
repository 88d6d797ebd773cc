use {
    std::fmt::Write,
    std::time::{Duration, Instant},
};

/// Counters reported in the periodic status and on exit.
#[derive(Debug, Clone)]
pub struct Stats {
    pub started: Instant,
    pub motion_events: u64,
    pub recordings: u64,
    pub last_motion: Option<Instant>,
}

impl Stats {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            motion_events: 0,
            recordings: 0,
            last_motion: None,
        }
    }

    pub fn record_motion(&mut self, now: Instant) {
        self.motion_events += 1;
        self.last_motion = Some(now);
    }

    /// Multi-line status: uptime, counters and time since the last motion.
    pub fn report(&self, now: Instant) -> String {
        let mut report = String::new();
        let uptime = now.saturating_duration_since(self.started);
        let _ = writeln!(report, "uptime: {}", format_duration(uptime));
        let _ = writeln!(report, "motion events: {}", self.motion_events);
        let _ = write!(report, "recordings: {}", self.recordings);
        if let Some(last) = self.last_motion {
            let since = now.saturating_duration_since(last);
            let _ = write!(report, "\nlast motion: {} ago", format_duration(since));
        }
        report
    }
}

/// `H:MM:SS`, whole seconds only.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
