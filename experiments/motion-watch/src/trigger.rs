use std::time::{Duration, Instant};

/// Turns per-frame motion flags into recording triggers.
///
/// Motion fires the trigger, then further motion is ignored until the
/// cooldown has passed.
#[derive(Debug, Clone)]
pub struct Trigger {
    cooldown: Duration,
    cooldown_until: Option<Instant>,
}

impl Trigger {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            cooldown_until: None,
        }
    }

    /// Feed one detection result observed at `now`. Returns true when a
    /// recording should be started.
    pub fn update(&mut self, motion: bool, now: Instant) -> bool {
        if let Some(until) = self.cooldown_until {
            if now < until {
                return false;
            }
            self.cooldown_until = None;
        }
        if !motion {
            return false;
        }
        self.cooldown_until = Some(now + self.cooldown);
        true
    }

    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }
}
