//! Flame alarm rate limiting.
//!
//! While the flame sensor reports fire the controller raises an alarm,
//! then stays quiet for a cooldown window so a persistent detection does
//! not flood the log (or whatever sink forwards alarms) every cycle.

#[derive(Debug, Clone)]
pub struct FlameAlarm {
    cooldown_ms: u64,
    last_raised_ms: Option<u64>,
}

impl FlameAlarm {
    pub fn new(cooldown_secs: u32) -> Self {
        Self {
            cooldown_ms: u64::from(cooldown_secs) * 1_000,
            last_raised_ms: None,
        }
    }

    /// Feed one observation.  Returns `true` when an alarm should be raised.
    pub fn observe(&mut self, detected: bool, now_ms: u64) -> bool {
        if !detected {
            return false;
        }
        let due = match self.last_raised_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown_ms,
        };
        if due {
            self.last_raised_ms = Some(now_ms);
        }
        due
    }
}
