use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// In-memory conversation log, cleared after a period of inactivity.
///
/// Turns are kept for inspection only; answers never depend on them.
#[derive(Debug)]
pub struct Session {
    turns: Vec<Turn>,
    last_active: DateTime<Utc>,
    idle_timeout: Duration,
}

impl Session {
    pub fn new(idle_timeout_secs: u64, now: DateTime<Utc>) -> Self {
        Self {
            turns: Vec::new(),
            last_active: now,
            // Duration::seconds panics past i64::MAX milliseconds
            idle_timeout: Duration::seconds(idle_timeout_secs.min(i64::MAX as u64 / 1000) as i64),
        }
    }

    /// Drop the conversation if nothing was said for longer than the
    /// idle timeout. Returns whether a reset happened.
    pub fn reset_if_idle(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.last_active > self.idle_timeout && !self.turns.is_empty() {
            self.turns.clear();
            return true;
        }
        false
    }

    /// Record a user message; this is what counts as activity.
    pub fn record_user(&mut self, text: &str, now: DateTime<Utc>) {
        self.last_active = now;
        self.turns.push(Turn {
            role: Role::User,
            text: text.to_string(),
            at: now,
        });
    }

    pub fn record_bot(&mut self, text: &str, now: DateTime<Utc>) {
        self.turns.push(Turn {
            role: Role::Bot,
            text: text.to_string(),
            at: now,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }
}
