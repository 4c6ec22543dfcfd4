use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushKind {
    Debounced,
    Immediate,
}

/// Cancel-and-restart timer holding at most one pending payload.
///
/// Scheduling replaces whatever was pending and restarts the delay, so only
/// the most recent payload survives a burst of input.
#[derive(Debug)]
pub struct ScheduledTask<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    payload: T,
    scheduled_at: Instant,
}

impl<T> ScheduledTask<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, payload: T, now: Instant) {
        if self.pending.is_some() {
            tracing::trace!("restarting scheduled task");
        }
        self.pending = Some(Pending {
            payload,
            scheduled_at: now,
        });
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref().map(|pending| {
            (pending.scheduled_at + self.delay).saturating_duration_since(now)
        })
    }

    /// Take the payload once the delay has elapsed since it was scheduled.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        self.take(now, FlushKind::Debounced)
    }

    /// Take the payload right away, ignoring the delay.
    pub fn flush(&mut self) -> Option<T> {
        self.take(Instant::now(), FlushKind::Immediate)
    }

    fn take(&mut self, now: Instant, mode: FlushKind) -> Option<T> {
        let pending = self.pending.as_ref()?;
        if mode == FlushKind::Debounced
            && now.saturating_duration_since(pending.scheduled_at) < self.delay
        {
            return None;
        }
        self.pending.take().map(|pending| pending.payload)
    }
}
