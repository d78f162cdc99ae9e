//! Per-host request pacing shared by every fetch of a run
//!
//! Each request reserves the next free slot for its host, so concurrent
//! workers hitting the same host are spaced at least `min_interval` apart.
//! A 429 response pushes the whole host back with [`RateLimiter::defer`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Pacing state for one host
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests made to this host
    pub request_count: u32,

    /// Earliest instant the next request may start
    pub next_slot: Option<Instant>,

    /// Set when the host answered 429
    pub blocked_until: Option<Instant>,
}

impl HostState {
    /// Checks if a request can start at `now`
    pub fn can_request(&self, now: Instant) -> bool {
        self.time_until_next_request(now).is_none()
    }

    /// Returns None if a request can be made now, or the duration to wait otherwise
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let ready_at = self.ready_at(now);
        (ready_at > now).then(|| ready_at - now)
    }

    /// Reserves the next slot and returns when it starts
    fn reserve(&mut self, now: Instant, min_interval: Duration) -> Instant {
        let slot = self.ready_at(now);
        self.next_slot = Some(slot + min_interval);
        self.request_count += 1;
        slot
    }

    fn ready_at(&self, now: Instant) -> Instant {
        [self.next_slot, self.blocked_until]
            .into_iter()
            .flatten()
            .fold(now, Instant::max)
    }
}

/// Shared per-host rate limiter
///
/// The lock is only held while reserving a slot, never across a sleep.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a request to `host` may be sent
    ///
    /// # Returns
    ///
    /// How long the caller was held back
    pub async fn acquire(&self, host: &str) -> Duration {
        let now = Instant::now();
        let slot = {
            let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
            hosts
                .entry(host.to_string())
                .or_default()
                .reserve(now, self.min_interval)
        };

        let wait = slot.saturating_duration_since(now);
        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before next request to {}", wait, host);
            tokio::time::sleep_until(slot).await;
        }
        wait
    }

    /// Holds back every request to `host` for at least `delay` from now
    pub fn defer(&self, host: &str, delay: Duration) {
        let until = Instant::now() + delay;
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        let state = hosts.entry(host.to_string()).or_default();
        state.blocked_until = Some(state.blocked_until.map_or(until, |b| b.max(until)));
        tracing::debug!("Host {} rate limited, deferring {:?}", host, delay);
    }

    /// Number of requests reserved for `host` so far
    pub fn requests_made(&self, host: &str) -> u32 {
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts.get(host).map_or(0, |state| state.request_count)
    }

    /// Snapshot of the pacing state for `host`
    pub fn host_state(&self, host: &str) -> Option<HostState> {
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts.get(host).cloned()
    }
}
