//! Session state keyed by session id.

use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    larkbot_common::types::{ChatMessage, Resolution, Role},
    tracing::debug,
};

use crate::Result;

/// Conversation state shared by the action chain and the card callback
/// dispatcher.
///
/// Implementations must tolerate concurrent callers on the same and on
/// different sessions. Touching an unknown session creates it lazily.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Drop all state for the session: history, persona and resolution.
    async fn clear(&self, session_id: &str) -> Result<()>;

    /// Stored image resolution, `None` when the session never picked one.
    async fn resolution(&self, session_id: &str) -> Result<Option<Resolution>>;

    async fn set_resolution(&self, session_id: &str, resolution: Resolution) -> Result<()>;

    /// Conversation history, persona system message first when present.
    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>>;

    async fn append_history(&self, session_id: &str, messages: Vec<ChatMessage>) -> Result<()>;

    /// Install `prompt` as the session's system message, replacing any
    /// previous persona.
    async fn set_persona(&self, session_id: &str, prompt: &str) -> Result<()>;

    /// Remove sessions idle past the configured TTL. Returns how many were
    /// dropped.
    async fn purge_expired(&self) -> Result<usize>;
}

/// Expiry and history bounds for [`MemorySessionCache`].
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// `None` disables expiry.
    pub idle_ttl: Option<Duration>,
    /// Upper bound on stored messages, system message included.
    pub max_history: usize,
}

impl SessionPolicy {
    /// Build from raw config values; `0` seconds disables expiry.
    pub fn from_secs(idle_ttl_secs: u64, max_history: usize) -> Self {
        Self {
            idle_ttl: (idle_ttl_secs > 0).then(|| Duration::from_secs(idle_ttl_secs)),
            max_history,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_secs(12 * 60 * 60, 40)
    }
}

#[derive(Debug)]
struct SessionState {
    history: Vec<ChatMessage>,
    resolution: Option<Resolution>,
    touched_at: Instant,
}

impl SessionState {
    fn new(now: Instant) -> Self {
        Self {
            history: Vec::new(),
            resolution: None,
            touched_at: now,
        }
    }

    /// Drop the oldest exchanges until `max` is respected. A user turn goes
    /// together with the assistant turn answering it, so history never starts
    /// with an orphaned answer.
    fn trim(&mut self, max: usize) {
        while self.history.len() > max {
            let Some(idx) = self.history.iter().position(|m| m.role != Role::System) else {
                self.history.remove(0);
                continue;
            };
            let removed = self.history.remove(idx);
            if removed.role == Role::User
                && self.history.get(idx).is_some_and(|m| m.role == Role::Assistant)
            {
                self.history.remove(idx);
            }
        }
    }
}

/// In-memory [`SessionCache`] backed by a sharded `DashMap`.
pub struct MemorySessionCache {
    sessions: DashMap<String, SessionState>,
    policy: SessionPolicy,
}

impl Default for MemorySessionCache {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

impl MemorySessionCache {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            sessions: DashMap::new(),
            policy,
        }
    }

    /// Number of live (possibly expired but not yet purged) sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, state: &SessionState, now: Instant) -> bool {
        self.policy
            .idle_ttl
            .is_some_and(|ttl| now.saturating_duration_since(state.touched_at) >= ttl)
    }

    /// Read a session without creating it. Expired sessions are dropped and
    /// read as empty.
    fn read<R>(&self, session_id: &str, now: Instant, f: impl FnOnce(&SessionState) -> R) -> Option<R> {
        {
            let state = self.sessions.get(session_id)?;
            if !self.is_expired(&state, now) {
                return Some(f(&state));
            }
        }
        // The read guard must be released before removing.
        debug!(session_id, "session expired");
        self.sessions
            .remove_if(session_id, |_, state| self.is_expired(state, now));
        None
    }

    /// Mutate a session, creating it (or resetting an expired one) first.
    fn write<R>(&self, session_id: &str, now: Instant, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(now));
        if self.is_expired(&entry, now) {
            debug!(session_id, "session expired, starting fresh");
            *entry = SessionState::new(now);
        }
        entry.touched_at = now;
        f(&mut entry)
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, state| !self.is_expired(state, now));
        before.saturating_sub(self.sessions.len())
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn clear(&self, session_id: &str) -> Result<()> {
        self.sessions.remove(session_id);
        Ok(())
    }

    async fn resolution(&self, session_id: &str) -> Result<Option<Resolution>> {
        Ok(self
            .read(session_id, Instant::now(), |s| s.resolution)
            .flatten())
    }

    async fn set_resolution(&self, session_id: &str, resolution: Resolution) -> Result<()> {
        self.write(session_id, Instant::now(), |s| s.resolution = Some(resolution));
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self
            .read(session_id, Instant::now(), |s| s.history.clone())
            .unwrap_or_default())
    }

    async fn append_history(&self, session_id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        let max = self.policy.max_history;
        self.write(session_id, Instant::now(), |s| {
            s.history.extend(messages);
            s.trim(max);
        });
        Ok(())
    }

    async fn set_persona(&self, session_id: &str, prompt: &str) -> Result<()> {
        let max = self.policy.max_history;
        self.write(session_id, Instant::now(), |s| {
            s.history.retain(|m| m.role != Role::System);
            s.history.insert(0, ChatMessage::system(prompt));
            s.trim(max);
        });
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(self.purge_expired_at(Instant::now()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> MemorySessionCache {
        MemorySessionCache::new(SessionPolicy::from_secs(60, 4))
    }

    #[tokio::test]
    async fn unknown_session_reads_empty() {
        let cache = cache();
        assert!(cache.history("s1").await.unwrap().is_empty());
        assert_eq!(cache.resolution("s1").await.unwrap(), None);
        assert!(cache.is_empty(), "reads must not create sessions");
    }

    #[tokio::test]
    async fn resolution_and_history_are_independent() {
        let cache = cache();
        cache.set_resolution("s1", Resolution::Medium).await.unwrap();
        cache
            .append_history("s1", vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")])
            .await
            .unwrap();

        assert_eq!(cache.resolution("s1").await.unwrap(), Some(Resolution::Medium));
        assert_eq!(cache.history("s1").await.unwrap().len(), 2);
        assert_eq!(cache.resolution("s2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = cache();
        cache.set_resolution("s1", Resolution::Large).await.unwrap();
        cache.append_history("s1", vec![ChatMessage::user("q")]).await.unwrap();
        cache.clear("s1").await.unwrap();

        assert!(cache.history("s1").await.unwrap().is_empty());
        assert_eq!(cache.resolution("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn persona_replaces_previous_system_message() {
        let cache = cache();
        cache.set_persona("s1", "you are a pirate").await.unwrap();
        cache.append_history("s1", vec![ChatMessage::user("ahoy")]).await.unwrap();
        cache.set_persona("s1", "you are a poet").await.unwrap();

        let history = cache.history("s1").await.unwrap();
        assert_eq!(history[0], ChatMessage::system("you are a poet"));
        assert_eq!(history.iter().filter(|m| m.role == Role::System).count(), 1);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn trimming_keeps_system_message() {
        let cache = cache();
        cache.set_persona("s1", "persona").await.unwrap();
        for i in 0..3 {
            cache
                .append_history("s1", vec![
                    ChatMessage::user(format!("q{i}")),
                    ChatMessage::assistant(format!("a{i}")),
                ])
                .await
                .unwrap();
        }

        let history = cache.history("s1").await.unwrap();
        assert_eq!(history, vec![
            ChatMessage::system("persona"),
            ChatMessage::user("q2"),
            ChatMessage::assistant("a2"),
        ]);
    }

    #[tokio::test]
    async fn trimming_drops_whole_exchanges() {
        let cache = cache();
        for i in 0..3 {
            cache
                .append_history("s1", vec![
                    ChatMessage::user(format!("q{i}")),
                    ChatMessage::assistant(format!("a{i}")),
                ])
                .await
                .unwrap();
        }

        let history = cache.history("s1").await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], ChatMessage::user("q1"));
        assert_eq!(history[3], ChatMessage::assistant("a2"));
    }

    #[test]
    fn expired_sessions_read_empty_and_reset_on_write() {
        let cache = cache();
        let start = Instant::now();
        cache.write("s1", start, |s| s.history.push(ChatMessage::user("old")));

        let later = start + Duration::from_secs(61);
        assert!(cache.read("s1", later, |s| s.history.len()).is_none());
        assert!(cache.is_empty());

        cache.write("s1", start, |s| s.history.push(ChatMessage::user("old")));
        let len = cache.write("s1", later, |s| {
            s.history.push(ChatMessage::user("new"));
            s.history.len()
        });
        assert_eq!(len, 1);
    }

    #[test]
    fn purge_drops_only_idle_sessions() {
        let cache = cache();
        let start = Instant::now();
        cache.write("idle", start, |_| ());
        cache.write("busy", start + Duration::from_secs(30), |_| ());

        assert_eq!(cache.purge_expired_at(start + Duration::from_secs(70)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.read("busy", start + Duration::from_secs(70), |_| ()).is_some());
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let cache = MemorySessionCache::new(SessionPolicy::from_secs(0, 10));
        let start = Instant::now();
        cache.write("s1", start, |_| ());
        assert_eq!(cache.purge_expired_at(start + Duration::from_secs(86_400 * 365)), 0);
    }
}
