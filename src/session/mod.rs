//! In-memory conversation sessions.
//!
//! Each session owns its turn history behind a tokio mutex, so two requests
//! for the same session id run one after the other while different sessions
//! proceed in parallel. Idle sessions are evicted after a TTL.

use crate::models::ChatTurn;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Mutable state of one conversation.
#[derive(Debug, Default)]
pub struct SessionState {
    turns: Vec<ChatTurn>,
    last_active: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }
}

pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        SessionStore {
            sessions: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Lock a session for exclusive use, creating it if it does not exist.
    ///
    /// The returned guard serializes concurrent requests on the same id.
    /// Callers hold it for the whole agent run so the history they read is
    /// the history they append to.
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<SessionState> {
        self.sweep_expired();

        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                log::info!("[SESSION] Creating session {}", session_id);
                Arc::new(Mutex::new(SessionState::default()))
            })
            .clone();

        let mut guard = entry.lock_owned().await;
        guard.last_active = Some(Utc::now());
        guard
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle past the TTL. Sessions currently locked by a
    /// running request are skipped.
    fn sweep_expired(&self) {
        let cutoff = Utc::now() - self.ttl;
        self.sessions.retain(|id, state| {
            let Ok(guard) = state.try_lock() else {
                return true;
            };
            match guard.last_active {
                Some(last) if last < cutoff => {
                    log::info!("[SESSION] Evicting idle session {}", id);
                    false
                }
                _ => true,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(session_id: &str, message: &str) -> ChatTurn {
        ChatTurn {
            session_id: session_id.to_string(),
            user_message: message.to_string(),
            assistant_message: "ok".to_string(),
            tool_used: None,
            payload: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_acquire_creates_session_lazily() {
        let store = SessionStore::new(3600);
        assert_eq!(store.session_count(), 0);

        let guard = store.acquire("s1").await;
        assert_eq!(guard.turn_count(), 0);
        drop(guard);
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_turns_persist_across_acquisitions() {
        let store = SessionStore::new(3600);

        {
            let mut guard = store.acquire("s1").await;
            guard.push_turn(turn("s1", "first"));
            guard.push_turn(turn("s1", "second"));
        }

        let guard = store.acquire("s1").await;
        assert_eq!(guard.turn_count(), 2);
        assert_eq!(guard.recent_turns(1)[0].user_message, "second");
    }

    #[tokio::test]
    async fn test_recent_turns_window() {
        let store = SessionStore::new(3600);
        let mut guard = store.acquire("s1").await;
        for i in 0..5 {
            guard.push_turn(turn("s1", &format!("m{}", i)));
        }
        let recent = guard.recent_turns(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].user_message, "m2");
        assert_eq!(recent[2].user_message, "m4");
        // Window larger than history returns everything.
        assert_eq!(guard.recent_turns(100).len(), 5);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let store = SessionStore::new(0);

        {
            let mut guard = store.acquire("stale").await;
            // Backdate so the next sweep sees it as idle.
            guard.last_active = Some(Utc::now() - Duration::seconds(10));
        }
        assert_eq!(store.session_count(), 1);

        let _guard = store.acquire("fresh").await;
        assert_eq!(store.session_count(), 1);
        assert!(!store.sessions.contains_key("stale"));
    }

    #[tokio::test]
    async fn test_locked_sessions_survive_sweep() {
        let store = SessionStore::new(0);

        let mut held = store.acquire("busy").await;
        held.last_active = Some(Utc::now() - Duration::seconds(10));

        // A sweep runs here, but "busy" is locked and must be spared.
        let _other = store.acquire("other").await;
        assert!(store.sessions.contains_key("busy"));
    }

    #[tokio::test]
    async fn test_same_session_access_is_serialized() {
        let store = Arc::new(SessionStore::new(3600));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut guard = store.acquire("shared").await;
                let count = guard.turn_count();
                tokio::task::yield_now().await;
                guard.push_turn(ChatTurn {
                    session_id: "shared".to_string(),
                    user_message: format!("m{}", i),
                    assistant_message: "ok".to_string(),
                    tool_used: None,
                    payload: None,
                    created_at: Utc::now(),
                });
                assert_eq!(guard.turn_count(), count + 1);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let guard = store.acquire("shared").await;
        assert_eq!(guard.turn_count(), 8);
    }
}
