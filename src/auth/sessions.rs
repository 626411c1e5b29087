use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: u32,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Opaque bearer tokens mapped to user ids, kept in process memory.
#[derive(Debug)]
pub struct Sessions {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new(24)
    }
}

impl Sessions {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            ttl: Duration::hours(ttl_hours),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self, user_id: u32) -> Session {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        session
    }

    /// Live session for `token`; expired ones are dropped on the way.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        let session = self.sessions.read().await.get(token).cloned()?;
        if session.is_expired(now) {
            self.sessions.write().await.remove(token);
            return None;
        }
        Some(session)
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn cleanup_expired(&self) {
        let now = Utc::now();
        self.sessions
            .write()
            .await
            .retain(|_, session| !session.is_expired(now));
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops expired sessions every `every`, whether or not anything else runs.
    pub fn spawn_sweeper(sessions: Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                sessions.cleanup_expired().await;
                let live = sessions.len().await;
                debug!(live, "swept expired sessions");
            }
        })
    }
}
