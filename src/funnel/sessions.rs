//! Session store: one in-memory flow per visitor, pruned when idle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::countdown::Countdown;
use super::flow::{FunnelDeps, FunnelFlow, StageName};
use super::view::StageView;
use crate::error::FunnelError;

/// How often idle sessions are swept.
const EXPIRY_INTERVAL: Duration = Duration::from_secs(60);

struct Session {
    flow: FunnelFlow,
    last_seen: Instant,
}

/// All live flows, keyed by session id.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    deps: FunnelDeps,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(deps: FunnelDeps, idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            deps,
            idle_timeout,
        })
    }

    /// Start a new flow. The session id doubles as the analytics client id.
    pub async fn create(&self) -> (Uuid, StageView) {
        let id = Uuid::new_v4();
        let flow = FunnelFlow::start(self.deps.clone(), id);
        let view = StageView::of(&flow);

        self.sessions.write().await.insert(
            id,
            Session {
                flow,
                last_seen: Instant::now(),
            },
        );
        info!(session_id = %id, "Session created");
        (id, view)
    }

    /// Run `f` against a session's flow and mark the session active.
    pub async fn with_flow<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut FunnelFlow) -> Result<T, FunnelError>,
    ) -> Result<T, FunnelError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(FunnelError::SessionNotFound { id })?;
        session.last_seen = Instant::now();
        f(&mut session.flow)
    }

    pub async fn view(&self, id: Uuid) -> Result<StageView, FunnelError> {
        self.with_flow(id, |flow| Ok(StageView::of(flow))).await
    }

    /// Subscribe to the countdown of a session's mounted offer.
    pub async fn countdown_updates(
        &self,
        id: Uuid,
    ) -> Result<watch::Receiver<Countdown>, FunnelError> {
        self.with_flow(id, |flow| {
            flow.countdown_updates()
                .ok_or_else(|| FunnelError::WrongStage {
                    expected: StageName::Offer.to_string(),
                    actual: flow.stage_name().to_string(),
                })
        })
        .await
    }

    /// Drop a session. An offer it holds is unmounted with it.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle longer than the timeout. Returns how many went.
    pub async fn expire_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, session| {
            let keep = now.duration_since(session.last_seen) < self.idle_timeout;
            if !keep {
                debug!(session_id = %id, stage = %session.flow.stage_name(), "Session expired");
            }
            keep
        });

        let expired = before - sessions.len();
        if expired > 0 {
            info!(count = expired, "Expired idle sessions");
        }
        expired
    }
}

/// Spawn a background task that periodically prunes idle sessions.
pub fn spawn_expiry_task(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EXPIRY_INTERVAL);
        loop {
            interval.tick().await;
            store.expire_idle().await;
        }
    })
}
