//! One payslip view per employee, created on first visit

use payslip_portal_core::{
    ActionExecutorRef, CoreResult, FixedUser, PortalPayslipView, PortalState, RecordServiceRef,
    ViewSettings,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};
use tokio::time::Instant;

/// A user's view plus its one-time initialization
pub struct PortalSession {
    view: PortalPayslipView,
    ready: OnceCell<()>,
    last_used: Mutex<Instant>,
}

impl PortalSession {
    pub fn view(&self) -> &PortalPayslipView {
        &self.view
    }

    async fn ensure_ready(&self) -> CoreResult<()> {
        self.ready
            .get_or_try_init(|| self.view.initialize())
            .await
            .map(|_| ())
    }

    fn touch(&self) {
        *self.last_used.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn is_idle(&self, idle_timeout: Option<Duration>) -> bool {
        match idle_timeout {
            Some(limit) => {
                let last_used = *self.last_used.lock().unwrap_or_else(|e| e.into_inner());
                last_used.elapsed() > limit
            }
            None => false,
        }
    }
}

pub struct SessionRegistry {
    service: RecordServiceRef,
    executor: ActionExecutorRef,
    settings: ViewSettings,
    idle_timeout: Option<Duration>,
    sessions: RwLock<HashMap<i64, Arc<PortalSession>>>,
}

impl SessionRegistry {
    /// Sessions idle longer than `idle_timeout` are dropped when a new one
    /// is opened; `None` keeps them until reset
    pub fn new(
        service: RecordServiceRef,
        executor: ActionExecutorRef,
        settings: ViewSettings,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            service,
            executor,
            settings,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The initialized session of `user_id`.
    ///
    /// Concurrent first requests share one initialization; a failed one is
    /// retried by the next request.
    pub async fn get(&self, user_id: i64) -> CoreResult<Arc<PortalSession>> {
        let session = self.get_or_insert(user_id).await;
        session.touch();
        session.ensure_ready().await?;
        Ok(session)
    }

    /// Drop the session of `user_id`; the next request starts from scratch
    pub async fn reset(&self, user_id: i64) {
        if self.sessions.write().await.remove(&user_id).is_some() {
            log::info!("Session of user {} reset", user_id);
        }
    }

    async fn get_or_insert(&self, user_id: i64) -> Arc<PortalSession> {
        if let Some(session) = self.sessions.read().await.get(&user_id) {
            if !session.is_idle(self.idle_timeout) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(self.idle_timeout));
        if sessions.len() < before {
            log::info!("Dropped {} idle session(s)", before - sessions.len());
        }

        sessions
            .entry(user_id)
            .or_insert_with(|| {
                log::info!("Opening payslip session for user {}", user_id);
                Arc::new(PortalSession {
                    view: self.new_view(user_id),
                    ready: OnceCell::new(),
                    last_used: Mutex::new(Instant::now()),
                })
            })
            .clone()
    }

    fn new_view(&self, user_id: i64) -> PortalPayslipView {
        let view = PortalPayslipView::new(
            self.service.clone(),
            self.executor.clone(),
            Arc::new(FixedUser(user_id)),
            self.settings.clone(),
        );
        view.subscribe(Arc::new(move |state: &PortalState| {
            log::trace!(
                "User {}: loading={} year={:?} payslips={} error={:?}",
                user_id,
                state.loading,
                state.selected_year_id,
                state.payslips.len(),
                state.error
            );
        }));
        view
    }
}
