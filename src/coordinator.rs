//! Top-level reaction to gateway signals.
//!
//! The gateway only reports that a session ended or a request was refused;
//! what the user sees as a result is decided here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::gateway::GatewayEvent;
use crate::scope::ScopeResolver;
use crate::session::SessionStore;

/// Places the console can send the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Promotions,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Promotions => "/promotions",
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Turns gateway events into session resets, redirects and notices.
pub struct Coordinator {
    session: Arc<SessionStore>,
    scope: Arc<ScopeResolver>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    /// Set once the current session has been sent back to login.
    redirected: AtomicBool,
}

impl Coordinator {
    pub fn new(
        session: Arc<SessionStore>,
        scope: Arc<ScopeResolver>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            scope,
            navigator,
            notifier,
            redirected: AtomicBool::new(false),
        }
    }

    pub fn handle(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::SessionInvalidated => self.end_session(),
            GatewayEvent::PermissionDenied { message, .. } => {
                self.notifier.notify(Notice::error("Access Denied", message.clone()));
            }
        }
    }

    /// Reset the session and send the user to login, at most once per
    /// session. Several in-flight requests may fail with 401 together.
    pub fn end_session(&self) {
        if self.session.snapshot().is_authenticated {
            self.redirected.store(false, Ordering::SeqCst);
        }
        if self.redirected.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::warn!("Session invalidated, returning to login");
        self.session.reset();
        self.scope.enter_module();
        self.navigator.navigate(Route::Login);
    }

    /// Handle events until the gateway goes away.
    pub async fn run(&self, mut events: broadcast::Receiver<GatewayEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Coordinator fell behind gateway events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::Config;
    use crate::gateway::Gateway;
    use crate::scope::ScopeMode;
    use crate::storage::StateStore;

    #[derive(Default)]
    struct Recorder {
        routes: Mutex<Vec<Route>>,
        notices: Mutex<Vec<Notice>>,
    }

    impl Navigator for Recorder {
        fn navigate(&self, route: Route) {
            self.routes.lock().unwrap().push(route);
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    async fn signed_in() -> (Coordinator, Arc<SessionStore>, Arc<ScopeResolver>, Arc<Recorder>) {
        let fixture = loading().await;
        fixture.1.bootstrap().await.unwrap();
        fixture
    }

    async fn loading() -> (Coordinator, Arc<SessionStore>, Arc<ScopeResolver>, Arc<Recorder>) {
        let state = Arc::new(StateStore::in_memory().await.unwrap());
        let gateway = Arc::new(Gateway::new(&Config::demo(), state).unwrap());
        let session = Arc::new(SessionStore::new(gateway));
        let scope = Arc::new(ScopeResolver::new());
        let recorder = Arc::new(Recorder::default());
        let coordinator = Coordinator::new(
            Arc::clone(&session),
            Arc::clone(&scope),
            recorder.clone(),
            recorder.clone(),
        );
        (coordinator, session, scope, recorder)
    }

    #[tokio::test]
    async fn test_invalidation_resets_and_redirects_once() {
        let (coordinator, session, scope, recorder) = signed_in().await;
        scope.set_mode(ScopeMode::All, &session.snapshot()).unwrap();

        coordinator.handle(&GatewayEvent::SessionInvalidated);
        coordinator.handle(&GatewayEvent::SessionInvalidated);

        assert!(!session.snapshot().is_authenticated);
        assert_eq!(scope.selection().mode, ScopeMode::Current);
        assert_eq!(*recorder.routes.lock().unwrap(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_invalidation_while_loading_redirects() {
        let (coordinator, session, _scope, recorder) = loading().await;
        assert!(session.snapshot().is_loading);

        coordinator.handle(&GatewayEvent::SessionInvalidated);
        coordinator.handle(&GatewayEvent::SessionInvalidated);

        assert!(!session.snapshot().is_loading);
        assert_eq!(*recorder.routes.lock().unwrap(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_new_session_can_be_invalidated_again() {
        let (coordinator, session, _scope, recorder) = signed_in().await;

        coordinator.handle(&GatewayEvent::SessionInvalidated);
        session.login("demo@magvlyn.com", "secret").await.unwrap();
        coordinator.handle(&GatewayEvent::SessionInvalidated);

        assert!(!session.snapshot().is_authenticated);
        assert_eq!(
            *recorder.routes.lock().unwrap(),
            vec![Route::Login, Route::Login]
        );
    }

    #[tokio::test]
    async fn test_permission_denied_notifies_and_keeps_session() {
        let (coordinator, session, _scope, recorder) = signed_in().await;

        coordinator.handle(&GatewayEvent::PermissionDenied {
            method: "POST".to_string(),
            path: "/promotions/partners".to_string(),
            message: "Missing promotions.partners.manage".to_string(),
        });

        assert!(session.snapshot().is_authenticated);
        assert!(recorder.routes.lock().unwrap().is_empty());
        let notices = recorder.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Access Denied");
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }
}
