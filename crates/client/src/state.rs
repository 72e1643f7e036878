//! Application wiring: one session store, one token cache, two chains.

use std::sync::Arc;

use tollgate_auth::{Decision, PermissionEvaluator, SessionStore};
use tollgate_core::{ClientError, messages};
use tollgate_observability::GlobalErrorHandler;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::csrf::CredentialCache;
use crate::guard::RouteGuard;
use crate::interceptor::{AntiForgery, AttachCredentials, ErrorTranslation, InterceptorChain};
use crate::navigation::{NavigationTracker, Navigator};
use crate::resolver::SessionResolver;
use crate::routes::RouteTable;
use crate::toast::Notifier;
use crate::transport::HttpTransport;

/// Application state shared across screens.
///
/// - The resolver talks through anti-forgery + credentials only
/// - Feature calls additionally go through error translation
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub store: Arc<SessionStore>,
    pub csrf: Arc<CredentialCache>,
    pub resolver: SessionResolver,
    pub evaluator: PermissionEvaluator,
    pub guard: RouteGuard,
    pub api: ApiClient,
    pub navigation: NavigationTracker,
    /// Sink for unrecoverable errors; reporting never touches session state.
    pub fatal: Arc<GlobalErrorHandler>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let csrf = Arc::new(CredentialCache::new(transport.clone(), &config));

        let auth_chain = InterceptorChain::builder(transport.clone())
            .stage(AntiForgery::new(csrf.clone(), &config))
            .stage(AttachCredentials)
            .build();
        let resolver = SessionResolver::new(auth_chain, store.clone(), csrf.clone(), &config);

        let api_chain = InterceptorChain::builder(transport)
            .stage(AntiForgery::new(csrf.clone(), &config))
            .stage(AttachCredentials)
            .stage(
                ErrorTranslation::new(navigator.clone(), notifier.clone(), config.paths.clone())
                    .with_session(resolver.clone())
                    .with_message_cap(config.login_message_cap),
            )
            .build();

        Self {
            evaluator: PermissionEvaluator::new(store.clone()),
            guard: RouteGuard::new(resolver.clone(), config.paths.clone()),
            api: ApiClient::new(api_chain),
            navigation: NavigationTracker::new(),
            fatal: Arc::new(GlobalErrorHandler::new()),
            navigator,
            notifier,
            config: Arc::new(config),
            store,
            csrf,
            resolver,
        }
    }

    /// Start a navigation to `path`, superseding any in progress, and guard it.
    ///
    /// `None` means a newer navigation started before this one was decided.
    pub async fn navigate(&self, path: &str, routes: &RouteTable) -> Option<Decision> {
        let ticket = self.navigation.begin(path);
        self.guard.check_navigation(&ticket, routes).await
    }

    /// Log out and send the user to the login route.
    pub async fn logout(&self) {
        self.resolver.logout().await;
        self.notifier.success(messages::success::LOGOUT);
        self.navigator.navigate(&self.config.paths.login);
    }

    /// Extend the session; on failure the session is expired and the user is
    /// sent to the login route before the error is returned.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        let result = self.resolver.refresh().await;
        if result.is_err() {
            self.navigator.navigate(&self.config.paths.login);
        }
        result
    }
}
