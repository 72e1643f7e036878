//! `tollgate-client`
//!
//! **Responsibility:** the async half of the dashboard's session core.
//!
//! This crate provides:
//! - Session resolution with coalesced status checks (login, logout, refresh)
//! - Anti-forgery token caching
//! - The request interceptor chain (anti-forgery, credentials, error translation)
//! - Async route guards over a route table
//!
//! The server remains the authority; everything here is a cache of its answers.

pub mod api;
pub mod config;
pub mod csrf;
pub mod guard;
pub mod interceptor;
pub mod login;
pub mod memory;
pub mod navigation;
pub mod resolver;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod toast;
pub mod transport;

pub use api::ApiClient;
pub use config::{ClientConfig, ConfigError, Endpoints};
pub use csrf::{CredentialCache, CsrfToken};
pub use guard::RouteGuard;
pub use interceptor::{
    AntiForgery, AttachCredentials, ErrorTranslation, Interceptor, InterceptorChain, Next,
};
pub use login::Credentials;
pub use navigation::{NavigationTicket, NavigationTracker, Navigator};
pub use resolver::{ResolvedStatus, SessionResolver};
pub use routes::{RouteAccess, RouteEntry, RouteTable};
pub use state::AppState;
pub use toast::{Notifier, Toast, ToastLevel, ToastQueue};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
