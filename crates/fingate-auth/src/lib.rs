//! OAuth 2.1 authorization server, protected-resource middleware, and the identity-binding
//! storage layer that sits behind the gateway's two mounts.

pub mod as_server;
pub mod codec;
pub mod error;
pub mod legacy_middleware;
pub mod pkce;
pub mod pr_middleware;
pub mod request_context;
pub mod resolver;
pub mod state;
pub mod store;
pub mod types;

pub use error::AuthError;
pub use legacy_middleware::legacy_identity_middleware;
pub use pr_middleware::{protected_resource_middleware, PrMiddlewareState};
pub use request_context::RequestCredential;
pub use state::{canonical_base_url, AuthState};
pub use store::{Collection, Store, StoreExt};
