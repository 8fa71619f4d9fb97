//! # Trellis
//!
//! Hierarchical project access control: ownership, user and team grants
//! inherited down a project tree, archive cascades and password-protected
//! link shares. Usable both as a standalone server and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! trellis = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis::auth::ShareTokenSigner;
//! use trellis::config::ServerConfig;
//! use trellis::server::{AppState, create_router};
//! use trellis::store::SqliteStore;
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let secret = std::fs::read_to_string(config.secret_path()).unwrap();
//! let signer = ShareTokenSigner::from_hex(&secret, config.share_token_ttl_secs).unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), config, Arc::new(signer)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! Access checks can also be used without the HTTP layer:
//!
//! ```rust,ignore
//! let decision = store.read(|db| trellis::access::can_write(db, &actor, project_id))?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `trellis` binary. Disable with `default-features = false`.

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
