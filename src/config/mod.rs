mod server;

pub use server::{DEFAULT_SHARE_TOKEN_TTL_SECS, ServerConfig};
