mod admin;
pub mod dto;
mod public;
pub mod response;
mod router;
mod user;
pub mod validation;

pub use admin::admin_router;
pub use public::public_router;
pub use router::{AppState, create_router};
pub use user::{MAX_PERMISSION_HEADER, user_router};
