mod helpers;
pub mod link_share;
mod middleware;
mod session;
mod token;

pub use link_share::{IssuedLinkShare, NewLinkShare};
pub use middleware::{AuthError, RequireActor, RequireAdmin};
pub use session::{SessionSigner, ShareClaims, ShareTokenSigner};
pub use token::{TokenGenerator, parse_token};
