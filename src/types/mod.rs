mod actor;
mod models;
mod permission;

pub use actor::Actor;
pub use models::*;
pub use permission::Permission;
