use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("project {0} does not exist")]
    ProjectNotFound(i64),

    #[error("user {0} does not exist")]
    UserNotFound(i64),

    #[error("team {0} does not exist")]
    TeamNotFound(i64),

    #[error("link share does not exist")]
    LinkShareNotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("user or team already has access to this project")]
    AlreadyHasAccess,

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("project {0} has a cyclic parent chain")]
    CorruptHierarchy(i64),

    #[error("a project cannot be moved below itself or one of its children")]
    CyclicHierarchy,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("project {0} is archived")]
    ProjectIsArchived(i64),

    #[error("this link share requires a password")]
    LinkSharePasswordRequired,

    #[error("the provided link share password is invalid")]
    LinkSharePasswordInvalid,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("token expired")]
    TokenExpired,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid permission: {0}")]
    InvalidPermission(String),
}

impl Error {
    /// Symbolic code surfaced to API clients alongside the message.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::ProjectNotFound(_) => "ProjectNotFound",
            Error::UserNotFound(_) => "UserNotFound",
            Error::TeamNotFound(_) => "TeamNotFound",
            Error::LinkShareNotFound => "LinkShareNotFound",
            Error::NotFound => "NotFound",
            Error::AlreadyExists => "AlreadyExists",
            Error::AlreadyHasAccess => "AlreadyHasAccess",
            Error::CorruptHierarchy(_) => "CorruptHierarchy",
            Error::CyclicHierarchy => "CyclicHierarchy",
            Error::Unauthorized | Error::InvalidTokenFormat => "Unauthorized",
            Error::TokenExpired => "TokenExpired",
            Error::Forbidden => "Forbidden",
            Error::ProjectIsArchived(_) => "ProjectIsArchived",
            Error::LinkSharePasswordRequired => "LinkSharePasswordRequired",
            Error::LinkSharePasswordInvalid => "LinkSharePasswordInvalid",
            Error::BadRequest(_) => "BadRequest",
            Error::InvalidPermission(_) => "InvalidPermission",
            Error::Database(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::TokenLookupCollision => "Internal",
        }
    }

    /// Authorization and credential outcomes are answers, not failures.
    #[must_use]
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            Error::Forbidden
                | Error::ProjectIsArchived(_)
                | Error::LinkSharePasswordRequired
                | Error::LinkSharePasswordInvalid
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
