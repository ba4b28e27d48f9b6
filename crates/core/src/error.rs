//! Errors raised while handling project administration requests.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced row does not exist.
    #[error("{entity} [{id}] not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A submitted value was rejected. The message is shown to the user as-is.
    #[error("{0}")]
    InvalidInput(String),

    /// The parallel arrays of a form disagree in length.
    #[error("Error in number of items received")]
    ItemCountMismatch,

    /// The proxy forwarded no username.
    #[error("Missing {header} header")]
    MissingUser { header: String },

    #[error("Site admin required")]
    SiteAdminRequired,
}
