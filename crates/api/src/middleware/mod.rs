//! Request extractors for caller identity.
//!
//! - [`remote_user::RemoteUser`] -- The user named by the authenticating proxy.

pub mod remote_user;
