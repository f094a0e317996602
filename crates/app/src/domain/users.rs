//! Users
//!
//! Users are owned by the identity gateway; only their identifiers are stored here.

use crate::uuids::TypedUuid;

/// Marker for user identifiers.
#[derive(Debug, Clone, Copy)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
