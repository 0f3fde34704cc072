//! Request-scoped identity.

use crate::types::UserId;
use uuid::Uuid;

/// Who is calling, and the correlation ID that ties their request's log
/// lines together.
///
/// Built by the HTTP layer from trusted gateway headers and passed to every
/// service operation that acts on behalf of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorContext {
    /// Authenticated user
    pub user_id: UserId,
    /// Request correlation ID
    pub correlation_id: Uuid,
}

impl ActorContext {
    /// Creates a context for `user_id` with a fresh correlation ID.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Replaces the correlation ID.
    #[must_use]
    pub const fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}
