//! Domain error taxonomy shared by every crate in the workspace.

/// Domain-level error for marketplace operations.
///
/// Authorization failures on listing mutations must not reveal whether the
/// listing exists to a non-owner; callers convert `Forbidden` to `NotFound`
/// before rendering (see the lifecycle service).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad input shape or range. The message is the first violation found
    /// and is surfaced verbatim to the caller.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity does not exist (or the caller may not know that it does).
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// No authenticated actor.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limit exceeded; retry after the window elapses.
    #[error("Too many requests: {0}")]
    Throttled(String),

    /// State conflict (e.g. illegal status transition).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A required collaborator (store, limiter, idempotency cache) failed.
    /// Creation fails closed on these to preserve abuse protection.
    #[error("Dependency unavailable: {0}")]
    Dependency(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Replace an authorization failure with a not-found of the given
    /// entity so the response shape does not leak existence.
    pub fn mask_as_not_found(self, entity: &'static str) -> Self {
        match self {
            CoreError::Forbidden(_) => CoreError::NotFound { entity },
            other => other,
        }
    }
}
