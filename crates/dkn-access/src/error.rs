//! Error types for the access model

/// Access model errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Role name outside the five known tiers
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Dashboard view key that does not exist
    #[error("unknown navigation item: {0}")]
    UnknownNavItem(String),

    /// Hydration was already resolved for this gate
    #[error("route gate already resolved")]
    AlreadyResolved,

    /// Transition attempted before hydration resolved
    #[error("route gate is still hydrating")]
    StillHydrating,

    /// Edit form must stay disabled
    #[error("edit denied: {0}")]
    EditDenied(String),

    /// Target status reserved to the governance tier
    #[error("status {0} is not offered to this user")]
    StatusNotOffered(String),
}

impl AccessError {
    /// Check if the error comes from a gate transition
    #[inline]
    #[must_use]
    pub fn is_gate_error(&self) -> bool {
        matches!(self, Self::AlreadyResolved | Self::StillHydrating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = AccessError::StatusNotOffered("ARCHIVED".to_string());
        assert!(err.to_string().contains("ARCHIVED"));
    }

    #[test]
    fn gate_errors_classified() {
        assert!(AccessError::AlreadyResolved.is_gate_error());
        assert!(!AccessError::UnknownRole("x".to_string()).is_gate_error());
    }
}
