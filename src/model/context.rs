//! Security context threaded through every store call.
//!
//! The mapping core never interprets it; stores and filters may.

use serde::{Deserialize, Serialize};

/// Opaque capability token supplied by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    principal: Option<String>,
    superuser: bool,
}

impl SecurityContext {
    /// Unauthenticated access.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Unrestricted access, used by internal operations.
    pub fn superuser() -> Self {
        Self { principal: None, superuser: true }
    }

    pub fn for_principal(id: impl Into<String>) -> Self {
        Self { principal: Some(id.into()), superuser: false }
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn is_superuser(&self) -> bool {
        self.superuser
    }
}
