use serde::{Deserialize, Serialize};

use crate::errors::ScopeError;

/// Tenant/scope pair passed through verbatim to every store call.
///
/// Multi-tenant isolation is a hard invariant: a retriever must never
/// return candidates belonging to another tenant, so the scope is carried
/// explicitly rather than ambiently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: String,
    /// Sub-scope within the tenant (e.g. a knowledge-base id). May be empty.
    pub scope_id: String,
}

impl TenantScope {
    pub fn new(tenant_id: impl Into<String>, scope_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            scope_id: scope_id.into(),
        }
    }

    /// An empty tenant id indicates a caller bug, not a runtime condition.
    pub fn validate(&self) -> Result<(), ScopeError> {
        if self.tenant_id.trim().is_empty() {
            return Err(ScopeError::MissingTenant);
        }
        Ok(())
    }
}
