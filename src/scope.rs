//! Request scoping shared by every release-tracking service.
//!
//! Each service call receives a [`RequestContext`] explicitly. The context
//! carries the tenant (deployable system) the request acts on and the actor
//! recorded in the audit trail. Nothing here is ambient or thread-local.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of the tenant (deployable system) that owns releases and
/// environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a new random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised when an operation needs a tenant but the request carries none.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("request has no tenant scope")]
pub struct MissingTenantScope;

/// Per-request context passed explicitly through service calls.
///
/// # Examples
///
/// ```
/// use release_ledger::scope::{RequestContext, TenantId};
///
/// let tenant = TenantId::new();
/// let context = RequestContext::for_tenant(tenant).with_actor("jdoe");
/// assert_eq!(context.require_tenant(), Ok(tenant));
/// assert_eq!(context.actor(), Some("jdoe"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    tenant_id: Option<TenantId>,
    actor: Option<String>,
}

impl RequestContext {
    /// Creates a context with neither tenant nor actor.
    #[must_use]
    pub const fn unscoped() -> Self {
        Self {
            tenant_id: None,
            actor: None,
        }
    }

    /// Creates a context scoped to `tenant_id`.
    #[must_use]
    pub const fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            actor: None,
        }
    }

    /// Sets the actor recorded in audit entries.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Returns the tenant, if one was resolved for this request.
    #[must_use]
    pub const fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the tenant or rejects the request.
    ///
    /// # Errors
    ///
    /// Returns [`MissingTenantScope`] when no tenant was resolved.
    pub const fn require_tenant(&self) -> Result<TenantId, MissingTenantScope> {
        match self.tenant_id {
            Some(tenant_id) => Ok(tenant_id),
            None => Err(MissingTenantScope),
        }
    }

    /// Returns the acting user, if known.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}
