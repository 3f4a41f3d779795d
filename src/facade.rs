//! Public authorization entry points
//!
//! [`Authorizer`] is what request handlers call. It resolves the caller,
//! applies the administrator short-circuit and the bot/PII special cases,
//! and translates evaluator decisions into either a returned permission
//! report or a propagated failure. It never swallows a denial or
//! substitutes a default allow.

use crate::audit::AuditLog;
use crate::error::{AuthError, Result};
use crate::evaluator::{PolicyEvaluator, ResourcePermission};
use crate::metrics::{EngineMetrics, MetricsCollector};
use crate::policy::SnapshotStore;
use crate::registry::ResourceRegistry;
use crate::subject::{SubjectContext, SubjectResolver};
use crate::types::{EntityReference, OperationContext, ResourceContext};
use std::sync::Arc;
use tracing::debug;

/// The decision facade used by request handlers
pub struct Authorizer {
    resolver: Arc<SubjectResolver>,
    snapshots: Arc<SnapshotStore>,
    registry: Arc<ResourceRegistry>,
    evaluator: PolicyEvaluator,
    audit: Arc<AuditLog>,
    metrics: MetricsCollector,
}

impl Authorizer {
    pub fn new(
        resolver: Arc<SubjectResolver>,
        snapshots: Arc<SnapshotStore>,
        registry: Arc<ResourceRegistry>,
    ) -> Self {
        Self {
            resolver,
            snapshots,
            registry: registry.clone(),
            evaluator: PolicyEvaluator::new(registry),
            audit: Arc::new(AuditLog::default()),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn audit(&self) -> Arc<AuditLog> {
        self.audit.clone()
    }

    pub async fn metrics(&self) -> EngineMetrics {
        self.metrics.snapshot().await
    }

    /// Permissions for every known resource type.
    ///
    /// `acting_as` re-resolves the report for another identity; asking for
    /// someone else's permissions is an administrator-only operation.
    pub async fn list_permissions(
        &self,
        identity: Option<&str>,
        acting_as: Option<&str>,
    ) -> Result<Vec<ResourcePermission>> {
        let caller = self.resolver.resolve(identity).await?;
        let subject = self.substitute(caller, acting_as).await?;

        if subject.is_admin() {
            self.metrics.record_admin_override().await;
            return Ok(self
                .registry
                .descriptors()
                .iter()
                .map(ResourcePermission::all_allow)
                .collect());
        }

        let snapshot = self.snapshots.current().await;
        self.evaluator.list_permissions(&subject, &snapshot)
    }

    /// Permissions for one resource type
    pub async fn resource_type_permissions(
        &self,
        identity: Option<&str>,
        acting_as: Option<&str>,
        resource_type: &str,
    ) -> Result<ResourcePermission> {
        let caller = self.resolver.resolve(identity).await?;
        let subject = self.substitute(caller, acting_as).await?;

        if subject.is_admin() {
            self.metrics.record_admin_override().await;
            return Ok(ResourcePermission::all_allow(
                self.registry.get(resource_type)?,
            ));
        }

        let snapshot = self.snapshots.current().await;
        self.evaluator
            .resource_permissions(&subject, &snapshot, resource_type)
    }

    /// Permissions against one resource, considering instance facts when the
    /// context is concrete
    pub async fn resource_permissions(
        &self,
        identity: Option<&str>,
        acting_as: Option<&str>,
        resource: &ResourceContext,
    ) -> Result<ResourcePermission> {
        let caller = self.resolver.resolve(identity).await?;
        let subject = self.substitute(caller, acting_as).await?;

        if subject.is_admin() {
            self.metrics.record_admin_override().await;
            return Ok(ResourcePermission::all_allow(
                self.registry.get(resource.resource_type())?,
            ));
        }

        let snapshot = self.snapshots.current().await;
        self.evaluator
            .permissions_for(&subject, &snapshot, resource)
    }

    /// Enforce the requested operations against a resource.
    ///
    /// Administrators succeed without rule evaluation; everyone else must
    /// hold an explicit allow for every requested operation.
    pub async fn authorize(
        &self,
        identity: Option<&str>,
        operations: &OperationContext,
        resource: &ResourceContext,
    ) -> Result<()> {
        let subject = self.resolver.resolve(identity).await?;
        self.metrics.record_request().await;

        if subject.is_admin() {
            self.metrics.record_admin_override().await;
            self.metrics.record_decision(true).await;
            return Ok(());
        }

        let snapshot = self.snapshots.current().await;
        match self
            .evaluator
            .check(&subject, &snapshot, resource, operations)
        {
            Ok(()) => {
                self.metrics.record_decision(true).await;
                Ok(())
            }
            Err(err @ AuthError::PermissionDenied { .. }) => {
                self.audit
                    .record_denial(subject.name(), &err.to_string())
                    .await;
                self.metrics.record_decision(false).await;
                Err(err)
            }
            Err(other) => {
                self.metrics.record_error().await;
                Err(other)
            }
        }
    }

    /// Succeed only for administrators
    pub async fn authorize_admin(&self, identity: Option<&str>) -> Result<()> {
        let subject = self.resolver.resolve(identity).await?;
        if subject.is_admin() {
            return Ok(());
        }
        let err = AuthError::NotAdmin {
            user: subject.name().to_string(),
        };
        self.audit
            .record_denial(subject.name(), &err.to_string())
            .await;
        Err(err)
    }

    /// Succeed for administrators and bots
    pub async fn authorize_admin_or_bot(&self, identity: Option<&str>) -> Result<()> {
        let subject = self.resolver.resolve(identity).await?;
        if subject.is_admin() || subject.is_bot() {
            return Ok(());
        }
        let err = AuthError::NotAdmin {
            user: subject.name().to_string(),
        };
        self.audit
            .record_denial(subject.name(), &err.to_string())
            .await;
        Err(err)
    }

    /// Whether password fields must be masked for this caller.
    ///
    /// Bots are trusted with raw credentials for automated workflows; every
    /// other principal, administrators included, gets masked output.
    pub async fn should_mask_passwords(&self, identity: Option<&str>) -> Result<bool> {
        let subject = self.resolver.resolve(identity).await?;
        Ok(!subject.is_bot())
    }

    /// Coarse subject-level gate for PII fields, layered on top of the
    /// rule-evaluated permission system: administrators, bots, and owners
    /// may see PII. A boolean query, never an authorization failure.
    pub async fn authorize_pii(
        &self,
        identity: Option<&str>,
        owner: Option<&EntityReference>,
    ) -> Result<bool> {
        let subject = self.resolver.resolve(identity).await?;
        Ok(subject.is_admin()
            || subject.is_bot()
            || owner.map(|o| subject.is_owner(o)).unwrap_or(false))
    }

    /// Re-resolve as another identity; admin-only unless it names the caller
    async fn substitute(
        &self,
        caller: Arc<SubjectContext>,
        acting_as: Option<&str>,
    ) -> Result<Arc<SubjectContext>> {
        match acting_as {
            Some(target) if target != caller.name() => {
                if !caller.is_admin() {
                    let err = AuthError::NotAdmin {
                        user: caller.name().to_string(),
                    };
                    self.audit
                        .record_denial(caller.name(), &err.to_string())
                        .await;
                    return Err(err);
                }
                debug!(caller = caller.name(), target, "changing subject context");
                self.audit
                    .record_substitution(caller.name(), target)
                    .await;
                self.resolver.resolve(Some(target)).await
            }
            _ => Ok(caller),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicySnapshot;
    use crate::subject::{InMemorySubjectSource, SubjectRecord, UserProfile};

    #[tokio::test]
    async fn test_authorizer_wiring() {
        let source = Arc::new(InMemorySubjectSource::new());
        source
            .put(SubjectRecord::new(UserProfile::named("root").as_admin()))
            .await;

        let authorizer = Authorizer::new(
            Arc::new(SubjectResolver::new(source)),
            Arc::new(SnapshotStore::new(PolicySnapshot::new())),
            Arc::new(ResourceRegistry::catalog()),
        );

        authorizer.authorize_admin(Some("root")).await.unwrap();
        assert!(authorizer.audit().is_empty().await);
        assert_eq!(authorizer.metrics().await.total_requests, 0);
    }
}
