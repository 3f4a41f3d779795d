//! Policy evaluation: one rule-matching primitive, three evaluation modes
//!
//! All modes walk the rules reachable from the subject's roles (role order,
//! then policy order within a role, then rule order within a policy) and
//! record every matching rule's effect. The final decision per (type,
//! operation) is DENY if any matching rule denies, else ALLOW if any
//! matching rule allows, else NOT_ALLOW. Evaluation is a pure function of
//! (subject roles+policies, operation, resource) over an immutable snapshot.

mod permission;

pub use permission::{OperationPermission, Provenance, ResourcePermission};

use crate::error::{AuthError, Result};
use crate::policy::{PolicySnapshot, Rule};
use crate::registry::{ResourceDescriptor, ResourceRegistry};
use crate::subject::SubjectContext;
use crate::types::{Access, OperationContext, ResourceContext, ResourceInstance};
use permission::DecisionBuilder;
use std::sync::Arc;
use tracing::debug;

/// Evaluates a subject's policies against operations and resources
pub struct PolicyEvaluator {
    registry: Arc<ResourceRegistry>,
}

impl PolicyEvaluator {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }

    /// Abstract permissions for every known resource type
    pub fn list_permissions(
        &self,
        subject: &SubjectContext,
        snapshot: &PolicySnapshot,
    ) -> Result<Vec<ResourcePermission>> {
        self.registry
            .descriptors()
            .iter()
            .map(|descriptor| self.evaluate(subject, snapshot, descriptor, None))
            .collect()
    }

    /// Abstract permissions for one resource type
    pub fn resource_permissions(
        &self,
        subject: &SubjectContext,
        snapshot: &PolicySnapshot,
        resource_type: &str,
    ) -> Result<ResourcePermission> {
        let descriptor = self.registry.get(resource_type)?;
        self.evaluate(subject, snapshot, descriptor, None)
    }

    /// Permissions against one resource, concrete when the context carries
    /// instance facts
    pub fn permissions_for(
        &self,
        subject: &SubjectContext,
        snapshot: &PolicySnapshot,
        resource: &ResourceContext,
    ) -> Result<ResourcePermission> {
        let descriptor = self.registry.get(resource.resource_type())?;
        self.evaluate(subject, snapshot, descriptor, resource.instance())
    }

    /// Enforcement: succeed silently, or fail naming the first denied
    /// operation and the resource.
    pub fn check(
        &self,
        subject: &SubjectContext,
        snapshot: &PolicySnapshot,
        resource: &ResourceContext,
        operations: &OperationContext,
    ) -> Result<()> {
        if subject.is_admin() {
            return Ok(());
        }

        let report = self.permissions_for(subject, snapshot, resource)?;

        for &operation in operations.operations() {
            let access = report.access(operation);
            if access != Access::Allow {
                debug!(
                    user = subject.name(),
                    %operation,
                    resource = %resource.describe(),
                    ?access,
                    "operation denied"
                );
                return Err(AuthError::PermissionDenied {
                    user: subject.name().to_string(),
                    operation: operation.to_string(),
                    resource: resource.describe(),
                });
            }
        }

        Ok(())
    }

    /// The matching primitive shared by every mode.
    ///
    /// Administrators bypass rule evaluation entirely and get ALLOW for
    /// every operation. With `instance` present, rule conditions are tested
    /// against the concrete facts; without it (abstract listing), conditions
    /// are treated as satisfied, so conditional denies surface
    /// conservatively.
    fn evaluate(
        &self,
        subject: &SubjectContext,
        snapshot: &PolicySnapshot,
        descriptor: &ResourceDescriptor,
        instance: Option<&ResourceInstance>,
    ) -> Result<ResourcePermission> {
        if subject.is_admin() {
            return Ok(ResourcePermission::all_allow(descriptor));
        }

        let mut builders: Vec<DecisionBuilder> = descriptor
            .operations
            .iter()
            .map(|_| DecisionBuilder::default())
            .collect();

        self.for_each_rule(subject, snapshot, |role, policy, rule| {
            if !rule.applies_to_resource(&descriptor.name) {
                return;
            }
            if let (Some(instance), Some(condition)) = (instance, &rule.condition) {
                if !condition.holds(subject, &descriptor.name, instance) {
                    return;
                }
            }
            for (builder, &operation) in builders.iter_mut().zip(descriptor.operations.iter()) {
                if rule.applies_to_operation(operation) {
                    builder.record(
                        rule.effect,
                        Provenance {
                            rule: rule.name.clone(),
                            policy: policy.to_string(),
                            role: role.to_string(),
                        },
                    );
                }
            }
        })?;

        Ok(ResourcePermission {
            resource_type: descriptor.name.clone(),
            permissions: builders
                .into_iter()
                .zip(descriptor.operations.iter())
                .map(|(builder, &operation)| builder.finish(operation))
                .collect(),
        })
    }

    /// Visit every rule reachable from the subject's roles in evaluation
    /// order. A role or policy missing from the snapshot fails the whole
    /// walk; a partial rule set must never produce a permission report.
    fn for_each_rule<F>(
        &self,
        subject: &SubjectContext,
        snapshot: &PolicySnapshot,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(&str, &str, &Rule),
    {
        for role_name in subject.role_names() {
            let role = snapshot
                .role(role_name)
                .ok_or_else(|| AuthError::UnknownRole(role_name.to_string()))?;
            for policy in snapshot.role_policies(role)? {
                for rule in &policy.rules {
                    visit(role_name, &policy.name, rule);
                }
            }
        }
        Ok(())
    }
}
