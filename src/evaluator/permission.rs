//! Permission reports and deny-overrides aggregation

use crate::registry::ResourceDescriptor;
use crate::types::{Access, Effect, Operation};
use serde::{Deserialize, Serialize};

/// Where a decision came from: the rule that fired and the policy and role
/// it was reached through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub rule: String,
    pub policy: String,
    pub role: String,
}

/// Decision for one operation, with provenance when a rule contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPermission {
    pub operation: Operation,
    pub access: Access,

    /// Absent for `NOT_ALLOW` and for administrator grants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Effective permissions for one resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermission {
    pub resource_type: String,
    pub permissions: Vec<OperationPermission>,
}

impl ResourcePermission {
    /// ALLOW for every operation of the type: the administrator report
    pub fn all_allow(descriptor: &ResourceDescriptor) -> Self {
        Self {
            resource_type: descriptor.name.clone(),
            permissions: descriptor
                .operations
                .iter()
                .map(|&operation| OperationPermission {
                    operation,
                    access: Access::Allow,
                    provenance: None,
                })
                .collect(),
        }
    }

    pub fn get(&self, operation: Operation) -> Option<&OperationPermission> {
        self.permissions.iter().find(|p| p.operation == operation)
    }

    /// Access level for an operation; an operation the type does not
    /// support is `NotAllow`.
    pub fn access(&self, operation: Operation) -> Access {
        self.get(operation)
            .map(|p| p.access)
            .unwrap_or(Access::NotAllow)
    }
}

/// Accumulates matching-rule effects for one (type, operation) pair and
/// resolves them with deny-overrides precedence.
///
/// Same-effect matches are order-independent: any match suffices, and the
/// first one seen is kept only as provenance.
#[derive(Debug, Default)]
pub(crate) struct DecisionBuilder {
    deny: Option<Provenance>,
    allow: Option<Provenance>,
}

impl DecisionBuilder {
    pub(crate) fn record(&mut self, effect: Effect, provenance: Provenance) {
        let slot = match effect {
            Effect::Deny => &mut self.deny,
            Effect::Allow => &mut self.allow,
        };
        if slot.is_none() {
            *slot = Some(provenance);
        }
    }

    pub(crate) fn finish(self, operation: Operation) -> OperationPermission {
        // Any matching DENY wins; else any matching ALLOW; else no rule
        // matched at all.
        let (access, provenance) = if let Some(p) = self.deny {
            (Access::Deny, Some(p))
        } else if let Some(p) = self.allow {
            (Access::Allow, Some(p))
        } else {
            (Access::NotAllow, None)
        };

        OperationPermission {
            operation,
            access,
            provenance,
        }
    }
}
