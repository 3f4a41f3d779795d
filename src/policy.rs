//! Rules, policies, roles, and versioned policy snapshots
//!
//! A rule is the atomic unit of decision: a predicate over (operation,
//! resource type, resource condition) plus an allow/deny effect. Policies
//! group rules, roles group policies, and a [`PolicySnapshot`] is the
//! immutable versioned view of all of them that an evaluation runs against.

use crate::error::{AuthError, Result};
use crate::subject::SubjectContext;
use crate::types::{Effect, Operation, ResourceInstance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Keyword matching every resource type in a rule's resource list
pub const ALL_RESOURCES: &str = "all";

/// Parsed predicate over resource-instance facts.
///
/// The rule language grammar lives upstream; the engine only consumes these
/// parsed forms. Conditions are tested during concrete evaluation; abstract
/// contexts carry no instance facts, so callers skip the check there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleCondition {
    /// The subject, or one of its teams, owns the resource
    IsOwner,
    /// The resource has no owner assigned
    NoOwner,
    /// The resource carries at least one of the given tags
    MatchAnyTag(Vec<String>),
    /// The resource carries every one of the given tags
    MatchAllTags(Vec<String>),
    Not(Box<RuleCondition>),
    AllOf(Vec<RuleCondition>),
    AnyOf(Vec<RuleCondition>),
}

impl RuleCondition {
    /// Evaluate against one concrete resource
    pub fn holds(
        &self,
        subject: &SubjectContext,
        resource_type: &str,
        instance: &ResourceInstance,
    ) -> bool {
        match self {
            Self::IsOwner => {
                let by_reference = instance
                    .owner
                    .as_ref()
                    .map(|owner| subject.is_owner(owner))
                    .unwrap_or(false);
                by_reference || subject.owns_resource(resource_type, &instance.name)
            }
            Self::NoOwner => instance.owner.is_none(),
            Self::MatchAnyTag(tags) => tags.iter().any(|t| instance.has_tag(t)),
            Self::MatchAllTags(tags) => tags.iter().all(|t| instance.has_tag(t)),
            Self::Not(inner) => !inner.holds(subject, resource_type, instance),
            Self::AllOf(conditions) => conditions
                .iter()
                .all(|c| c.holds(subject, resource_type, instance)),
            Self::AnyOf(conditions) => conditions
                .iter()
                .any(|c| c.holds(subject, resource_type, instance)),
        }
    }
}

/// Atomic decision unit: resource selectors, operation selectors, an
/// optional condition, and an effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,

    /// Resource selectors: the `all` keyword, a type name, or a `*` wildcard
    /// pattern
    pub resources: Vec<String>,

    /// Operation selectors; `All`/`ViewAll`/`EditAll` subsume their families
    pub operations: Vec<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<RuleCondition>,

    pub effect: Effect,
}

impl Rule {
    /// Create a rule matching every resource and no operation
    pub fn new(name: impl Into<String>, effect: Effect) -> Self {
        Self {
            name: name.into(),
            resources: vec![ALL_RESOURCES.to_string()],
            operations: Vec::new(),
            condition: None,
            effect,
        }
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    pub fn with_condition(mut self, condition: RuleCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether any resource selector matches the given type
    pub fn applies_to_resource(&self, resource_type: &str) -> bool {
        self.resources
            .iter()
            .any(|pattern| resource_pattern_matches(pattern, resource_type))
    }

    /// Whether any operation selector covers the requested operation
    pub fn applies_to_operation(&self, requested: Operation) -> bool {
        self.operations.iter().any(|op| op.covers(requested))
    }
}

/// Match a resource selector against a type name (supports `*` wildcards)
fn resource_pattern_matches(pattern: &str, resource_type: &str) -> bool {
    if pattern.eq_ignore_ascii_case(ALL_RESOURCES) {
        return true;
    }

    if pattern.contains('*') {
        let regex_pattern = pattern.replace('.', r"\.").replace('*', ".*");
        if let Ok(regex) = regex::Regex::new(&format!("(?i)^{}$", regex_pattern)) {
            return regex.is_match(resource_type);
        }
    }

    pattern.eq_ignore_ascii_case(resource_type)
}

/// Named, ordered collection of rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub rules: Vec<Rule>,
}

impl Policy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Named collection of policies, referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub policies: Vec<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policies.push(policy.into());
        self
    }
}

/// Immutable, versioned view of all roles and policies.
///
/// Snapshots are handed out as `Arc`s and never mutated; updates install a
/// whole new snapshot through [`SnapshotStore::replace`], so in-flight
/// evaluations keep a consistent view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySnapshot {
    version: u64,
    roles: HashMap<String, Role>,
    policies: HashMap<String, Policy>,
}

impl PolicySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role.name.clone(), role);
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.insert(policy.name.clone(), policy);
        self
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    /// Resolve a role's policies, failing if any referenced policy is
    /// missing. A partial policy set would make an incomplete ALLOW set look
    /// authoritative, so the whole lookup fails instead.
    pub fn role_policies(&self, role: &Role) -> Result<Vec<&Policy>> {
        role.policies
            .iter()
            .map(|name| {
                self.policy(name).ok_or_else(|| AuthError::MissingPolicy {
                    role: role.name.clone(),
                    policy: name.clone(),
                })
            })
            .collect()
    }

    fn at_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

/// Swap-on-write holder for the current policy snapshot.
///
/// Readers clone an `Arc` to an immutable snapshot; writers replace the
/// whole snapshot atomically and bump the version. Safe for unlimited
/// concurrent reads.
pub struct SnapshotStore {
    current: RwLock<Arc<PolicySnapshot>>,
}

impl SnapshotStore {
    pub fn new(initial: PolicySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial.at_version(1))),
        }
    }

    /// The snapshot evaluations should run against
    pub async fn current(&self) -> Arc<PolicySnapshot> {
        self.current.read().await.clone()
    }

    /// Install a new snapshot, returning its version
    pub async fn replace(&self, next: PolicySnapshot) -> u64 {
        let mut guard = self.current.write().await;
        let version = guard.version() + 1;
        *guard = Arc::new(next.at_version(version));
        info!(version, "policy snapshot replaced");
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::UserProfile;
    use crate::types::EntityReference;

    #[test]
    fn test_resource_pattern_matching() {
        assert!(resource_pattern_matches("all", "table"));
        assert!(resource_pattern_matches("All", "dashboard"));
        assert!(resource_pattern_matches("table", "table"));
        assert!(resource_pattern_matches("Table", "table"));
        assert!(!resource_pattern_matches("table", "topic"));

        assert!(resource_pattern_matches("data*", "database"));
        assert!(resource_pattern_matches("data*", "databaseSchema"));
        assert!(!resource_pattern_matches("data*", "dashboard"));
        assert!(resource_pattern_matches("*", "anything"));
    }

    #[test]
    fn test_rule_matching() {
        let rule = Rule::new("viewer", Effect::Allow)
            .with_resources(["table", "topic"])
            .with_operations([Operation::ViewAll]);

        assert!(rule.applies_to_resource("table"));
        assert!(!rule.applies_to_resource("dashboard"));
        assert!(rule.applies_to_operation(Operation::ViewBasic));
        assert!(!rule.applies_to_operation(Operation::EditTags));
    }

    #[test]
    fn test_condition_evaluation() {
        let subject = SubjectContext::new(UserProfile::named("alice"));
        let owned = ResourceInstance {
            name: "sales.orders".to_string(),
            owner: Some(EntityReference::user("alice")),
            tags: vec!["PII".to_string(), "Tier1".to_string()],
        };

        assert!(RuleCondition::IsOwner.holds(&subject, "table", &owned));
        assert!(!RuleCondition::NoOwner.holds(&subject, "table", &owned));
        assert!(RuleCondition::MatchAnyTag(vec!["PII".to_string()]).holds(&subject, "table", &owned));
        assert!(RuleCondition::MatchAllTags(vec!["PII".to_string(), "Tier1".to_string()])
            .holds(&subject, "table", &owned));
        assert!(!RuleCondition::MatchAllTags(vec!["PII".to_string(), "Tier2".to_string()])
            .holds(&subject, "table", &owned));

        let composite = RuleCondition::AllOf(vec![
            RuleCondition::IsOwner,
            RuleCondition::Not(Box::new(RuleCondition::MatchAnyTag(vec![
                "Restricted".to_string()
            ]))),
        ]);
        assert!(composite.holds(&subject, "table", &owned));
    }

    #[test]
    fn test_condition_via_ownership_facts() {
        // No owner reference on the instance, but the subject's ownership
        // facts record the resource
        let profile = UserProfile::named("alice")
            .owning(EntityReference::new("table", "sales.orders"));
        let subject = SubjectContext::new(profile);

        let instance = ResourceInstance {
            name: "sales.orders".to_string(),
            owner: None,
            tags: Vec::new(),
        };
        assert!(RuleCondition::IsOwner.holds(&subject, "table", &instance));

        let other = ResourceInstance {
            name: "sales.refunds".to_string(),
            owner: None,
            tags: Vec::new(),
        };
        assert!(!RuleCondition::IsOwner.holds(&subject, "table", &other));
    }

    #[test]
    fn test_missing_policy_fails_resolution() {
        let snapshot = PolicySnapshot::new()
            .with_role(Role::new("consumer").with_policy("does-not-exist"));

        let role = snapshot.role("consumer").unwrap();
        let err = snapshot.role_policies(role).unwrap_err();
        assert_eq!(
            err,
            AuthError::MissingPolicy {
                role: "consumer".to_string(),
                policy: "does-not-exist".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_snapshot_swap_bumps_version() {
        let store = SnapshotStore::new(PolicySnapshot::new());
        let first = store.current().await;
        assert_eq!(first.version(), 1);

        let version = store.replace(PolicySnapshot::new()).await;
        assert_eq!(version, 2);
        assert_eq!(store.current().await.version(), 2);

        // The handle taken before the swap still sees the old view
        assert_eq!(first.version(), 1);
    }
}
