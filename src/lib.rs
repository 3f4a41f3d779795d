//! # Catalog AuthZ
//!
//! Policy-based authorization engine for metadata catalog services.
//!
//! ## Features
//!
//! - **Deny-overrides evaluation**: any matching DENY rule wins over any
//!   matching ALLOW rule for the same (operation, resource) match
//! - **Abstract and concrete modes**: type-level reports for listing, and
//!   instance-level enforcement considering owner and tag facts
//! - **Explainable decisions**: every report carries the rule, policy, and
//!   role that produced it
//! - **Administrator override**: admin subjects bypass rule evaluation for
//!   every operation and resource
//! - **Bot and PII gates**: password masking and PII access are
//!   subject-level checks layered on top of the rule engine
//! - **Versioned policy snapshots**: copy-on-write policy state, safe for
//!   unlimited concurrent reads
//! - **TTL-bounded subject cache** with explicit invalidation
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use catalog_authz::{
//!     Authorizer, Effect, InMemorySubjectSource, Operation, OperationContext, Policy,
//!     PolicySnapshot, ResourceContext, ResourceRegistry, Role, Rule, SnapshotStore,
//!     SubjectRecord, SubjectResolver, UserProfile,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(InMemorySubjectSource::new());
//!     source
//!         .put(SubjectRecord::new(UserProfile::named("alice")).with_role("data-consumer"))
//!         .await;
//!
//!     let snapshot = PolicySnapshot::new()
//!         .with_role(Role::new("data-consumer").with_policy("consumer-policy"))
//!         .with_policy(Policy::new("consumer-policy").with_rule(
//!             Rule::new("view-everything", Effect::Allow).with_operations([Operation::ViewAll]),
//!         ));
//!
//!     let authorizer = Authorizer::new(
//!         Arc::new(SubjectResolver::new(source)),
//!         Arc::new(SnapshotStore::new(snapshot)),
//!         Arc::new(ResourceRegistry::catalog()),
//!     );
//!
//!     authorizer
//!         .authorize(
//!             Some("alice"),
//!             &OperationContext::single(Operation::ViewBasic),
//!             &ResourceContext::concrete("table", "sales.orders"),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod error;
pub mod evaluator;
pub mod facade;
pub mod metrics;
pub mod policy;
pub mod registry;
pub mod subject;
pub mod types;

// Re-export commonly used types
pub use audit::{AuditEntry, AuditKind, AuditLog};
pub use error::{AuthError, Result};
pub use evaluator::{OperationPermission, PolicyEvaluator, Provenance, ResourcePermission};
pub use facade::Authorizer;
pub use metrics::{EngineMetrics, MetricsCollector};
pub use policy::{Policy, PolicySnapshot, Role, Rule, RuleCondition, SnapshotStore};
pub use registry::{ResourceDescriptor, ResourceRegistry};
pub use subject::{
    CacheStats, InMemorySubjectSource, SubjectContext, SubjectRecord, SubjectResolver,
    SubjectSource, TeamMembership, UserProfile,
};
pub use types::{
    Access, Effect, EntityReference, Operation, OperationContext, ResourceContext,
    ResourceInstance,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
