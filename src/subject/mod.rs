//! Subject resolution: principal identity to access-relevant facts
//!
//! [`SubjectContext`] is the resolved caller (identity, teams, roles, admin
//! and bot flags, ownership facts). [`SubjectResolver`] produces contexts
//! from a [`SubjectSource`] with a short-TTL cache.

mod context;
mod resolver;

pub use context::{SubjectContext, TeamMembership, UserProfile};
pub use resolver::{
    CacheStats, InMemorySubjectSource, SubjectRecord, SubjectResolver, SubjectSource,
    DEFAULT_CACHE_TTL,
};
