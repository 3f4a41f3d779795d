//! Subject resolution with TTL caching
//!
//! Turns a principal identity into a fully populated [`SubjectContext`] by
//! consulting a [`SubjectSource`]. Contexts may be served from a short-lived
//! cache; a stale entry could grant or withhold privilege incorrectly, so the
//! TTL defaults short and every role/team/flag update must call
//! [`SubjectResolver::invalidate`].

use crate::error::{AuthError, Result};
use crate::subject::context::{SubjectContext, TeamMembership, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default subject cache TTL
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Raw subject facts as loaded from persistence
#[derive(Debug, Clone)]
pub struct SubjectRecord {
    pub user: UserProfile,
    pub teams: Vec<TeamMembership>,
    pub direct_roles: Vec<String>,
}

impl SubjectRecord {
    pub fn new(user: UserProfile) -> Self {
        Self {
            user,
            teams: Vec::new(),
            direct_roles: Vec::new(),
        }
    }

    pub fn with_team(mut self, team: TeamMembership) -> Self {
        self.teams.push(team);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.direct_roles.push(role.into());
        self
    }
}

/// Persistence lookup for subject data
#[async_trait]
pub trait SubjectSource: Send + Sync {
    /// Load the current stored state for an identity
    async fn load_subject(&self, identity: &str) -> Result<SubjectRecord>;
}

/// In-memory subject source for tests and embedded setups
pub struct InMemorySubjectSource {
    records: RwLock<HashMap<String, SubjectRecord>>,
}

impl InMemorySubjectSource {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a record, keyed by the user's name
    pub async fn put(&self, record: SubjectRecord) {
        let mut records = self.records.write().await;
        records.insert(record.user.name.clone(), record);
    }

    pub async fn remove(&self, identity: &str) {
        let mut records = self.records.write().await;
        records.remove(identity);
    }
}

impl Default for InMemorySubjectSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubjectSource for InMemorySubjectSource {
    async fn load_subject(&self, identity: &str) -> Result<SubjectRecord> {
        let records = self.records.read().await;
        records
            .get(identity)
            .cloned()
            .ok_or_else(|| AuthError::UnknownSubject(identity.to_string()))
    }
}

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    fn get(&self) -> Option<&T> {
        if self.is_expired() {
            None
        } else {
            Some(&self.value)
        }
    }
}

/// Statistics about subject cache performance
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expirations: usize,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Resolves principal identities into subject contexts.
///
/// Thread-safe for unlimited concurrent resolution; the cache is keyed by
/// identity and bounded by TTL, not size (the identity population is the
/// active-user set).
pub struct SubjectResolver {
    source: Arc<dyn SubjectSource>,
    cache: DashMap<String, CacheEntry<Arc<SubjectContext>>>,
    ttl: Duration,
    stats: DashMap<String, usize>,
}

impl SubjectResolver {
    pub fn new(source: Arc<dyn SubjectSource>) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(source: Arc<dyn SubjectSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            ttl,
            stats: DashMap::new(),
        }
    }

    /// Resolve an authenticated identity into a subject context.
    ///
    /// Fails with [`AuthError::NotAuthenticated`] when no identity is
    /// present, before any lookup or rule evaluation happens.
    pub async fn resolve(&self, identity: Option<&str>) -> Result<Arc<SubjectContext>> {
        let identity = match identity {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(AuthError::NotAuthenticated),
        };

        if let Some(entry) = self.cache.get(identity) {
            if let Some(context) = entry.get() {
                self.increment_stat("hits");
                debug!(identity, "subject cache hit");
                return Ok(context.clone());
            }
            self.increment_stat("expirations");
        } else {
            self.increment_stat("misses");
        }

        let record = self.source.load_subject(identity).await?;
        let context = Arc::new(
            SubjectContext::new(record.user)
                .with_teams(record.teams)
                .with_roles(record.direct_roles),
        );

        self.cache.insert(
            identity.to_string(),
            CacheEntry::new(context.clone(), self.ttl),
        );
        debug!(identity, "subject context resolved");

        Ok(context)
    }

    /// Drop the cached context for one identity. Must be called on any
    /// update to the underlying user's roles, teams, or flags.
    pub fn invalidate(&self, identity: &str) {
        self.cache.remove(identity);
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    /// Remove expired entries
    pub fn cleanup_expired(&self) {
        self.cache.retain(|_, entry| !entry.is_expired());
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            expirations: self.get_stat("expirations"),
            entries: self.cache.len(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}
