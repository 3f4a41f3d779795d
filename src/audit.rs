//! Audit journal for authorization-relevant events
//!
//! Denials and admin subject substitutions are recorded in a bounded
//! in-memory journal and emitted as tracing events, so embedding services
//! can forward them. The journal is observability, not part of the decision
//! contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default journal capacity
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// An operation was denied
    Denial,
    /// An administrator resolved another identity's context
    AdminSubstitution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub kind: AuditKind,
    pub principal: String,
    pub detail: String,
}

/// Bounded in-memory journal; oldest entries are dropped at capacity
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn record_denial(&self, principal: &str, detail: &str) {
        warn!(principal, detail, "authorization denied");
        self.push(AuditKind::Denial, principal, detail.to_string())
            .await;
    }

    pub async fn record_substitution(&self, principal: &str, target: &str) {
        debug!(principal, target, "subject context substituted");
        self.push(
            AuditKind::AdminSubstitution,
            principal,
            format!("resolved permissions as '{target}'"),
        )
        .await;
    }

    async fn push(&self, kind: AuditKind, principal: &str, detail: String) {
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(AuditEntry {
            id: Uuid::new_v4(),
            at: Utc::now(),
            kind,
            principal: principal.to_string(),
            detail,
        });
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, n: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(n).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}
