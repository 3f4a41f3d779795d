//! Registry of resource types and the operations each supports
//!
//! Abstract listing ("what could this subject ever do") iterates this
//! registry; enforcement uses it to resolve the operation set of the
//! requested type. The registry is built once and shared immutably.

use crate::error::{AuthError, Result};
use crate::types::Operation;
use serde::{Deserialize, Serialize};

/// A resource type and the concrete operations it supports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub operations: Vec<Operation>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            operations,
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }
}

/// Immutable catalog of known resource types
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    descriptors: Vec<ResourceDescriptor>,
}

impl ResourceRegistry {
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Registry covering the standard catalog entity types
    pub fn catalog() -> Self {
        use Operation::*;

        // Operations every entity type supports
        let common = || {
            vec![
                Create,
                Delete,
                ViewAll,
                ViewBasic,
                EditAll,
                EditDescription,
                EditDisplayName,
                EditOwner,
                EditTags,
                EditCustomFields,
            ]
        };
        let with = |extra: &[Operation]| {
            let mut ops = common();
            ops.extend_from_slice(extra);
            ops
        };

        Self::new(vec![
            ResourceDescriptor::new("table", with(&[ViewUsage, ViewQueries])),
            ResourceDescriptor::new("database", with(&[ViewUsage])),
            ResourceDescriptor::new("databaseSchema", with(&[ViewUsage])),
            ResourceDescriptor::new("topic", common()),
            ResourceDescriptor::new("dashboard", with(&[ViewUsage])),
            ResourceDescriptor::new("pipeline", common()),
            ResourceDescriptor::new("mlmodel", common()),
            ResourceDescriptor::new("glossary", common()),
            ResourceDescriptor::new("tag", common()),
            ResourceDescriptor::new("user", common()),
            ResourceDescriptor::new("team", common()),
            ResourceDescriptor::new(
                "bot",
                vec![Create, Delete, ViewAll, ViewBasic, EditAll, EditDescription],
            ),
        ])
    }

    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    /// Look up a resource type by name
    pub fn get(&self, name: &str) -> Result<&ResourceDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AuthError::UnknownResourceType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name == name)
    }
}
