//! Core authorization types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reference to a catalog entity (used for owner references and ownership facts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReference {
    /// Stable identifier, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    /// Entity name, unique within its kind
    pub name: String,

    /// Entity kind (user, team, table, ...)
    pub kind: String,
}

impl EntityReference {
    /// Create a reference from kind and name
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Reference to a user principal
    pub fn user(name: impl Into<String>) -> Self {
        Self::new("user", name)
    }

    /// Reference to a team
    pub fn team(name: impl Into<String>) -> Self {
        Self::new("team", name)
    }

    /// Attach a stable identifier
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_user(&self) -> bool {
        self.kind == "user"
    }

    pub fn is_team(&self) -> bool {
        self.kind == "team"
    }

    /// Two references denote the same entity when both ids are known and
    /// equal, or else when kind and name both match.
    pub fn same_entity(&self, other: &EntityReference) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.kind == other.kind && self.name == other.name,
        }
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A catalog operation a rule can allow or deny.
///
/// `All`, `ViewAll`, and `EditAll` are subsuming selectors used inside rules;
/// a resource type's supported set contains only concrete operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    All,
    Create,
    Delete,
    ViewAll,
    ViewBasic,
    ViewUsage,
    ViewQueries,
    EditAll,
    EditDescription,
    EditDisplayName,
    EditOwner,
    EditTags,
    EditCustomFields,
}

impl Operation {
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            Self::ViewAll | Self::ViewBasic | Self::ViewUsage | Self::ViewQueries
        )
    }

    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::EditAll
                | Self::EditDescription
                | Self::EditDisplayName
                | Self::EditOwner
                | Self::EditTags
                | Self::EditCustomFields
        )
    }

    /// Whether a rule listing `self` applies to a request for `requested`.
    ///
    /// `All` covers every operation, `ViewAll` covers the view family,
    /// `EditAll` covers the edit family; anything else requires an exact
    /// match.
    pub fn covers(&self, requested: Operation) -> bool {
        match self {
            Self::All => true,
            Self::ViewAll => requested.is_view(),
            Self::EditAll => requested.is_edit(),
            _ => *self == requested,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "All",
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::ViewAll => "ViewAll",
            Self::ViewBasic => "ViewBasic",
            Self::ViewUsage => "ViewUsage",
            Self::ViewQueries => "ViewQueries",
            Self::EditAll => "EditAll",
            Self::EditDescription => "EditDescription",
            Self::EditDisplayName => "EditDisplayName",
            Self::EditOwner => "EditOwner",
            Self::EditTags => "EditTags",
            Self::EditCustomFields => "EditCustomFields",
        };
        f.write_str(name)
    }
}

/// Rule effect: allow or deny. Immutable once a rule is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    Allow,
    Deny,
}

/// Evaluation outcome for one (resource type, operation) pair.
///
/// `NotAllow` means no rule matched at all; enforcement treats it as a
/// denial, since absence of an explicit allow is not permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Access {
    Allow,
    Deny,
    NotAllow,
}

/// The requested action(s), evaluated together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    operations: Vec<Operation>,
}

impl OperationContext {
    /// Context for a single operation
    pub fn single(operation: Operation) -> Self {
        Self {
            operations: vec![operation],
        }
    }

    /// Context for several operations checked as a unit
    pub fn of(operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

impl From<Operation> for OperationContext {
    fn from(operation: Operation) -> Self {
        Self::single(operation)
    }
}

/// Instance facts for a concrete resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstance {
    /// Resource name (e.g. fully-qualified table name)
    pub name: String,

    /// Owner reference, when one is assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityReference>,

    /// Tags applied to the resource
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ResourceInstance {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Resource description for evaluation.
///
/// An abstract context carries only a resource type and answers "what could
/// this subject ever do to this type" (listing). A concrete context carries
/// instance facts (owner, tags) and is used for enforcement against one
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<ResourceInstance>,
}

impl ResourceContext {
    /// Type-level context for abstract listing
    pub fn abstract_type(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            instance: None,
        }
    }

    /// Instance-level context for enforcement
    pub fn concrete(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            instance: Some(ResourceInstance {
                name: name.into(),
                owner: None,
                tags: Vec::new(),
            }),
        }
    }

    /// Set the instance owner. No effect on abstract contexts.
    pub fn with_owner(mut self, owner: EntityReference) -> Self {
        if let Some(instance) = &mut self.instance {
            instance.owner = Some(owner);
        }
        self
    }

    /// Add an instance tag. No effect on abstract contexts.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        if let Some(instance) = &mut self.instance {
            instance.tags.push(tag.into());
        }
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn instance(&self) -> Option<&ResourceInstance> {
        self.instance.as_ref()
    }

    pub fn is_concrete(&self) -> bool {
        self.instance.is_some()
    }

    /// Short description for error messages: "type" or "type/name"
    pub fn describe(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}/{}", self.resource_type, instance.name),
            None => self.resource_type.clone(),
        }
    }
}
