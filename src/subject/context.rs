//! Resolved subject context: identity plus access-relevant facts

use crate::types::EntityReference;
use serde::{Deserialize, Serialize};

/// Identity facts about an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique principal name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Administrators bypass rule evaluation entirely
    #[serde(default)]
    pub is_admin: bool,

    /// Automated, non-human principal
    #[serde(default)]
    pub is_bot: bool,

    /// Resources owned directly by this user
    #[serde(default)]
    pub owns: Vec<EntityReference>,
}

impl UserProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            is_admin: false,
            is_bot: false,
            owns: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn as_bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// Record an owned resource
    pub fn owning(mut self, resource: EntityReference) -> Self {
        self.owns.push(resource);
        self
    }
}

/// Team membership with the roles the team grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub name: String,

    /// Roles every member of the team holds
    #[serde(default)]
    pub roles: Vec<String>,

    /// Resources owned by the team
    #[serde(default)]
    pub owns: Vec<EntityReference>,
}

impl TeamMembership {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
            owns: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn owning(mut self, resource: EntityReference) -> Self {
        self.owns.push(resource);
        self
    }
}

/// Fully resolved subject: user identity, team/role memberships, flags, and
/// ownership facts. Never mutated in place; the resolver replaces the whole
/// context on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectContext {
    user: UserProfile,
    teams: Vec<TeamMembership>,
    direct_roles: Vec<String>,
}

impl SubjectContext {
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

    pub fn with_teams(mut self, teams: impl IntoIterator<Item = TeamMembership>) -> Self {
        self.teams.extend(teams);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.direct_roles.push(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direct_roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn name(&self) -> &str {
        &self.user.name
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }

    pub fn is_bot(&self) -> bool {
        self.user.is_bot
    }

    pub fn teams(&self) -> &[TeamMembership] {
        &self.teams
    }

    /// Role names in evaluation order: direct roles first, then team roles
    /// in membership order. Order does not imply precedence; it only fixes
    /// the provenance reported for same-effect matches. Duplicates keep
    /// their first occurrence.
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .direct_roles
            .iter()
            .map(String::as_str)
            .chain(
                self.teams
                    .iter()
                    .flat_map(|team| team.roles.iter().map(String::as_str)),
            );
        for name in all {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Whether the given owner reference denotes this subject: the user
    /// itself, or one of its teams.
    pub fn is_owner(&self, owner: &EntityReference) -> bool {
        if owner.is_user() && owner.name == self.user.name {
            return true;
        }
        if owner.is_team() && self.teams.iter().any(|team| team.name == owner.name) {
            return true;
        }
        false
    }

    /// Whether the subject's ownership facts (direct or through a team)
    /// record the given resource.
    pub fn owns_resource(&self, kind: &str, name: &str) -> bool {
        self.user
            .owns
            .iter()
            .chain(self.teams.iter().flat_map(|team| team.owns.iter()))
            .any(|r| r.kind == kind && r.name == name)
    }
}
