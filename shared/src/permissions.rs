use serde::{Deserialize, Serialize};

use crate::model::Role;

/// Local storage key for the role the viewer picked in settings.
pub const VIEWER_ROLE_KEY: &str = "roster.viewer.role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Member,
    Elder,
    Leadership,
}

impl AccessLevel {
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Leader | Role::CoLeader => Self::Leadership,
            Role::Admin => Self::Elder,
            Role::Member => Self::Member,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Elder => "Elder",
            Self::Leadership => "Leadership",
        }
    }

    pub fn allows(self, action: GuardedAction) -> bool {
        self >= action.required()
    }

    pub fn check(self, action: GuardedAction) -> Result<(), PermissionDenied> {
        if self.allows(action) {
            Ok(())
        } else {
            Err(PermissionDenied { action })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardedAction {
    Export,
    TriggerIngestion,
    EditNotes,
}

impl GuardedAction {
    pub fn required(self) -> AccessLevel {
        match self {
            Self::Export | Self::TriggerIngestion => AccessLevel::Leadership,
            Self::EditNotes => AccessLevel::Elder,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Export => "export the roster",
            Self::TriggerIngestion => "refresh clan data",
            Self::EditNotes => "edit player notes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{} access is required to {}", .action.required().label(), .action.verb())]
pub struct PermissionDenied {
    pub action: GuardedAction,
}
