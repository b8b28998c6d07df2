//! Quest snapshots.

use serde::{Deserialize, Serialize};

/// Identifier for quests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub String);

impl From<&str> for QuestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

impl Quest {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: QuestId(id.into()),
            title: title.into(),
            description: None,
            status: QuestStatus::Active,
            objectives: Vec::new(),
        }
    }

    pub fn with_objective(mut self, description: impl Into<String>) -> Self {
        self.objectives.push(Objective {
            description: description.into(),
            completed: false,
        });
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    /// Objectives not yet completed, in declaration order.
    pub fn open_objectives(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.iter().filter(|o| !o.completed)
    }
}
