use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted todo record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Apply a partial update in place and refresh `updated_at`
    pub fn apply(&mut self, changes: TodoChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.updated_at = now;
    }
}

/// Fields accepted by the create profile
#[derive(Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// Fields accepted by the update profile; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, utoipa::ToSchema)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Body for the liveness route and for every failed todo operation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response type for successful create and delete operations
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TodoResponse {
    pub message: String,
    pub todo: Todo,
}

/// Response type for successful update operations
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedTodoResponse {
    pub message: String,
    pub updated_todo: Todo,
}
