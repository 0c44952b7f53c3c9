use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Comment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub week: Option<i32>,
    pub status: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub company_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TaskCreate {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub week: Option<i32>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

fn default_status() -> String {
    "pendiente".to_string()
}

impl TaskCreate {
    pub fn into_task(self, company_id: String, created_by: String) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4().to_string(),
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            week: self.week,
            status: self.status,
            assigned_to: self.assigned_to,
            comments: Vec::new(),
            company_id,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

/// Optional query-string filters for task listing.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub week: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CommentCreate {
    pub text: String,
}
