// Data models for tasktrack

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single trackable to-do item owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_due_date"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

/// Task category. The well-known values get their own variants; anything
/// else a caller supplies is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    #[default]
    Other,
    Custom(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Other => "other",
            Category::Custom(s) => s,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "work" => Category::Work,
            "personal" => Category::Personal,
            "shopping" => Category::Shopping,
            "health" => Category::Health,
            "other" => Category::Other,
            _ => Category::Custom(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {} (expected high, medium or low)", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller input for `TaskStore::create`
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Field changes for `TaskStore::update`
///
/// `id`, `created_at` and `user_id` have no counterpart here: they cannot be
/// changed after creation. `due_date` is doubly optional so a patch can
/// clear it (`Some(None)`) as well as leave it alone (`None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into a task. Title and description are trimmed.
    pub(crate) fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            task.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Completion statistics over a user's tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

// Browser forms wrote "" for "no due date"
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
