// Query filtering for tasks

use crate::models::{Category, Priority, Task};
use std::fmt;
use std::str::FromStr;

/// Sentinel accepted by the category and priority selectors meaning "no filter"
pub const ALL: &str = "all";

/// Completion status criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    fn matches(self, completed: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => completed,
            StatusFilter::Pending => !completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            ALL => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            other => Err(format!("unknown status: {} (expected all, completed or pending)", other)),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Completed => write!(f, "completed"),
            StatusFilter::Pending => write!(f, "pending"),
        }
    }
}

/// Filter criteria for `TaskStore::query`
///
/// A task passes when every supplied criterion matches. `None` selectors and
/// an empty search term impose nothing. The search term is matched
/// case-insensitively as a substring of the title or the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: StatusFilter,
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Category selector from a form value, where "all" means no filter
    pub fn category_selector(value: &str) -> Option<Category> {
        if value.eq_ignore_ascii_case(ALL) {
            None
        } else {
            Some(Category::from(value))
        }
    }

    /// Priority selector from a form value, where "all" means no filter
    pub fn priority_selector(value: &str) -> Result<Option<Priority>, String> {
        if value.eq_ignore_ascii_case(ALL) {
            Ok(None)
        } else {
            value.parse().map(Some)
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.category.as_ref().is_some_and(|c| task.category != *c) {
            return false;
        }

        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }

        if !self.status.matches(task.completed) {
            return false;
        }

        match self.search_term() {
            Some(term) => {
                task.title.to_lowercase().contains(&term) || task.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    /// Filter and order tasks, newest-created first
    ///
    /// The sort is stable, so tasks with equal `created_at` keep their
    /// input order.
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut results: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).cloned().collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}
