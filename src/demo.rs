// Starter tasks offered to a user with an empty list

use crate::models::{Priority, TaskDraft};
use chrono::{Days, NaiveDate};

/// The four demo drafts, with due dates relative to `today`
pub fn drafts(today: NaiveDate) -> Vec<TaskDraft> {
    let due = |days: u64| today.checked_add_days(Days::new(days)).unwrap_or(today);

    vec![
        TaskDraft::new("Complete project proposal")
            .description("Finish the project proposal document and send it for review")
            .category("work")
            .priority(Priority::High)
            .due_date(due(2)),
        TaskDraft::new("Buy groceries")
            .description("Milk, eggs, bread, fruits, and vegetables")
            .category("shopping")
            .priority(Priority::Medium)
            .due_date(due(1)),
        TaskDraft::new("Morning workout")
            .description("30 minutes of cardio and strength training")
            .category("health")
            .priority(Priority::Medium)
            .due_date(today),
        TaskDraft::new("Read book")
            .description("Read at least one chapter of the current book")
            .category("personal")
            .priority(Priority::Low)
            .due_date(due(7)),
    ]
}
