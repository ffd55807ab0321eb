// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::task::{Category, Status, Task};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Due-date window relative to today.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    /// Past due and not completed.
    Overdue,
    Today,
    /// Monday to Sunday of the current week.
    ThisWeek,
    /// After the current week.
    Later,
}

/// Category / due date / search filters of the task views.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub due: Option<DueFilter>,
    #[serde(default)]
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.due.is_none() && self.search_term().is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(category) = self.category {
            if task.category != category {
                return false;
            }
        }

        if let Some(due) = self.due {
            if !due_matches(due, task, today) {
                return false;
            }
        }

        match self.search_term() {
            Some(term) => {
                task.title.to_lowercase().contains(&term)
                    || task.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

fn due_matches(due: DueFilter, task: &Task, today: NaiveDate) -> bool {
    let week = today.week(Weekday::Mon);
    match due {
        DueFilter::Overdue => task.due_date < today && task.status != Status::Completed,
        DueFilter::Today => task.due_date == today,
        DueFilter::ThisWeek => task.due_date >= week.first_day() && task.due_date <= week.last_day(),
        DueFilter::Later => task.due_date > week.last_day(),
    }
}
