// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::bucket::{bucket_key_of, label_of};
use crate::error::BoardError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Activity actions written into a task's log.
pub const ACTION_TASK_CREATED: &str = "Task Created";
pub const ACTION_TASK_UPDATED: &str = "Task Updated";
pub const ACTION_STATUS_UPDATED: &str = "Status Updated";

/// Display status of a task. Serialized as its label (`"TO-DO"`, ...).
///
/// Parsing goes through [`bucket_key_of`], so any spelling that normalizes
/// to a known bucket key is accepted and everything else is rejected.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum Status {
    #[serde(rename = "TO-DO")]
    Todo,
    #[serde(rename = "IN-PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Completed];

    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "TO-DO",
            Status::InProgress => "IN-PROGRESS",
            Status::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        bucket_key_of(s).map(label_of)
    }
}

impl TryFrom<String> for Status {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum Category {
    Work,
    Personal,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            _ => Err(BoardError::UnknownCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One entry of a task's append-only activity log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub performed_by: String,
}

impl Activity {
    pub fn now(action: &str, performed_by: &str) -> Self {
        Self {
            action: action.to_string(),
            timestamp: Utc::now(),
            performed_by: performed_by.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub url: String,
}

/// A task as stored and as held on the board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    // Only the calendar day matters for a due date.
    pub due_date: NaiveDate,
    pub status: Status,
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub user_id: String,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

/// Payload for creating a task. The store assigns the id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub due_date: NaiveDate,
    #[serde(default = "default_status")]
    pub status: Status,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

fn default_status() -> Status {
    Status::Todo
}

impl NewTask {
    /// Checks the creation form rules against `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), BoardError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        if self.due_date < today {
            return Err(BoardError::invalid("dueDate", "cannot be in the past"));
        }
        Ok(())
    }

    /// Builds the task the store persisted under `id`.
    pub fn into_task(self, id: String, user_id: &str, activities: Vec<Activity>) -> Task {
        Task {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category,
            due_date: self.due_date,
            status: self.status,
            activities,
            user_id: user_id.to_string(),
            files: self.files,
        }
    }
}

/// Partial update. Absent fields are left untouched by the store.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
}

impl TaskPatch {
    /// The patch a drag transition persists: `{status}` and nothing else.
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validates the edited fields only.
    pub fn validate(&self) -> Result<(), BoardError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Applies the present fields to `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(activities) = &self.activities {
            task.activities = activities.clone();
        }
        if let Some(files) = &self.files {
            task.files = files.clone();
        }
    }
}

fn validate_title(title: &str) -> Result<(), BoardError> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN_CHARS {
        return Err(BoardError::invalid(
            "title",
            format!("must be at least {TITLE_MIN_CHARS} characters"),
        ));
    }
    if len > TITLE_MAX_CHARS {
        return Err(BoardError::invalid(
            "title",
            format!("must be less than {TITLE_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), BoardError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(BoardError::invalid(
            "description",
            format!("must be less than {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}
