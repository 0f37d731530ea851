//! Field rules for task writes.
//!
//! Inputs are trimmed first, then every rule runs and all violations are
//! returned together.

use axum_helpers::FieldViolation;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::str::FromStr;
use validator::Validate;

use crate::models::{
    CreateTask, StatusUpdate, Task, TaskDraft, TaskPatch, TaskStatus, UpdateTask,
};

const TITLE_REQUIRED: &str = "Task title is required";
const ASSIGNEE_REQUIRED: &str = "Assigned user is required";
const STATUS_INVALID: &str = "Status must be one of: todo, in-progress, in-review, done";
const PRIORITY_INVALID: &str = "Priority must be one of: LOW, MEDIUM, HIGH";
const DUE_DATE_INVALID: &str = "Due date must be a valid date";
const DUE_DATE_PAST: &str = "Due date cannot be in the past";

/// Length bounds for every write path, including the merged record.
#[derive(Validate)]
struct TextFields<'a> {
    #[validate(length(max = 200, message = "Task title cannot exceed 200 characters"))]
    title: Option<&'a str>,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    description: Option<&'a str>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn text_violations(title: Option<&str>, description: Option<&str>) -> Vec<FieldViolation> {
    TextFields { title, description }
        .validate()
        .map(|_| Vec::new())
        .unwrap_or_else(|e| FieldViolation::from_validation_errors(&e))
}

fn parse_enum<T: FromStr>(
    raw: Option<&str>,
    field: &str,
    message: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match T::from_str(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            violations.push(FieldViolation::new(field, message));
            None
        }
    }
}

/// Parses an RFC 3339 timestamp or a calendar date.
///
/// A bare date resolves to the start or the end of that UTC day.
pub fn parse_date(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    } else {
        NaiveTime::MIN
    };
    Some(date.and_time(time).and_utc())
}

fn parse_due_date(
    raw: &str,
    now: DateTime<Utc>,
    violations: &mut Vec<FieldViolation>,
) -> Option<DateTime<Utc>> {
    match parse_date(raw, true) {
        None => {
            violations.push(FieldViolation::new("dueDate", DUE_DATE_INVALID));
            None
        }
        Some(due) if due < now => {
            violations.push(FieldViolation::new("dueDate", DUE_DATE_PAST));
            None
        }
        Some(due) => Some(chrono::SubsecRound::trunc_subsecs(due, 3)),
    }
}

impl CreateTask {
    /// Validates a create request at write time `now`.
    pub fn into_draft(self, now: DateTime<Utc>) -> Result<TaskDraft, Vec<FieldViolation>> {
        let title = trimmed(self.title).unwrap_or_default();
        let description = trimmed(self.description).filter(|d| !d.is_empty());
        let assigned_user = trimmed(self.assigned_user).unwrap_or_default();

        let mut violations = text_violations(Some(&title), description.as_deref());
        if title.is_empty() {
            violations.push(FieldViolation::new("title", TITLE_REQUIRED));
        }
        if assigned_user.is_empty() {
            violations.push(FieldViolation::new("assignedUser", ASSIGNEE_REQUIRED));
        }

        let status = parse_enum(self.status.as_deref(), "status", STATUS_INVALID, &mut violations);
        let priority = parse_enum(
            self.priority.as_deref(),
            "priority",
            PRIORITY_INVALID,
            &mut violations,
        );
        let due_date = self
            .due_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .and_then(|raw| parse_due_date(raw, now, &mut violations));

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(TaskDraft {
            title,
            description,
            status: status.unwrap_or_default(),
            priority: priority.unwrap_or_default(),
            assigned_user,
            due_date,
        })
    }
}

impl UpdateTask {
    /// Validates the supplied fields of an update at write time `now`.
    pub fn into_patch(self, now: DateTime<Utc>) -> Result<TaskPatch, Vec<FieldViolation>> {
        let title = trimmed(self.title);
        let description = trimmed(self.description);
        let assigned_user = trimmed(self.assigned_user);

        let mut violations = text_violations(title.as_deref(), description.as_deref());
        if title.as_deref().is_some_and(str::is_empty) {
            violations.push(FieldViolation::new("title", TITLE_REQUIRED));
        }
        if assigned_user.as_deref().is_some_and(str::is_empty) {
            violations.push(FieldViolation::new("assignedUser", ASSIGNEE_REQUIRED));
        }

        let mut patch = TaskPatch {
            status: parse_enum(self.status.as_deref(), "status", STATUS_INVALID, &mut violations),
            priority: parse_enum(
                self.priority.as_deref(),
                "priority",
                PRIORITY_INVALID,
                &mut violations,
            ),
            ..Default::default()
        };

        if let Some(raw) = self.status.as_deref() {
            if raw.trim().is_empty() {
                violations.push(FieldViolation::new("status", STATUS_INVALID));
            }
        }
        if let Some(raw) = self.priority.as_deref() {
            if raw.trim().is_empty() {
                violations.push(FieldViolation::new("priority", PRIORITY_INVALID));
            }
        }

        patch.due_date = match self.due_date.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(raw) => parse_due_date(raw, now, &mut violations).map(Some),
        };

        if !violations.is_empty() {
            return Err(violations);
        }

        patch.title = title;
        patch.description = description.map(|d| if d.is_empty() { None } else { Some(d) });
        patch.assigned_user = assigned_user;
        Ok(patch)
    }
}

impl StatusUpdate {
    pub fn into_status(self) -> Result<TaskStatus, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        match parse_enum(self.status.as_deref(), "status", STATUS_INVALID, &mut violations) {
            Some(status) => Ok(status),
            None if violations.is_empty() => {
                Err(vec![FieldViolation::new("status", "Status is required")])
            }
            None => Err(violations),
        }
    }
}

/// Entity rules for a complete record, checked after every merge.
///
/// The due date is not re-checked: it only has to be in the future at the
/// moment it is written.
pub fn validate_record(task: &Task) -> Result<(), Vec<FieldViolation>> {
    let mut violations = text_violations(Some(task.title.trim()), task.description.as_deref());

    if task.title.trim().is_empty() {
        violations.push(FieldViolation::new("title", TITLE_REQUIRED));
    }
    if task.assigned_user.trim().is_empty() {
        violations.push(FieldViolation::new("assignedUser", ASSIGNEE_REQUIRED));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
