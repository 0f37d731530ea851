//! List query: filter, sort and page over tasks.

use axum_helpers::FieldViolation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Task, TaskPriority, TaskStatus};
use crate::validation::parse_date;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Raw query string of `GET /tasks`. Empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskQueryParams {
    /// `todo`, `in-progress`, `in-review` or `done`
    pub status: Option<String>,
    /// `LOW`, `MEDIUM` or `HIGH`
    pub priority: Option<String>,
    /// Case-insensitive substring of the assignee
    pub assigned_user: Option<String>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    /// Inclusive lower bound on the due date
    pub due_date_from: Option<String>,
    /// Inclusive upper bound on the due date
    pub due_date_to: Option<String>,
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Page size, 1 to 100
    pub limit: Option<String>,
    /// `createdAt`, `updatedAt`, `dueDate` or `title`
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_order: Option<String>,
}

/// Conjunction of optional constraints. An absent field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_user: Option<String>,
    pub search: Option<String>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    /// Due strictly before this instant and not done.
    pub overdue_at: Option<DateTime<Utc>>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl TaskFilter {
    /// Tasks that are overdue at `now`.
    pub fn overdue(now: DateTime<Utc>) -> Self {
        Self {
            overdue_at: Some(now),
            ..Default::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if let Some(assignee) = &self.assigned_user {
            if !contains_ignore_case(&task.assigned_user, assignee) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let in_title = contains_ignore_case(&task.title, search);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| contains_ignore_case(d, search));
            if !in_title && !in_description {
                return false;
            }
        }
        if self.due_from.is_some() || self.due_to.is_some() {
            let Some(due) = task.due_date else {
                return false;
            };
            if self.due_from.is_some_and(|from| due < from) {
                return false;
            }
            if self.due_to.is_some_and(|to| due > to) {
                return false;
            }
        }
        if let Some(now) = self.overdue_at {
            if !task.is_overdue_at(now) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, ToSchema)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Ordering of a list query. Ties always fall back to id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TaskSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Total order used by the in-memory store. Missing due dates sort
    /// lowest, as in the document store.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::Title => a.title.cmp(&b.title),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_tasks: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: &PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(page.limit);
        Self {
            current_page: page.page,
            total_pages,
            total_tasks: total,
            has_next_page: page.page < total_pages,
            has_prev_page: page.page > 1,
        }
    }
}

/// A validated list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub sort: TaskSort,
    pub page: PageRequest,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

struct Collector(Vec<FieldViolation>);

impl Collector {
    fn parse<T: FromStr>(&mut self, raw: Option<&str>, field: &str, message: &str) -> Option<T> {
        let raw = raw?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.0.push(FieldViolation::new(field, message));
                None
            }
        }
    }

    fn bounded(&mut self, raw: Option<&str>, field: &str, min: u64, max: u64, message: &str) -> Option<u64> {
        let value: u64 = self.parse(raw, field, message)?;
        if (min..=max).contains(&value) {
            Some(value)
        } else {
            self.0.push(FieldViolation::new(field, message));
            None
        }
    }

    fn date(&mut self, raw: Option<&str>, field: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
        let raw = raw?;
        let parsed = parse_date(raw, end_of_day);
        if parsed.is_none() {
            self.0.push(FieldViolation::new(field, format!("{field} must be a valid date")));
        }
        parsed
    }
}

impl TaskQueryParams {
    /// Parses every parameter and reports all bad ones together.
    pub fn into_query(self) -> Result<TaskQuery, Vec<FieldViolation>> {
        let status = present(self.status);
        let priority = present(self.priority);
        let due_date_from = present(self.due_date_from);
        let due_date_to = present(self.due_date_to);
        let page = present(self.page);
        let limit = present(self.limit);
        let sort_by = present(self.sort_by);
        let sort_order = present(self.sort_order);

        let mut c = Collector(Vec::new());

        let status = c.parse(
            status.as_deref(),
            "status",
            "Status must be one of: todo, in-progress, in-review, done",
        );
        let priority = c.parse(
            priority.as_deref(),
            "priority",
            "Priority must be one of: LOW, MEDIUM, HIGH",
        );
        let due_from = c.date(due_date_from.as_deref(), "dueDateFrom", false);
        let due_to = c.date(due_date_to.as_deref(), "dueDateTo", true);
        if let (Some(from), Some(to)) = (due_from, due_to) {
            if from > to {
                c.0.push(FieldViolation::new(
                    "dueDateTo",
                    "dueDateTo must not be before dueDateFrom",
                ));
            }
        }

        let page_number = c.bounded(
            page.as_deref(),
            "page",
            1,
            u64::MAX,
            "Page must be a positive integer",
        );
        let limit = c.bounded(
            limit.as_deref(),
            "limit",
            1,
            MAX_LIMIT,
            "Limit must be an integer between 1 and 100",
        );
        let field = c.parse(
            sort_by.as_deref(),
            "sortBy",
            "sortBy must be one of: createdAt, updatedAt, dueDate, title",
        );
        let order = c.parse(
            sort_order.as_deref(),
            "sortOrder",
            "sortOrder must be one of: asc, desc",
        );

        if !c.0.is_empty() {
            return Err(c.0);
        }

        Ok(TaskQuery {
            filter: TaskFilter {
                status,
                priority,
                assigned_user: present(self.assigned_user),
                search: present(self.search),
                due_from,
                due_to,
                overdue_at: None,
            },
            sort: TaskSort::new(field.unwrap_or_default(), order.unwrap_or_default()),
            page: PageRequest {
                page: page_number.unwrap_or(DEFAULT_PAGE),
                limit: limit.unwrap_or(DEFAULT_LIMIT),
            },
        })
    }
}
