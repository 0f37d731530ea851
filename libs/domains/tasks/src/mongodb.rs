//! MongoDB implementation of TaskRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus, now_millis};
use crate::query::{PageRequest, SortField, SortOrder, TaskFilter, TaskSort};
use crate::repository::TaskRepository;
use crate::stats::TaskGroupField;
use crate::validation::validate_record;

pub const COLLECTION: &str = "tasks";

/// Read-merge-replace rounds before an update gives up on a busy record.
const UPDATE_ATTEMPTS: u32 = 3;

/// Stored shape of a task. Ids are kept as strings so `_id` order is the
/// UUIDv7 order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: bson::DateTime) -> TaskResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| TaskError::Internal(format!("Stored timestamp out of range: {dt}")))
}

impl From<&Task> for TaskDocument {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assigned_user: task.assigned_user.clone(),
            due_date: task.due_date.map(to_bson_datetime),
            created_at: to_bson_datetime(task.created_at),
            updated_at: to_bson_datetime(task.updated_at),
        }
    }
}

impl TryFrom<TaskDocument> for Task {
    type Error = TaskError;

    fn try_from(doc: TaskDocument) -> TaskResult<Self> {
        let id = Uuid::parse_str(&doc.id)
            .map_err(|e| TaskError::Internal(format!("Stored task id {} is invalid: {e}", doc.id)))?;
        Ok(Self {
            id,
            title: doc.title,
            description: doc.description,
            status: doc.status,
            priority: doc.priority,
            assigned_user: doc.assigned_user,
            due_date: doc.due_date.map(from_bson_datetime).transpose()?,
            created_at: from_bson_datetime(doc.created_at)?,
            updated_at: from_bson_datetime(doc.updated_at)?,
        })
    }
}

/// MongoDB-based task repository
#[derive(Clone)]
pub struct MongoTaskRepository {
    collection: Collection<TaskDocument>,
}

impl MongoTaskRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }

    /// Indexes backing the assignee/status filter and the date sorts.
    pub async fn create_indexes(&self) -> TaskResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "assigned_user": 1, "status": 1 })
                .build(),
            IndexModel::builder().keys(doc! { "due_date": 1 }).build(),
            IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    /// Translates a filter into a query document.
    pub fn build_filter(filter: &TaskFilter) -> Document {
        let mut query = Document::new();

        let mut status = Document::new();
        if let Some(value) = filter.status {
            status.insert("$eq", value.to_string());
        }
        if filter.overdue_at.is_some() {
            status.insert("$ne", TaskStatus::Done.to_string());
        }
        match (filter.overdue_at, filter.status) {
            (None, Some(value)) => {
                query.insert("status", value.to_string());
            }
            (Some(_), _) => {
                query.insert("status", status);
            }
            (None, None) => {}
        }

        if let Some(priority) = filter.priority {
            query.insert("priority", priority.to_string());
        }

        if let Some(assignee) = &filter.assigned_user {
            query.insert("assigned_user", doc! { "$regex": literal_pattern(assignee) });
        }

        if let Some(search) = &filter.search {
            let pattern = literal_pattern(search);
            query.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": pattern.clone() } },
                    doc! { "description": { "$regex": pattern } },
                ],
            );
        }

        let mut due = Document::new();
        if let Some(from) = filter.due_from {
            due.insert("$gte", to_bson_datetime(from));
        }
        if let Some(to) = filter.due_to {
            due.insert("$lte", to_bson_datetime(to));
        }
        if let Some(now) = filter.overdue_at {
            due.insert("$lt", to_bson_datetime(now));
        }
        if !due.is_empty() {
            query.insert("due_date", due);
        }

        query
    }

    /// Sort key followed by `_id` ascending.
    pub fn sort_document(sort: TaskSort) -> Document {
        let field = match sort.field {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DueDate => "due_date",
            SortField::Title => "title",
        };
        let direction = match sort.order {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        let mut sort = Document::new();
        sort.insert(field, direction);
        sort.insert("_id", 1);
        sort
    }

    /// Matches the record only while it still carries the `updated_at` that
    /// was read, so a replace never overwrites a concurrent write.
    pub fn versioned_filter(id: Uuid, read_updated_at: DateTime<Utc>) -> Document {
        doc! {
            "_id": id.to_string(),
            "updated_at": to_bson_datetime(read_updated_at),
        }
    }

    /// Find options for one page, or `None` when the page starts past the
    /// last match.
    pub fn page_options(sort: TaskSort, page: PageRequest, total: u64) -> Option<FindOptions> {
        let skip = page.skip();
        if skip >= total {
            return None;
        }
        let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
        Some(
            FindOptions::builder()
                .sort(Self::sort_document(sort))
                .skip(skip)
                .limit(limit)
                .build(),
        )
    }
}

/// Case-insensitive pattern matching `text` literally.
fn literal_pattern(text: &str) -> String {
    format!("(?i){}", regex::escape(text))
}

fn count_value(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n >= 0.0 => *n as u64,
        _ => 0,
    }
}

#[async_trait]
impl TaskRepository for MongoTaskRepository {
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create(&self, draft: TaskDraft) -> TaskResult<Task> {
        let task = Task::from_draft(draft, now_millis());
        validate_record(&task).map_err(TaskError::Validation)?;

        self.collection.insert_one(TaskDocument::from(&task)).await?;
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> TaskResult<Task> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await?
            .ok_or(TaskError::NotFound(id))?
            .try_into()
    }

    #[instrument(skip(self, filter))]
    async fn find_many(
        &self,
        filter: &TaskFilter,
        sort: TaskSort,
        page: PageRequest,
    ) -> TaskResult<(Vec<Task>, u64)> {
        let query = Self::build_filter(filter);
        let total = self.collection.count_documents(query.clone()).await?;
        let Some(options) = Self::page_options(sort, page, total) else {
            return Ok((Vec::new(), total));
        };

        let cursor = self.collection.find(query).with_options(options).await?;
        let documents: Vec<TaskDocument> = cursor.try_collect().await?;
        let tasks = documents
            .into_iter()
            .map(Task::try_from)
            .collect::<TaskResult<Vec<_>>>()?;

        Ok((tasks, total))
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(&self, id: Uuid, patch: TaskPatch) -> TaskResult<Task> {
        for attempt in 1..=UPDATE_ATTEMPTS {
            let mut task = self.find_by_id(id).await?;
            let read_updated_at = task.updated_at;
            task.apply_patch(patch.clone(), now_millis());
            validate_record(&task).map_err(TaskError::Validation)?;

            let result = self
                .collection
                .replace_one(
                    Self::versioned_filter(id, read_updated_at),
                    TaskDocument::from(&task),
                )
                .await?;
            if result.matched_count == 1 {
                return Ok(task);
            }
            debug!(attempt, "Task changed since it was read, retrying update");
        }
        Err(TaskError::Conflict(id))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> TaskResult<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await?;
        if result.deleted_count == 0 {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_by_group(&self, field: TaskGroupField) -> TaskResult<BTreeMap<String, u64>> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": format!("${}", field.storage_key()),
                "count": { "$sum": 1 },
            }
        }];

        let groups: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;

        let counts = groups
            .iter()
            .filter_map(|group| {
                let key = group.get_str("_id").ok()?;
                Some((key.to_string(), count_value(group.get("count"))))
            })
            .collect();
        Ok(counts)
    }

    #[instrument(skip(self, filter))]
    async fn count_where(&self, filter: &TaskFilter) -> TaskResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(filter))
            .await?;
        Ok(count)
    }
}
