use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::TaskResult;
use crate::models::{Task, TaskDraft, TaskPatch};
use crate::query::{PageRequest, TaskFilter, TaskSort};
use crate::stats::TaskGroupField;

/// Storage operations the task service depends on.
///
/// Every call is atomic for a single record. Nothing here spans records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a validated draft, assigning id and timestamps.
    async fn create(&self, draft: TaskDraft) -> TaskResult<Task>;

    async fn find_by_id(&self, id: Uuid) -> TaskResult<Task>;

    /// One sorted page of matches plus the total number of matches.
    async fn find_many(
        &self,
        filter: &TaskFilter,
        sort: TaskSort,
        page: PageRequest,
    ) -> TaskResult<(Vec<Task>, u64)>;

    /// Merges `patch`, re-validates the whole record and stores it.
    async fn update_by_id(&self, id: Uuid, patch: TaskPatch) -> TaskResult<Task>;

    async fn delete_by_id(&self, id: Uuid) -> TaskResult<()>;

    /// Counts per distinct value of `field`. Values with no tasks are absent.
    async fn count_by_group(&self, field: TaskGroupField) -> TaskResult<BTreeMap<String, u64>>;

    async fn count_where(&self, filter: &TaskFilter) -> TaskResult<u64>;
}
