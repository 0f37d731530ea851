use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{CreateTask, StatusUpdate, Task, TaskPatch, UpdateTask, now_millis};
use crate::query::{Pagination, TaskQueryParams};
use crate::repository::TaskRepository;
use crate::stats::{TaskStats, compute_stats};

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

/// Validates task requests and hands them to the repository.
#[derive(Clone)]
pub struct TaskService<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_task(&self, input: CreateTask) -> TaskResult<Task> {
        let draft = input
            .into_draft(now_millis())
            .map_err(TaskError::Validation)?;

        let task = self.repository.create(draft).await?;
        info!(task_id = %task.id, assigned_user = %task.assigned_user, "Task created");
        Ok(task)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn get_task(&self, id: Uuid) -> TaskResult<Task> {
        self.repository.find_by_id(id).await
    }

    /// Parses the query string and returns the requested page.
    ///
    /// A page past the end is empty, not an error.
    #[instrument(skip(self, params))]
    pub async fn list_tasks(&self, params: TaskQueryParams) -> TaskResult<TaskPage> {
        let query = params.into_query().map_err(TaskError::Validation)?;
        tracing::debug!(filter = ?query.filter, sort = ?query.sort, page = ?query.page, "Listing tasks");

        let (tasks, total) = self
            .repository
            .find_many(&query.filter, query.sort, query.page)
            .await?;

        Ok(TaskPage {
            tasks,
            pagination: Pagination::new(&query.page, total),
        })
    }

    #[instrument(skip(self, input), fields(task_id = %id))]
    pub async fn update_task(&self, id: Uuid, input: UpdateTask) -> TaskResult<Task> {
        let patch = input
            .into_patch(now_millis())
            .map_err(TaskError::Validation)?;

        let task = self.repository.update_by_id(id, patch).await?;
        info!(task_id = %id, "Task updated");
        Ok(task)
    }

    /// Update restricted to `status`. Any status may follow any other.
    #[instrument(skip(self, input), fields(task_id = %id))]
    pub async fn change_status(&self, id: Uuid, input: StatusUpdate) -> TaskResult<Task> {
        let status = input.into_status().map_err(TaskError::Validation)?;

        let task = self
            .repository
            .update_by_id(id, TaskPatch::status_only(status))
            .await?;
        info!(task_id = %id, status = %status, "Task status changed");
        Ok(task)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn delete_task(&self, id: Uuid) -> TaskResult<()> {
        self.repository.delete_by_id(id).await?;
        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Fresh counts on every call.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> TaskResult<TaskStats> {
        compute_stats(self.repository.as_ref(), now_millis()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskDraft, TaskPriority, TaskStatus};
    use crate::query::{PageRequest, SortField, SortOrder, TaskSort};
    use crate::repository::MockTaskRepository;
    use mockall::predicate::*;

    fn stored(draft: TaskDraft) -> Task {
        Task::from_draft(draft, now_millis())
    }

    fn sample_task() -> Task {
        stored(TaskDraft {
            title: "Write docs".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assigned_user: "alice".into(),
            due_date: None,
        })
    }

    #[tokio::test]
    async fn test_create_task_passes_normalized_draft() {
        let mut repo = MockTaskRepository::new();
        repo.expect_create()
            .withf(|draft| {
                draft.title == "Write docs"
                    && draft.assigned_user == "alice"
                    && draft.priority == TaskPriority::Medium
                    && draft.status == TaskStatus::Todo
            })
            .times(1)
            .returning(|draft| Ok(stored(draft)));

        let service = TaskService::new(repo);
        let task = service
            .create_task(CreateTask {
                title: Some(" Write docs ".into()),
                assigned_user: Some("alice".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(task.title, "Write docs");
    }

    #[tokio::test]
    async fn test_create_task_invalid_never_reaches_repository() {
        let mut repo = MockTaskRepository::new();
        repo.expect_create().times(0);

        let service = TaskService::new(repo);
        let err = service
            .create_task(CreateTask::default())
            .await
            .unwrap_err();

        match err {
            TaskError::Validation(violations) => {
                let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
                assert!(fields.contains(&"title"));
                assert!(fields.contains(&"assignedUser"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_task_not_found() {
        let id = Uuid::now_v7();
        let mut repo = MockTaskRepository::new();
        repo.expect_find_by_id()
            .with(eq(id))
            .returning(|id| Err(TaskError::NotFound(id)));

        let service = TaskService::new(repo);
        assert!(matches!(service.get_task(id).await, Err(TaskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_tasks_builds_pagination() {
        let mut repo = MockTaskRepository::new();
        repo.expect_find_many()
            .withf(|filter, sort, page| {
                filter.status == Some(TaskStatus::Todo)
                    && *sort == TaskSort::new(SortField::Title, SortOrder::Asc)
                    && *page == PageRequest { page: 2, limit: 5 }
            })
            .times(1)
            .returning(|_, _, _| Ok((vec![sample_task()], 11)));

        let service = TaskService::new(repo);
        let page = service
            .list_tasks(TaskQueryParams {
                status: Some("todo".into()),
                sort_by: Some("title".into()),
                sort_order: Some("asc".into()),
                page: Some("2".into()),
                limit: Some("5".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total_tasks, 11);
        assert!(page.pagination.has_next_page);
        assert!(page.pagination.has_prev_page);
    }

    #[tokio::test]
    async fn test_list_tasks_rejects_bad_limit() {
        let mut repo = MockTaskRepository::new();
        repo.expect_find_many().times(0);

        let service = TaskService::new(repo);
        let err = service
            .list_tasks(TaskQueryParams {
                limit: Some("0".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(v) if v[0].field == "limit"));
    }

    #[tokio::test]
    async fn test_change_status_sends_status_only_patch() {
        let task = sample_task();
        let id = task.id;
        let mut repo = MockTaskRepository::new();
        repo.expect_update_by_id()
            .with(eq(id), eq(TaskPatch::status_only(TaskStatus::InReview)))
            .times(1)
            .returning(move |_, patch| {
                let mut updated = task.clone();
                updated.apply_patch(patch, now_millis());
                Ok(updated)
            });

        let service = TaskService::new(repo);
        let updated = service
            .change_status(
                id,
                StatusUpdate {
                    status: Some("in-review".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InReview);
    }

    #[tokio::test]
    async fn test_update_task_validation_error() {
        let mut repo = MockTaskRepository::new();
        repo.expect_update_by_id().times(0);

        let service = TaskService::new(repo);
        let err = service
            .update_task(
                Uuid::now_v7(),
                UpdateTask {
                    priority: Some("URGENT".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(v) if v[0].field == "priority"));
    }

    #[tokio::test]
    async fn test_delete_task_propagates_not_found() {
        let mut repo = MockTaskRepository::new();
        repo.expect_delete_by_id()
            .returning(|id| Err(TaskError::NotFound(id)));

        let service = TaskService::new(repo);
        assert!(matches!(
            service.delete_task(Uuid::now_v7()).await,
            Err(TaskError::NotFound(_))
        ));
    }
}
