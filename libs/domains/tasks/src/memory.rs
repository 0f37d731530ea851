use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{Task, TaskDraft, TaskPatch, now_millis};
use crate::query::{PageRequest, TaskFilter, TaskSort};
use crate::repository::TaskRepository;
use crate::stats::TaskGroupField;
use crate::validation::validate_record;

/// Process-local task store for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, draft: TaskDraft) -> TaskResult<Task> {
        let task = Task::from_draft(draft, now_millis());
        validate_record(&task).map_err(TaskError::Validation)?;

        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> TaskResult<Task> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound(id))
    }

    async fn find_many(
        &self,
        filter: &TaskFilter,
        sort: TaskSort,
        page: PageRequest,
    ) -> TaskResult<(Vec<Task>, u64)> {
        let tasks = self.tasks.read().await;

        let mut matches: Vec<&Task> = tasks.values().filter(|t| filter.matches(t)).collect();
        matches.sort_by(|a, b| sort.compare(a, b));

        let total = matches.len() as u64;
        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
        let page = matches
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn update_by_id(&self, id: Uuid, patch: TaskPatch) -> TaskResult<Task> {
        let mut tasks = self.tasks.write().await;
        let current = tasks.get(&id).ok_or(TaskError::NotFound(id))?;

        let mut updated = current.clone();
        updated.apply_patch(patch, now_millis());
        validate_record(&updated).map_err(TaskError::Validation)?;

        tasks.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid) -> TaskResult<()> {
        self.tasks
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskError::NotFound(id))
    }

    async fn count_by_group(&self, field: TaskGroupField) -> TaskResult<BTreeMap<String, u64>> {
        let tasks = self.tasks.read().await;
        let mut counts = BTreeMap::new();
        for task in tasks.values() {
            let key = match field {
                TaskGroupField::Status => task.status.to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_where(&self, filter: &TaskFilter) -> TaskResult<u64> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| filter.matches(t)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};
    use crate::query::{SortField, SortOrder};

    fn draft(title: &str, assignee: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assigned_user: assignee.into(),
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let repo = InMemoryTaskRepository::new();
        let created = repo.create(draft("Write docs", "alice")).await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.title, "Write docs");
        assert_eq!(found.created_at, found.updated_at);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft() {
        let repo = InMemoryTaskRepository::new();
        let err = repo.create(draft("", "alice")).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(v) if v[0].field == "title"));
        assert_eq!(repo.count_where(&TaskFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_many_pages_and_counts() {
        let repo = InMemoryTaskRepository::new();
        for i in 0..5 {
            repo.create(draft(&format!("task {i}"), "alice")).await.unwrap();
        }
        repo.create(draft("other", "bob")).await.unwrap();

        let filter = TaskFilter {
            assigned_user: Some("ALI".into()),
            ..Default::default()
        };
        let sort = TaskSort::new(SortField::Title, SortOrder::Asc);

        let (page, total) = repo
            .find_many(&filter, sort, PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(total, 5);
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["task 2", "task 3"]);

        let (beyond, total) = repo
            .find_many(&filter, sort, PageRequest { page: 9, limit: 2 })
            .await
            .unwrap();
        assert!(beyond.is_empty());
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_update_revalidates_and_keeps_record_on_failure() {
        let repo = InMemoryTaskRepository::new();
        let created = repo.create(draft("keep me", "alice")).await.unwrap();

        let err = repo
            .update_by_id(
                created.id,
                TaskPatch {
                    title: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(repo.find_by_id(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_not_found() {
        let repo = InMemoryTaskRepository::new();
        let id = Uuid::now_v7();

        assert!(matches!(
            repo.update_by_id(id, TaskPatch::status_only(TaskStatus::Done)).await,
            Err(TaskError::NotFound(_))
        ));
        assert!(matches!(repo.delete_by_id(id).await, Err(TaskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let repo = InMemoryTaskRepository::new();
        let created = repo.create(draft("gone", "alice")).await.unwrap();

        repo.delete_by_id(created.id).await.unwrap();
        assert!(matches!(
            repo.delete_by_id(created.id).await,
            Err(TaskError::NotFound(id)) if id == created.id
        ));
    }

    #[tokio::test]
    async fn test_count_by_group() {
        let repo = InMemoryTaskRepository::new();
        repo.create(draft("a", "alice")).await.unwrap();
        repo.create(TaskDraft {
            status: TaskStatus::Done,
            ..draft("b", "alice")
        })
        .await
        .unwrap();
        repo.create(draft("c", "bob")).await.unwrap();

        let by_status = repo.count_by_group(TaskGroupField::Status).await.unwrap();
        assert_eq!(by_status.get("todo"), Some(&2));
        assert_eq!(by_status.get("done"), Some(&1));
        assert_eq!(by_status.get("in-review"), None);
    }
}
