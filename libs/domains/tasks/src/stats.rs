use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;
use utoipa::ToSchema;

use crate::error::TaskResult;
use crate::models::TaskStatus;
use crate::query::TaskFilter;
use crate::repository::TaskRepository;

/// Field a grouped count runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskGroupField {
    Status,
}

impl TaskGroupField {
    /// Field name in the document store.
    pub fn storage_key(&self) -> &'static str {
        match self {
            TaskGroupField::Status => "status",
        }
    }
}

/// Dashboard counts, computed on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub overdue: u64,
    /// Statuses with no tasks are omitted
    #[schema(value_type = Object, example = json!({"todo": 3, "done": 1}))]
    pub by_status: BTreeMap<TaskStatus, u64>,
}

impl TaskStats {
    /// Missing statuses count as zero.
    pub fn count_for(&self, status: TaskStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Issues the three counts concurrently against the same repository.
pub async fn compute_stats<R: TaskRepository + ?Sized>(
    repository: &R,
    now: DateTime<Utc>,
) -> TaskResult<TaskStats> {
    let all = TaskFilter::default();
    let overdue_filter = TaskFilter::overdue(now);

    let (total, overdue, groups) = tokio::try_join!(
        repository.count_where(&all),
        repository.count_where(&overdue_filter),
        repository.count_by_group(TaskGroupField::Status),
    )?;

    let mut by_status = BTreeMap::new();
    for (key, count) in groups {
        match TaskStatus::from_str(&key) {
            Ok(status) if count > 0 => {
                by_status.insert(status, count);
            }
            Ok(_) => {}
            Err(_) => warn!(status = %key, count, "Ignoring unknown task status in stats"),
        }
    }

    Ok(TaskStats {
        total,
        overdue,
        by_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockTaskRepository;
    use mockall::predicate::eq;

    #[test]
    fn test_by_status_serializes_with_wire_names() {
        let stats = TaskStats {
            total: 3,
            overdue: 1,
            by_status: BTreeMap::from([(TaskStatus::InProgress, 2), (TaskStatus::Done, 1)]),
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["byStatus"]["in-progress"], 2);
        assert_eq!(json["byStatus"]["done"], 1);
        assert_eq!(stats.count_for(TaskStatus::Todo), 0);
    }

    #[tokio::test]
    async fn test_compute_stats_combines_counts() {
        let now = Utc::now();
        let mut repo = MockTaskRepository::new();

        repo.expect_count_where()
            .with(eq(TaskFilter::default()))
            .times(1)
            .returning(|_| Ok(4));
        repo.expect_count_where()
            .with(eq(TaskFilter::overdue(now)))
            .times(1)
            .returning(|_| Ok(1));
        repo.expect_count_by_group()
            .with(eq(TaskGroupField::Status))
            .times(1)
            .returning(|_| {
                Ok(BTreeMap::from([
                    ("todo".to_string(), 3),
                    ("done".to_string(), 1),
                    ("archived".to_string(), 7),
                ]))
            });

        let stats = compute_stats(&repo, now).await.unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.count_for(TaskStatus::Todo), 3);
        assert_eq!(stats.count_for(TaskStatus::Done), 1);
        assert_eq!(stats.by_status.len(), 2);
        assert_eq!(stats.by_status.values().sum::<u64>(), stats.total);
    }

    #[tokio::test]
    async fn test_compute_stats_propagates_failure() {
        let mut repo = MockTaskRepository::new();
        repo.expect_count_where()
            .returning(|_| Err(crate::error::TaskError::Database("down".into())));
        repo.expect_count_by_group().returning(|_| Ok(BTreeMap::new()));

        let err = compute_stats(&repo, Utc::now()).await.unwrap_err();
        assert!(matches!(err, crate::error::TaskError::Database(_)));
    }
}
