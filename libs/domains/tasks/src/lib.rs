//! Tasks Domain
//!
//! Task records, their validation rules, the list query engine, dashboard
//! statistics and the HTTP handlers that expose them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← Envelope responses, OpenAPI
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, query parsing, stats
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Trait + MongoDB and in-memory implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tasks::{MongoTaskRepository, TaskService, handlers};
//!
//! # async fn example(db: mongodb::Database) -> Result<(), Box<dyn std::error::Error>> {
//! let repository = MongoTaskRepository::new(&db);
//! repository.create_indexes().await?;
//!
//! let router = handlers::router(TaskService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;
pub mod stats;
pub mod validation;

pub use error::{TaskError, TaskResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryTaskRepository;
pub use models::{
    CreateTask, StatusUpdate, Task, TaskDraft, TaskPatch, TaskPriority, TaskResponse, TaskStatus,
    UpdateTask,
};
pub use crate::mongodb::MongoTaskRepository;
pub use query::{
    PageRequest, Pagination, SortField, SortOrder, TaskFilter, TaskQuery, TaskQueryParams,
    TaskSort,
};
pub use repository::TaskRepository;
pub use service::{TaskPage, TaskService};
pub use stats::{TaskGroupField, TaskStats};
