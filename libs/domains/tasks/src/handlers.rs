use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use axum_helpers::{
    ApiJson, ApiQuery, ApiResponse, MessageResponse, UuidPath,
    errors::responses::{
        BadRequestInvalidIdResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::TaskResult;
use crate::models::{
    CreateTask, StatusUpdate, TaskPriority, TaskResponse, TaskStatus, UpdateTask, now_millis,
};
use crate::query::{Pagination, TaskQueryParams};
use crate::repository::TaskRepository;
use crate::service::TaskService;
use crate::stats::TaskStats;

pub const TAG: &str = "tasks";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskData {
    pub task: TaskResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListData {
    pub tasks: Vec<TaskResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskStatsData {
    pub stats: TaskStats,
}

/// OpenAPI documentation for the Tasks API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_tasks,
        create_task,
        task_stats,
        get_task,
        update_task,
        change_status,
        delete_task,
    ),
    components(
        schemas(
            TaskResponse, TaskStatus, TaskPriority, CreateTask, UpdateTask, StatusUpdate,
            Pagination, TaskStats, TaskData, TaskListData, TaskStatsData, MessageResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestInvalidIdResponse,
            ConflictResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Task lifecycle, listing and statistics")
    )
)]
pub struct ApiDoc;

/// Task routes. Authentication is layered on by the caller.
pub fn router<R: TaskRepository + 'static>(service: TaskService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/stats", get(task_stats))
        .route(
            "/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/{id}/status", patch(change_status))
        .with_state(shared_service)
}

/// List tasks with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(TaskQueryParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = ApiResponse<TaskListData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_tasks<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    ApiQuery(params): ApiQuery<TaskQueryParams>,
) -> TaskResult<impl IntoResponse> {
    let page = service.list_tasks(params).await?;
    let now = now_millis();
    let data = TaskListData {
        tasks: page
            .tasks
            .into_iter()
            .map(|task| TaskResponse::at(task, now))
            .collect(),
        pagination: page.pagination,
    };
    Ok(ApiResponse::ok("Tasks retrieved successfully", data))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateTask,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Task created successfully", body = ApiResponse<TaskData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    ApiJson(input): ApiJson<CreateTask>,
) -> TaskResult<impl IntoResponse> {
    let task = service.create_task(input).await?;
    Ok(ApiResponse::ok(
        "Task created successfully",
        TaskData { task: task.into() },
    )
    .with_status(StatusCode::CREATED))
}

/// Task counts by status plus the overdue count
#[utoipa::path(
    get,
    path = "/stats",
    tag = TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task statistics retrieved successfully", body = ApiResponse<TaskStatsData>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn task_stats<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
) -> TaskResult<impl IntoResponse> {
    let stats = service.stats().await?;
    Ok(ApiResponse::ok(
        "Task statistics retrieved successfully",
        TaskStatsData { stats },
    ))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task retrieved successfully", body = ApiResponse<TaskData>),
        (status = 400, response = BadRequestInvalidIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
) -> TaskResult<impl IntoResponse> {
    let task = service.get_task(id).await?;
    Ok(ApiResponse::ok(
        "Task retrieved successfully",
        TaskData { task: task.into() },
    ))
}

/// Update the supplied fields of a task
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task updated successfully", body = ApiResponse<TaskData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
    ApiJson(input): ApiJson<UpdateTask>,
) -> TaskResult<impl IntoResponse> {
    let task = service.update_task(id, input).await?;
    Ok(ApiResponse::ok(
        "Task updated successfully",
        TaskData { task: task.into() },
    ))
}

/// Change only the status of a task
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = StatusUpdate,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task status updated successfully", body = ApiResponse<TaskData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn change_status<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
    ApiJson(input): ApiJson<StatusUpdate>,
) -> TaskResult<impl IntoResponse> {
    let task = service.change_status(id, input).await?;
    Ok(ApiResponse::ok(
        "Task status updated successfully",
        TaskData { task: task.into() },
    ))
}

/// Delete a task permanently
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task deleted successfully", body = MessageResponse),
        (status = 400, response = BadRequestInvalidIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    UuidPath(id): UuidPath,
) -> TaskResult<impl IntoResponse> {
    service.delete_task(id).await?;
    Ok(ApiResponse::message("Task deleted successfully"))
}
