//! HTTP server exposing the task board as a JSON API.
//!
//! Handlers translate requests into lifecycle operations on the shared
//! [`Database`] and map [`TaskError`] onto status codes.

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::archive::TaskView;
use crate::config::ListingConfig;
use crate::db::Database;
use crate::error::{ErrorBody, ErrorCode, TaskError};
use crate::types::{NewTask, Task, TaskPatch, TaskStatus};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    db: Arc<Database>,
    listing: ListingConfig,
}

impl ApiServer {
    pub fn new(db: Arc<Database>, listing: ListingConfig) -> Self {
        Self { db, listing }
    }

    fn view(&self, task: Task) -> TaskView {
        self.db.archive_policy().view(task)
    }

    fn views(&self, tasks: Vec<Task>) -> Vec<TaskView> {
        tasks.into_iter().map(|t| self.view(t)).collect()
    }
}

/// Error returned by handlers.
pub enum ApiError {
    Task(TaskError),
    /// The request body did not deserialize.
    Body(JsonRejection),
    /// A path segment such as the task id did not parse.
    Path(PathRejection),
    /// The query string did not parse.
    Query(QueryRejection),
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        ApiError::Task(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Path(rejection)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Query(rejection)
    }
}

fn rejected(message: String) -> ErrorBody {
    ErrorBody {
        code: ErrorCode::ValidationError,
        message,
        field: None,
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Task(err) => {
                let body = ErrorBody::from(&err);
                if status_for(body.code).is_server_error() {
                    error!(error = %err, "Request failed");
                }
                body
            }
            ApiError::Body(rejection) => rejected(rejection.body_text()),
            ApiError::Path(rejection) => rejected(rejection.body_text()),
            ApiError::Query(rejection) => rejected(rejection.body_text()),
        };
        (status_for(body.code), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Unwrap a JSON body, reporting any rejection as a validation error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    Ok(payload?.0)
}

type TaskId = Result<Path<i64>, PathRejection>;

fn task_id(path: TaskId) -> Result<i64, ApiError> {
    Ok(path?.0)
}

type Page = Result<Query<PageParams>, QueryRejection>;

/// Paging parameters for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub status: TaskStatus,
    pub ordered_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgeResponse {
    pub deleted_count: usize,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_tasks(State(state): State<ApiServer>, page: Page) -> ApiResult<Vec<TaskView>> {
    let Query(page) = page?;
    let limit = page.limit.unwrap_or(state.listing.active_limit);
    let tasks = state.db.list_active(page.skip.unwrap_or(0), limit)?;
    Ok(Json(state.views(tasks)))
}

async fn list_archived(State(state): State<ApiServer>, page: Page) -> ApiResult<Vec<TaskView>> {
    let Query(page) = page?;
    let limit = page.limit.unwrap_or(state.listing.archived_limit);
    let tasks = state.db.list_archived(page.skip.unwrap_or(0), limit)?;
    Ok(Json(state.views(tasks)))
}

async fn create_task(
    State(state): State<ApiServer>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<TaskView> {
    let task = state.db.create_task(body(payload)?)?;
    Ok(Json(state.view(task)))
}

async fn get_task(State(state): State<ApiServer>, path: TaskId) -> ApiResult<TaskView> {
    let task = state.db.get_task(task_id(path)?)?;
    Ok(Json(state.view(task)))
}

async fn update_task(
    State(state): State<ApiServer>,
    path: TaskId,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<TaskView> {
    let id = task_id(path)?;
    let task = state.db.update_task(id, body(payload)?)?;
    Ok(Json(state.view(task)))
}

async fn update_status(
    State(state): State<ApiServer>,
    path: TaskId,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<TaskView> {
    let id = task_id(path)?;
    let update = body(payload)?;
    let task = state.db.update_status(id, update.status)?;
    Ok(Json(state.view(task)))
}

async fn reorder_tasks(
    State(state): State<ApiServer>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<Vec<TaskView>> {
    let request = body(payload)?;
    let tasks = state.db.reorder_tasks(request.status, &request.ordered_ids)?;
    Ok(Json(state.views(tasks)))
}

async fn delete_task(State(state): State<ApiServer>, path: TaskId) -> ApiResult<TaskView> {
    let outcome = state.db.delete_task(task_id(path)?)?;
    Ok(Json(state.view(outcome.into_task())))
}

async fn restore_task(State(state): State<ApiServer>, path: TaskId) -> ApiResult<TaskView> {
    let task = state.db.restore_task(task_id(path)?)?;
    Ok(Json(state.view(task)))
}

async fn purge_archived(State(state): State<ApiServer>) -> ApiResult<PurgeResponse> {
    let deleted_count = state.db.purge_archived()?;
    Ok(Json(PurgeResponse { deleted_count }))
}

async fn list_tags(State(state): State<ApiServer>) -> ApiResult<Vec<String>> {
    Ok(Json(state.db.list_tag_suggestions()?))
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    // The board UI may be served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/", get(list_tasks).post(create_task))
        .route("/tasks/archived", get(list_archived).delete(purge_archived))
        .route("/tasks/reorder", put(reorder_tasks))
        .route(
            "/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{task_id}/status", put(update_status))
        .route("/tasks/{task_id}/restore", put(restore_task))
        .route("/tags", get(list_tags))
        .route("/tags/", get(list_tags))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on `host:port`.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    state: ApiServer,
    host: &str,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task board listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("HTTP server shutting down");
            })
            .await
        {
            error!("HTTP server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr, handle))
}

/// Serve until Ctrl-C.
pub async fn serve(state: ApiServer, host: &str, port: u16) -> anyhow::Result<()> {
    let (shutdown_tx, _addr, handle) = start_server(state, host, port).await?;
    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    handle.await?;
    Ok(())
}
