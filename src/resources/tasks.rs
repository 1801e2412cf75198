use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::auth::Principal;
use crate::error::AppError;

const DEFAULT_STATUS: &str = "todo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TaskCreate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn create_task(
    principal: Principal,
    req: web::Json<TaskCreate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let title = match req.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => return Err(AppError::ValidationError("Title is required".to_string())),
    };

    let now = Utc::now();
    let task = state
        .tasks
        .put_with(|id| Task {
            id,
            title,
            description: req.description.unwrap_or_default(),
            status: req.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            user_id: principal.subject_id,
            created_at: now,
            updated_at: now,
        })
        .await;

    info!("User {} created task {}", principal.username, task.id);
    Ok(HttpResponse::Created().json(task))
}

pub async fn list_tasks(principal: Principal, state: web::Data<AppState>) -> HttpResponse {
    let tasks = state.tasks.query(|t| t.user_id == principal.subject_id).await;
    HttpResponse::Ok().json(tasks)
}

/// Tasks owned by someone else are reported as missing.
pub async fn get_task(
    principal: Principal,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    match state.tasks.get(path.into_inner()).await {
        Some(task) if task.user_id == principal.subject_id => Ok(HttpResponse::Ok().json(task)),
        _ => Err(AppError::NotFound("Task not found".to_string())),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::post().to(create_task))
            .route("/", web::post().to(create_task))
            .route("", web::get().to(list_tasks))
            .route("/", web::get().to(list_tasks))
            .route("/{task_id}", web::get().to(get_task)),
    );
}
