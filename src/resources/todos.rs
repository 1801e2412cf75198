use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::auth::Principal;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub owner_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TodoCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

pub async fn example_root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Example Service is running!",
        "endpoints": [
            "GET /example/todos - list your todos (requires auth)",
            "POST /example/todos - create a todo (requires auth)",
            "DELETE /example/todos/{id} - delete one of your todos (requires auth)",
            "GET /example/public - public endpoint (no auth required)"
        ],
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn public_endpoint() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "This is a public endpoint!",
        "anyone_can_access": true,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn list_todos(principal: Principal, state: web::Data<AppState>) -> HttpResponse {
    let todos = state.todos.query(|t| t.owner_id == principal.subject_id).await;
    HttpResponse::Ok().json(todos)
}

pub async fn create_todo(
    principal: Principal,
    req: web::Json<TodoCreate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    if req.title.trim().is_empty() {
        return Err(AppError::ValidationError("Title is required".to_string()));
    }

    let todo = state
        .todos
        .put_with(|id| TodoItem {
            id,
            title: req.title,
            description: req.description,
            completed: false,
            created_at: Utc::now(),
            owner_id: principal.subject_id,
        })
        .await;

    info!("User {} created todo {}", principal.username, todo.id);
    Ok(HttpResponse::Ok().json(todo))
}

pub async fn delete_todo(
    principal: Principal,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let todo_id = path.into_inner();

    match state.todos.remove_if(todo_id, |t| t.owner_id == principal.subject_id).await {
        Ok(Some(todo)) => {
            info!("User {} deleted todo {}", principal.username, todo_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": format!("Todo '{}' deleted successfully", todo.title),
                "deleted_todo_id": todo_id
            })))
        }
        Ok(None) => Err(AppError::NotFound("Todo not found".to_string())),
        Err(_) => Err(AppError::Forbidden("Not your todo".to_string())),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/example")
            .route("", web::get().to(example_root))
            .route("/", web::get().to(example_root))
            .route("/public", web::get().to(public_endpoint))
            .route("/todos", web::get().to(list_todos))
            .route("/todos", web::post().to(create_todo))
            .route("/todos/{todo_id}", web::delete().to(delete_todo)),
    );
}
