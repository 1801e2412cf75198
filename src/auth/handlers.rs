use actix_web::{web, HttpResponse};
use tracing::{debug, info};

use crate::AppState;
use crate::auth::gate::CurrentUser;
use crate::auth::service::{LoginRequest, SignupRequest};
use crate::db::UserResponse;
use crate::error::AppError;

pub async fn signup(
    req: web::Json<SignupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    info!("Received signup request for username: {}", req.username);
    let username = req.username.clone();

    match state.auth_service.signup(req).await {
        Ok(resp) => Ok(HttpResponse::Created().json(resp)),
        Err(e) => {
            debug!("Signup failed for username: {}: {}", username, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    info!("Received login request for username: {}", req.username);
    let username = req.username.clone();

    match state.auth_service.login(req).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(resp)),
        Err(e) => {
            debug!("Login failed for username: {}: {}", username, e);
            Err(e)
        }
    }
}

pub async fn profile(CurrentUser(user): CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(user))
}

/// Tokens are stateless, so logging out only acknowledges the request; the
/// client is expected to discard its token.
pub async fn logout(CurrentUser(user): CurrentUser) -> HttpResponse {
    info!("User {} logged out", user.username);
    HttpResponse::Ok().json(serde_json::json!({
        "message": format!("User {} logged out successfully", user.username)
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/profile", web::get().to(profile))
            .route("/logout", web::post().to(logout)),
    );
}
