use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user::{self, Role};
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// The fully loaded account of the caller, stashed in request extensions
/// by the guards below.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// Helper to extract and validate the AuthUser from request parts and
/// insert it back into the request.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Resolve the token's subject to a live user row. A valid token for a
/// deleted account is still a 401.
async fn load_current_user(
    app_state: &AppState,
    user_id: &str,
) -> Result<user::Model, (StatusCode, Json<ApiResponse<Empty>>)> {
    match user::Model::find_by_id(app_state.db(), user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("User not found")),
        )),
        Err(e) => {
            tracing::warn!(error = %e, user_id, "DB error while loading current user");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Database error while checking user")),
            ))
        }
    }
}

/// Base guard: authenticate, load the account, and optionally require one
/// of the given roles.
async fn allow_role_base(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
    required_roles: &[Role],
    failure_msg: &str,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut req, user) = extract_and_insert_authuser(req).await?;
    let account = load_current_user(&app_state, &user.0.sub).await?;

    if !required_roles.is_empty() && !required_roles.contains(&account.role) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(failure_msg)),
        ));
    }

    req.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(req).await)
}

/// Guard to ensure the request is authenticated (any role).
pub async fn allow_authenticated(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    allow_role_base(State(app_state), req, next, &[], "").await
}

/// Faculty-only guard.
pub async fn allow_faculty(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    allow_role_base(
        State(app_state),
        req,
        next,
        &[Role::Faculty],
        "Only faculty can perform this action",
    )
    .await
}

/// Student-only guard.
pub async fn allow_student(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    allow_role_base(
        State(app_state),
        req,
        next,
        &[Role::Student],
        "Only students can perform this action",
    )
    .await
}

/// Admin-only guard.
pub async fn allow_admin(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    allow_role_base(
        State(app_state),
        req,
        next,
        &[Role::Admin],
        "Admin access required",
    )
    .await
}
