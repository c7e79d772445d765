use axum::{Extension, Json, http::StatusCode};

use crate::auth::guards::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::common::UserResponse;

/// GET /auth/me
///
/// Returns the authenticated caller's account.
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> (StatusCode, Json<ApiResponse<UserResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            UserResponse::from(user),
            "User fetched successfully",
        )),
    )
}
