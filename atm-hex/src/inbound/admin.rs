//! Administrator guard for `/api/admin` routes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use atm_types::{AdminQuery, AppError, AtmRepository};

use super::handlers::{ApiError, AppState};

/// Extracts the `adminMobile` query parameter.
fn extract_admin_mobile(request: &Request<Body>) -> Option<String> {
    let Query(query) = Query::<AdminQuery>::try_from_uri(request.uri()).ok()?;
    let mobile = query.admin_mobile.trim();
    (!mobile.is_empty()).then(|| mobile.to_string())
}

/// Resolves `?adminMobile=` to an administrator account.
///
/// - Missing parameter: 401 Unauthorized
/// - Unknown or non-admin mobile: 403 Forbidden
///
/// On success the admin `Account` is placed in the request extensions.
pub async fn admin_guard<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(mobile) = extract_admin_mobile(&request) else {
        return ApiError(AppError::Unauthorized(
            "Missing adminMobile query parameter".into(),
        ))
        .into_response();
    };

    match state.service.require_admin(&mobile).await {
        Ok(admin) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(%mobile, "Admin route refused");
            ApiError(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_admin_mobile() {
        assert_eq!(
            extract_admin_mobile(&request("/api/admin/users?adminMobile=9000000000")),
            Some("9000000000".to_string())
        );
    }

    #[test]
    fn test_extract_admin_mobile_missing() {
        assert_eq!(extract_admin_mobile(&request("/api/admin/users")), None);
        assert_eq!(
            extract_admin_mobile(&request("/api/admin/users?adminMobile=")),
            None
        );
    }
}
