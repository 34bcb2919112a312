use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{services::auth::AuthService, AppState};

/// Optional authentication middleware - extracts user info if present but doesn't require it
pub async fn optional_auth_middleware(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        match AuthService::verify_token(bearer.token(), &app_state.config.jwt) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(reason) => {
                tracing::debug!("忽略无效令牌: {}", reason);
            }
        }
    }

    next.run(req).await
}
