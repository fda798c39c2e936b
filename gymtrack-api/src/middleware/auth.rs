/// Bearer token authentication layer
///
/// Runs in front of every member route. On success the caller's
/// `AuthContext` is inserted into request extensions; handlers pick it up
/// with `Extension<AuthContext>`.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gymtrack_shared::auth::middleware::authenticate;

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    tracing::Span::current().record("user_id", tracing::field::display(auth_context.user_id));
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
