//! WWW-Authenticate challenge for typed auth errors.
//!
//! `AppError::into_response` leaves the `AuthError` in the response extensions.
//! This stage sits outside every route (including extractor rejections) and turns it
//! into the RFC 6750 / RFC 9728 challenge header. Responses without one (success,
//! generic 500) pass through untouched.

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AuthError;
use crate::state::AppState;

pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(state, challenge_middleware))
}

async fn challenge_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;

    if let Some(err) = res.extensions_mut().remove::<AuthError>() {
        let challenge = err.www_authenticate(state.resource_metadata_url.as_deref());
        let value = HeaderValue::from_str(&challenge).unwrap_or_else(|_| {
            // description に header に載らない文字が含まれていた
            tracing::warn!(%challenge, "challenge is not a valid header value");
            HeaderValue::from_static("Bearer")
        });
        res.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }

    res
}
