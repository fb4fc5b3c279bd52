/*
 * Responsibility
 * - GET /.well-known/oauth-protected-resource (RFC 9728)
 * - 認証なしで返す (未認証の client が認証方法を知るための endpoint)
 */
use axum::{Json, Router, extract::State, routing::get};

use crate::services::discovery::{ProtectedResourceMetadata, WELL_KNOWN_PATH};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(WELL_KNOWN_PATH, get(protected_resource_metadata))
}

async fn protected_resource_metadata(
    State(state): State<AppState>,
) -> Json<ProtectedResourceMetadata> {
    Json(state.discovery.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request, http::StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::testing::{StaticVerifier, body_json, test_app};

    #[tokio::test]
    async fn test_served_without_authorization() {
        let verifier = StaticVerifier::new();
        let res = test_app(verifier.clone(), None)
            .oneshot(
                Request::builder()
                    .uri("/.well-known/oauth-protected-resource")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            body_json(res).await,
            json!({
                "resource": "https://api.example.com",
                "authorization_servers": ["https://tenant.us.auth0.com"],
                "scopes_supported": [
                    "email", "openid", "profile", "tool:admin", "tool:greet", "tool:whoami"
                ],
                "bearer_methods_supported": ["header"],
                "resource_name": "Example MCP Server"
            })
        );
        assert_eq!(verifier.calls(), 0);
    }
}
