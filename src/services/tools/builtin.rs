/*
 * Responsibility
 * - このサーバーが提供する tool の登録 (起動時の登録フェーズで一度だけ呼ぶ)
 * - scope が必要な tool は require_scopes でラップ → ScopeRegistry にも反映される
 */
use serde_json::json;

use crate::error::AppError;
use crate::services::scopes::ScopeRegistry;

use super::{Tool, ToolCall, ToolRegistry, require_scopes};

pub fn register(tools: &mut ToolRegistry, scopes: &mut ScopeRegistry) {
    tools.register(
        Tool::new("get_datetime", get_datetime)
            .title("Get DateTime")
            .description("Returns the current UTC date and time")
            .read_only(),
    );

    tools.register(
        Tool::new("greet", require_scopes(scopes, ["tool:greet"], greet))
            .title("Greet Tool")
            .description("Greets a user")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Who to greet" }
                }
            }))
            .read_only(),
    );

    tools.register(
        Tool::new("whoami", require_scopes(scopes, ["tool:whoami"], whoami))
            .title("Who Am I Tool")
            .description("Returns information about the authenticated user")
            .read_only(),
    );
}

async fn get_datetime(_call: ToolCall) -> Result<String, AppError> {
    Ok(chrono::Utc::now().to_rfc3339())
}

async fn greet(call: ToolCall) -> Result<String, AppError> {
    let name = call
        .str_arg("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("world");
    let auth = call.auth()?;
    // sub は必須 claim だが、extra に無ければ client_id で代用する
    let user_id = auth.extra().sub().unwrap_or(auth.client_id());

    Ok(format!("Hello, {name}! You are authenticated as {user_id}"))
}

async fn whoami(call: ToolCall) -> Result<String, AppError> {
    let auth = call.auth()?;
    let body = json!({
        "user": auth.extra(),
        "scopes": auth.scopes(),
    });

    serde_json::to_string_pretty(&body).map_err(|e| AppError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    use crate::api::extractors::{AuthCtx, ExtraClaims};

    fn caller(scopes: &str) -> AuthCtx {
        let claims = json!({ "sub": "u1", "client_id": "cid1", "email": "u1@example.com" });
        AuthCtx::new("cid1")
            .unwrap()
            .with_scopes(scopes.split_whitespace())
            .with_extra(ExtraClaims::retain_allowed(claims.as_object().unwrap()))
    }

    fn registry() -> (ToolRegistry, ScopeRegistry) {
        let mut tools = ToolRegistry::new();
        let mut scopes = ScopeRegistry::new();
        register(&mut tools, &mut scopes);
        (tools, scopes)
    }

    #[test]
    fn test_registration() {
        let (tools, scopes) = registry();
        assert_eq!(
            tools.iter().map(Tool::name).collect::<Vec<_>>(),
            vec!["get_datetime", "greet", "whoami"]
        );
        assert!(tools.iter().all(Tool::is_read_only));
        assert!(scopes.contains("tool:greet"));
        assert!(scopes.contains("tool:whoami"));
    }

    #[tokio::test]
    async fn test_get_datetime_needs_no_scope() {
        let (tools, _) = registry();
        let out = tools
            .get("get_datetime")
            .unwrap()
            .call(ToolCall::new(Some(caller("")), Value::Null))
            .await
            .unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok());
    }

    #[tokio::test]
    async fn test_greet() {
        let (tools, _) = registry();
        let greet = tools.get("greet").unwrap();

        let out = greet
            .call(ToolCall::new(
                Some(caller("tool:greet")),
                json!({ "name": "  Ada " }),
            ))
            .await
            .unwrap();
        assert_eq!(out, "Hello, Ada! You are authenticated as u1");

        let out = greet
            .call(ToolCall::new(Some(caller("tool:greet")), json!({})))
            .await
            .unwrap();
        assert_eq!(out, "Hello, world! You are authenticated as u1");
    }

    #[tokio::test]
    async fn test_greet_falls_back_to_client_id() {
        let (tools, _) = registry();
        let caller = AuthCtx::new("cid1").unwrap().with_scopes(["tool:greet"]);

        let out = tools
            .get("greet")
            .unwrap()
            .call(ToolCall::new(Some(caller), json!({ "name": "Ada" })))
            .await
            .unwrap();
        assert_eq!(out, "Hello, Ada! You are authenticated as cid1");
    }

    #[tokio::test]
    async fn test_greet_without_scope() {
        let (tools, _) = registry();
        let result = tools
            .get("greet")
            .unwrap()
            .call(ToolCall::new(Some(caller("tool:whoami")), json!({})))
            .await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_whoami() {
        let (tools, _) = registry();
        let out = tools
            .get("whoami")
            .unwrap()
            .call(ToolCall::new(
                Some(caller("tool:whoami tool:greet")),
                Value::Null,
            ))
            .await
            .unwrap();

        let body: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            body,
            json!({
                "user": { "sub": "u1", "client_id": "cid1", "email": "u1@example.com" },
                "scopes": ["tool:greet", "tool:whoami"]
            })
        );
    }
}
