/*
 * Responsibility
 * - POST /mcp (JSON-RPC 2.0, stateless)
 * - initialize / ping / tools/list / tools/call を dispatch
 * - AuthCtx は middleware が extensions に入れたもの → ToolCall に載せて tool へ渡す
 *
 * Notes
 * - JSON-RPC レベルのエラー (parse / method not found など) は 200 + error object
 * - tool が返す AuthError (scope 不足など) は HTTP エラーとしてそのまま返す (403 + WWW-Authenticate)
 */
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::api::extractors::{AuthCtx, AuthCtxExtractor};
use crate::error::AppError;
use crate::services::tools::ToolCall;
use crate::state::AppState;

use super::dto::{
    CallToolParams, CallToolResult, INVALID_PARAMS, INVALID_REQUEST, InitializeParams,
    JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR, RpcError, RpcRequest, RpcResponse, ToolInfo,
};

const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

pub async fn handle(
    State(state): State<AppState>,
    auth: Option<AuthCtxExtractor>,
    body: Bytes,
) -> Result<Response, AppError> {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "unparsable JSON-RPC body");
            return Ok(rpc_error(Value::Null, RpcError::new(PARSE_ERROR, "Parse error")));
        }
    };

    // id が無い → notification。"id": null は通常の request として扱う
    let is_notification = value.get("id").is_none();
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let req: RpcRequest = match serde_json::from_value(value) {
        Ok(req) => req,
        Err(_) => return Ok(rpc_error(id, RpcError::new(INVALID_REQUEST, "Invalid Request"))),
    };
    if req.jsonrpc != JSONRPC_VERSION {
        return Ok(rpc_error(id, RpcError::new(INVALID_REQUEST, "Invalid Request")));
    }

    if is_notification {
        tracing::debug!(method = %req.method, "notification");
        return Ok(StatusCode::ACCEPTED.into_response());
    }

    let auth = auth.map(|AuthCtxExtractor(ctx)| ctx);
    let outcome = dispatch(&state, auth, &req).await?;

    let response = match outcome {
        Ok(result) => RpcResponse::result(req.id, result),
        Err(error) => RpcResponse::error(req.id, error),
    };
    Ok(Json(response).into_response())
}

fn rpc_error(id: Value, error: RpcError) -> Response {
    Json(RpcResponse::error(id, error)).into_response()
}

/// 外側の Result は HTTP レベルの失敗 (AppError)、内側は JSON-RPC レベルの結果
async fn dispatch(
    state: &AppState,
    auth: Option<AuthCtx>,
    req: &RpcRequest,
) -> Result<Result<Value, RpcError>, AppError> {
    match req.method.as_str() {
        "initialize" => {
            let params: InitializeParams =
                serde_json::from_value(req.params.clone()).unwrap_or_default();
            let protocol_version = params
                .protocol_version
                .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

            Ok(Ok(json!({
                "protocolVersion": protocol_version,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": &*state.server_name,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })))
        }
        "ping" => Ok(Ok(json!({}))),
        "tools/list" => {
            let tools: Vec<ToolInfo<'_>> = state.tools.iter().map(ToolInfo::from).collect();
            Ok(Ok(json!({ "tools": tools })))
        }
        "tools/call" => {
            let params: CallToolParams = match serde_json::from_value(req.params.clone()) {
                Ok(params) => params,
                Err(err) => return Ok(Err(RpcError::new(INVALID_PARAMS, err.to_string()))),
            };

            let Some(tool) = state.tools.get(&params.name) else {
                return Ok(Err(RpcError::new(
                    INVALID_PARAMS,
                    format!("Unknown tool: {}", params.name),
                )));
            };

            tracing::debug!(tool = %params.name, "tools/call");
            let text = tool.call(ToolCall::new(auth, params.arguments)).await?;

            let result = serde_json::to_value(CallToolResult::text(text))
                .map_err(|e| AppError::Internal(e.into()))?;
            Ok(Ok(result))
        }
        other => Ok(Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ))),
    }
}
