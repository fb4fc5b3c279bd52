/*
 * Responsibility
 * - MCP endpoint の URL 構造を定義
 * - 認証は app 側で middleware::auth::access::apply を掛ける
 */
use axum::{Router, routing::post};

use crate::state::AppState;

use super::handlers::handle;

pub const MCP_PATH: &str = "/mcp";

pub fn routes() -> Router<AppState> {
    Router::new().route(MCP_PATH, post(handle))
}
