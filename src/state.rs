/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - credentials: token 検証 adapter, tools: 登録済み tool, discovery: 公開する metadata
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - 起動時の登録フェーズが終わってから組み立てる → 以降は読み取り専用
 */
use std::sync::Arc;

use crate::services::auth::CredentialVerifier;
use crate::services::discovery::ProtectedResourceMetadata;
use crate::services::tools::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialVerifier,
    pub tools: Arc<ToolRegistry>,
    pub discovery: Arc<ProtectedResourceMetadata>,
    /// 401 の challenge に付ける resource_metadata (base URL 未設定なら None)
    pub resource_metadata_url: Option<Arc<str>>,
    pub server_name: Arc<str>,
}

impl AppState {
    pub fn new(
        credentials: CredentialVerifier,
        tools: ToolRegistry,
        discovery: ProtectedResourceMetadata,
        resource_metadata_url: Option<String>,
        server_name: &str,
    ) -> Self {
        Self {
            credentials,
            tools: Arc::new(tools),
            discovery: Arc::new(discovery),
            resource_metadata_url: resource_metadata_url.map(Arc::from),
            server_name: Arc::from(server_name),
        }
    }
}
