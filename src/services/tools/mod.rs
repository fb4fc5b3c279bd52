/*
 * Responsibility
 * - tool (保護対象オペレーション) の定義と登録先 (ToolRegistry)
 * - scope のチェックは guard (ScopeGuard) でラップして行う
 * - 起動時に登録 → 以降は読み取り専用 (Arc<ToolRegistry> として AppState に載せる)
 */
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::extractors::AuthCtx;
use crate::error::{AppError, AuthError, AuthErrorKind};

pub mod builtin;
pub mod guard;

pub use guard::require_scopes;

/// One tool invocation: the request-scoped auth context plus the call arguments.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub auth: Option<AuthCtx>,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(auth: Option<AuthCtx>, arguments: Value) -> Self {
        Self { auth, arguments }
    }

    /// The caller's context, or `AuthenticationRequired` when none was attached.
    pub fn auth(&self) -> Result<&AuthCtx, AuthError> {
        self.auth
            .as_ref()
            .ok_or_else(|| AuthError::new(AuthErrorKind::AuthenticationRequired))
    }

    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    async fn call(&self, call: ToolCall) -> Result<String, AppError>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, AppError>> + Send + 'static,
{
    async fn call(&self, call: ToolCall) -> Result<String, AppError> {
        (self)(call).await
    }
}

#[derive(Clone)]
pub struct Tool {
    name: String,
    title: Option<String>,
    description: String,
    input_schema: Value,
    read_only: bool,
    handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl Tool {
    pub fn new(name: impl Into<String>, handler: impl ToolHandler) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: String::new(),
            input_schema: json!({ "type": "object", "properties": {} }),
            read_only: false,
            handler: Arc::new(handler),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &Value {
        &self.input_schema
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub async fn call(&self, call: ToolCall) -> Result<String, AppError> {
        self.handler.call(call).await
    }
}

/// Tools by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Tool) -> &mut Self {
        match self.tools.iter().position(|t| t.name == tool.name) {
            Some(i) => {
                tracing::warn!(tool = %tool.name, "replacing already registered tool");
                self.tools[i] = tool;
            }
            None => self.tools.push(tool),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
