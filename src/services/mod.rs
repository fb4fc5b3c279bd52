/*
 * Responsibility
 * - auth: token 検証 → AuthCtx
 * - scopes / discovery: 公開する scope と metadata
 * - tools: 保護対象の tool と scope guard
 */
pub mod auth;
pub mod discovery;
pub mod scopes;
pub mod tools;
