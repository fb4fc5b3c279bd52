/*
 * Responsibility
 * - HTTP 側の公開ポイント
 * - mcp: 認証が必要, well_known: 認証不要
 */
pub mod extractors;
pub mod mcp;
pub mod well_known;
