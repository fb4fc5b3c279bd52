/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: Bearer 検証 (保護対象 routes のみ), challenge: WWW-Authenticate 付与
 * - cors / http: 全 routes 共通
 */
pub mod auth;
pub mod challenge;
pub mod cors;
pub mod http;
