/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: bearer 検証 → AuthCtx 付与 / http: request-id, trace, limit, timeout
 */
pub mod auth;
pub mod http;
