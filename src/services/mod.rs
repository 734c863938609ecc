/*
 * Responsibility
 * - handler から使うドメインサービス (token 検証など)
 */
pub mod auth;
