/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - registry 自体は失敗しない。失敗するのは読み出し結果の配送側 (sink) のみ
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The receiving side went away (client disconnected, call cancelled).
    #[error("delivery sink closed")]
    Closed,
    #[error("delivery failed: {0}")]
    Failed(String),
}
