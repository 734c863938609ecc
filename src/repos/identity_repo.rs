/*
 * Responsibility
 * - 登録済み Identity のインメモリ保持 (プロセス終了で消える)
 * - 複数 reader / 単一 writer の排他 (tokio::sync::RwLock)
 * - 一覧は共有ロック下でコピーした snapshot を sink に 1 件ずつ流す
 */
use std::{future::Future, pin::Pin};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::DeliveryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    fn generate() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
        }
    }
}

/// Receiver of a streamed identity listing.
///
/// - `deliver` hands one item to the caller; an `Err` aborts the listing.
/// - `is_closed` is probed before the lock is taken and before every item, so a
///   cancelled call stops without delivering anything further.
pub trait IdentitySink: Send {
    fn deliver<'a>(
        &'a mut self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;

    fn is_closed(&self) -> bool {
        false
    }
}

/// Volatile, append-only identity registry.
///
/// Constructed once by the app and shared through `AppState`; tests build their own.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    identities: RwLock<Vec<Identity>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new identity with a freshly generated id.
    pub async fn add(&self) -> Identity {
        // id generation happens outside the write lock
        let identity = Identity::generate();

        self.identities.write().await.push(identity.clone());

        tracing::debug!(identity_id = %identity.id, "identity registered");
        identity
    }

    /// Stream every identity registered before shared access was granted, in insertion order.
    ///
    /// Returns the number of delivered items. The first sink failure stops the
    /// iteration and is returned as is.
    pub async fn list<S>(&self, sink: &mut S) -> Result<usize, DeliveryError>
    where
        S: IdentitySink + ?Sized,
    {
        if sink.is_closed() {
            return Err(DeliveryError::Closed);
        }

        let snapshot = self.identities.read().await.clone();

        for identity in &snapshot {
            if sink.is_closed() {
                return Err(DeliveryError::Closed);
            }
            sink.deliver(identity).await?;
        }

        Ok(snapshot.len())
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}
