/*
 * Responsibility
 * - /identities handler (登録 / 一覧ストリーム)
 * - AuthCtxExtractor で認証済みであることを型で受け取る
 * - 一覧は spawn したタスクが registry → channel → response body の順に流す
 */
use std::{future::Future, io, pin::Pin, sync::Arc, time::Duration};

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};

use crate::{
    api::v1::{dto::identities::IdentityResponse, extractors::AuthCtxExtractor},
    repos::{DeliveryError, Identity, IdentityRegistry, IdentitySink},
    state::AppState,
};

const NDJSON: &str = "application/x-ndjson";
const STREAM_BUFFER: usize = 16;

type Chunk = Result<String, io::Error>;

pub async fn add_identity(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> (StatusCode, Json<IdentityResponse>) {
    tracing::info!(name = %ctx.name(), email = %ctx.email(), "add identity requested");

    let identity = state.registry.add().await;

    (StatusCode::CREATED, Json(identity.into()))
}

pub async fn list_identities(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Response {
    let (tx, rx) = mpsc::channel::<Chunk>(STREAM_BUFFER);
    // Separate slot so an abort never queues behind a full data buffer.
    let (abort_tx, abort_rx) = mpsc::channel::<Chunk>(1);
    let registry = Arc::clone(&state.registry);
    let deadline = state.stream_timeout;
    let caller = ctx.email().to_string();

    tokio::spawn(async move {
        let mut sink = ChannelSink { tx };

        match pump(&registry, &mut sink, &abort_tx, deadline).await {
            StreamEnd::Completed(count) => {
                tracing::debug!(caller = %caller, count, "identity stream completed");
            }
            StreamEnd::Aborted(err) => {
                tracing::warn!(caller = %caller, error = %err, "identity stream aborted");
            }
            StreamEnd::DeadlineExceeded => {
                tracing::warn!(caller = %caller, ?deadline, "identity stream deadline exceeded");
            }
        }
    });

    let body = ReceiverStream::new(rx).merge(ReceiverStream::new(abort_rx));

    ([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(body)).into_response()
}

#[derive(Debug)]
enum StreamEnd {
    Completed(usize),
    Aborted(DeliveryError),
    DeadlineExceeded,
}

/// Run one listing into `sink`, bounded by `deadline`.
///
/// Any end other than completion or a vanished receiver pushes an error chunk into
/// `abort`, which makes hyper cut the body instead of ending it cleanly.
async fn pump<S>(
    registry: &IdentityRegistry,
    sink: &mut S,
    abort: &mpsc::Sender<Chunk>,
    deadline: Duration,
) -> StreamEnd
where
    S: IdentitySink,
{
    match tokio::time::timeout(deadline, registry.list(sink)).await {
        Ok(Ok(count)) => StreamEnd::Completed(count),
        Ok(Err(DeliveryError::Closed)) => StreamEnd::Aborted(DeliveryError::Closed),
        Ok(Err(err)) => {
            let _ = abort.try_send(Err(io::Error::other(err.to_string())));
            StreamEnd::Aborted(err)
        }
        Err(_) => {
            let _ = abort.try_send(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "stream deadline exceeded",
            )));
            StreamEnd::DeadlineExceeded
        }
    }
}

/// Feeds listed identities into the response body channel.
struct ChannelSink {
    tx: mpsc::Sender<Chunk>,
}

impl IdentitySink for ChannelSink {
    fn deliver<'a>(
        &'a mut self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        Box::pin(async move {
            let line = IdentityResponse::from(identity.clone())
                .to_ndjson_line()
                .map_err(|e| DeliveryError::Failed(e.to_string()))?;

            self.tx
                .send(Ok(line))
                .await
                .map_err(|_| DeliveryError::Closed)
        })
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
