use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use cargoos_core::{SearchQuery, SupplierRecord};
use cargoos_scraper::{SearchError, SearchPipeline};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// Events buffered ahead of a slow SSE client before the search waits.
const STREAM_BUFFER: usize = 32;

fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::InvalidQuery(_) => ApiError::validation(request_id, error),
        _ => ApiError::internal(request_id, error),
    }
}

fn parse_query(
    request_id: &RequestId,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<SearchQuery, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(request_id.0.clone(), &e))?;
    query
        .validate()
        .map_err(|e| ApiError::validation(request_id.0.clone(), &e))?;
    Ok(query)
}

pub(super) async fn search_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<SupplierRecord>>>, ApiError> {
    let query = parse_query(&req_id, query)?;
    let records = state
        .pipeline
        .search_batch(&query, CancellationToken::new())
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(records, req_id.0)))
}

/// SSE: `status: start`, one `item` per record as pages complete, then
/// `status: done`. A run that fails after the stream opened sends an `error`
/// event before `done`.
pub(super) async fn search_stream(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let query = parse_query(&req_id, query)?;

    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(run_stream(Arc::clone(&state.pipeline), query, tx));

    let events = ReceiverStream::new(rx).map(Ok);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn run_stream(pipeline: Arc<SearchPipeline>, query: SearchQuery, tx: mpsc::Sender<Event>) {
    if tx.send(status_event("start")).await.is_err() {
        return;
    }

    let cancel = CancellationToken::new();
    let mut count = 0_usize;
    match pipeline.search_stream(&query, cancel.clone()).await {
        Ok(mut records) => {
            while let Some(record) = records.next().await {
                let event = match Event::default().event("item").json_data(&record) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(url = %record.url, error = %e, "failed to encode stream item");
                        continue;
                    }
                };
                if tx.send(event).await.is_err() {
                    tracing::debug!(q = %query.q, count, "stream client disconnected");
                    cancel.cancel();
                    return;
                }
                count += 1;
            }
        }
        Err(e) => {
            tracing::warn!(q = %query.q, error = %e, "stream search failed");
            let _ = tx.send(Event::default().event("error").data(e.to_string())).await;
        }
    }

    let _ = tx.send(status_event("done")).await;
    tracing::info!(q = %query.q, count, "stream search finished");
}

fn status_event(status: &'static str) -> Event {
    Event::default().event("status").data(status)
}
