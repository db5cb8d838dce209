// Chunked JSON streaming utilities
use crate::infrastructure::broadcast_surface::{BroadcastSurface, DashboardView, DisplayUpdate};
use async_compression::tokio::bufread::BrotliEncoder;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// One frame of the dashboard stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum StreamFrame {
    Snapshot(DashboardView),
    Update(DisplayUpdate),
}

/// Create a chunked streaming response of length-prefixed JSON frames
pub async fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StreamFrame> + Send + 'static,
{
    let byte_stream = stream.then(move |frame| async move { serialize_chunk(frame, compress).await });

    let body = Body::from_stream(byte_stream);

    // Frames are compressed one by one, so the response itself carries no
    // Content-Encoding.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-dashboard-frames")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single frame to a chunk: 4-byte big-endian length, then payload
pub async fn serialize_chunk(frame: StreamFrame, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&frame).map_err(std::io::Error::other)?;

    let payload = if compress {
        let cursor = std::io::Cursor::new(json);
        let mut encoder = BrotliEncoder::new(cursor);
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await?;
        compressed
    } else {
        json
    };

    let length = payload.len() as u32;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream the current view, then every update. A client that falls behind
/// the broadcast gets a fresh snapshot instead of the missed updates.
pub fn dashboard_frames(surface: Arc<BroadcastSurface>) -> impl Stream<Item = StreamFrame> + Send + 'static {
    async_stream::stream! {
        let (view, rx) = surface.subscribe();
        yield StreamFrame::Snapshot(view);

        let mut updates = BroadcastStream::new(rx);
        while let Some(update) = updates.next().await {
            match update {
                Ok(update) => yield StreamFrame::Update(update),
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    tracing::debug!("Stream client lagged by {} updates, resending snapshot", missed);
                    yield StreamFrame::Snapshot(surface.view());
                }
            }
        }
    }
}

/// Helper to create a streaming response for the dashboard
pub async fn stream_from_surface(surface: Arc<BroadcastSurface>, compress: bool) -> impl IntoResponse {
    match chunked_json_stream(dashboard_frames(surface), compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::display::{DisplaySurface, ReadoutKey};
    use crate::domain::status::ConnectionStatus;
    use crate::infrastructure::config::default_charts;
    use async_compression::tokio::bufread::BrotliDecoder;

    #[tokio::test]
    async fn test_chunk_is_length_prefixed_json() {
        let frame = StreamFrame::Update(DisplayUpdate::Status(ConnectionStatus::Connected.into()));
        let chunk = serialize_chunk(frame, false).await.unwrap();

        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length, chunk.len() - 4);
        let json: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(json["kind"], "update");
        assert_eq!(json["payload"]["type"], "status");
        assert_eq!(json["payload"]["text"], "Connected");
    }

    #[tokio::test]
    async fn test_compressed_chunk_round_trips() {
        let frame = StreamFrame::Update(DisplayUpdate::Readout {
            key: ReadoutKey::Distance,
            text: "12 cm".to_string(),
        });
        let chunk = serialize_chunk(frame, true).await.unwrap();

        let mut decoder = BrotliDecoder::new(std::io::Cursor::new(chunk[4..].to_vec()));
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(json["payload"]["text"], "12 cm");
    }

    #[tokio::test]
    async fn test_frames_start_with_snapshot() {
        let surface = Arc::new(BroadcastSurface::new(&default_charts()));
        let frames = dashboard_frames(surface.clone());
        futures::pin_mut!(frames);

        assert!(matches!(frames.next().await, Some(StreamFrame::Snapshot(_))));
        surface.write_status(ConnectionStatus::Connected);
        match frames.next().await {
            Some(StreamFrame::Update(DisplayUpdate::Status(status))) => {
                assert_eq!(status.state, ConnectionStatus::Connected)
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lagging_client_gets_fresh_snapshot() {
        let surface = Arc::new(BroadcastSurface::new(&default_charts()));
        let frames = dashboard_frames(surface.clone());
        futures::pin_mut!(frames);

        assert!(matches!(frames.next().await, Some(StreamFrame::Snapshot(_))));
        for _ in 0..300 {
            surface.write_status(ConnectionStatus::Connected);
        }
        surface.write_text(ReadoutKey::Sound, "41 dB".to_string());

        match frames.next().await {
            Some(StreamFrame::Snapshot(view)) => {
                assert_eq!(view.status.state, ConnectionStatus::Connected);
                assert_eq!(view.readouts[&ReadoutKey::Sound], "41 dB");
            }
            other => panic!("expected snapshot after lag, got {:?}", other),
        }
    }
}
