// Chunked JSON streaming utilities
use crate::application::annotation_service::AnnotationMessage;
use crate::infrastructure::http_response::{brotli_compress, JSON_CONTENT_TYPE};
use crate::infrastructure::json_mapper::message_to_dto;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;

/// Create a chunked streaming response, one length-prefixed JSON payload per message
pub fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = AnnotationMessage> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(msg, compress).await });

    // Chunks are compressed individually, so there is no Content-Encoding on the response.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to a chunk: 4-byte big-endian length, then the payload
pub async fn serialize_chunk(msg: AnnotationMessage, compress: bool) -> std::io::Result<Bytes> {
    let json_bytes = serde_json::to_vec(&message_to_dto(msg)).map_err(std::io::Error::other)?;

    let payload = if compress {
        brotli_compress(json_bytes).await?
    } else {
        json_bytes
    };

    let length = u32::try_from(payload.len()).map_err(std::io::Error::other)?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Helper to create a streaming response from a receiver
pub fn stream_from_receiver(
    mut rx: tokio::sync::mpsc::Receiver<AnnotationMessage>,
    compress: bool,
) -> Response<Body> {
    let stream = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield msg;
        }
    };

    match chunked_json_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
