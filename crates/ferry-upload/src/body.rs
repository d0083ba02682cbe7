//! Streaming body producer.
//!
//! A spawned task reads the source in fixed-size chunks, feeds every chunk to
//! a SHA-1 accumulator, and pushes framed multipart bytes into a bounded
//! channel. The receiving half becomes the request body. A read failure is
//! pushed as an `Err` item so the HTTP stack aborts the request instead of
//! sending a truncated body.

use std::path::PathBuf;

use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{UploadError, UploadResult};
use crate::multipart::MultipartEncoder;

/// Size of each read from the source file.
pub const CHUNK_SIZE: usize = 32 * 1024;
/// Number of framed chunks buffered between producer and transport.
pub const CHANNEL_DEPTH: usize = 4;

/// Form field carrying the file content.
pub const FILE_FIELD: &str = "file";
/// Form field carrying the source path.
pub const PATH_FIELD: &str = "path";
/// Form field carrying the hex SHA-1 digest.
pub const SHA1_FIELD: &str = "sha1";

/// Item type flowing from the producer to the request body.
pub type BodyChunk = Result<Vec<u8>, UploadError>;

/// What the producer needs to know about the file beyond its bytes.
#[derive(Debug, Clone)]
pub struct BodySource {
    /// Path of the file being read, used for error context.
    pub path: PathBuf,
    /// Value of the `filename` attribute on the file part.
    pub filename: String,
    /// Value of the `path` field.
    pub path_field: String,
}

/// Running producer: the body stream plus a handle resolving to the digest.
pub struct BodyProducer {
    /// Stream of framed chunks to hand to the HTTP client.
    pub stream: ReceiverStream<BodyChunk>,
    /// Resolves to the lowercase hex SHA-1 once the closing delimiter is queued.
    pub digest: JoinHandle<UploadResult<String>>,
}

impl BodyProducer {
    /// Convert the chunk stream into a request body.
    #[must_use]
    pub fn into_parts(self) -> (reqwest::Body, JoinHandle<UploadResult<String>>) {
        (reqwest::Body::wrap_stream(self.stream), self.digest)
    }
}

/// Spawn a producer task reading `reader`.
///
/// The reader is owned by the task and dropped when it finishes, on success
/// and on every error path.
pub fn spawn_body_producer<R>(
    reader: R,
    encoder: MultipartEncoder,
    source: BodySource,
) -> BodyProducer
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    let digest = tokio::spawn(produce(reader, tx, encoder, source));
    BodyProducer {
        stream: ReceiverStream::new(rx),
        digest,
    }
}

async fn produce<R>(
    mut reader: R,
    tx: Sender<BodyChunk>,
    encoder: MultipartEncoder,
    source: BodySource,
) -> UploadResult<String>
where
    R: AsyncRead + Unpin,
{
    push(&tx, encoder.file_header(FILE_FIELD, &source.filename)).await?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0_u8; CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) => {
                let _ = tx.send(Err(UploadError::BodyInterrupted)).await;
                return Err(UploadError::io("read", source.path, err));
            }
        };
        let chunk = &buf[..read];
        hasher.update(chunk);
        push(&tx, chunk.to_vec()).await?;
    }

    let digest = format!("{:x}", hasher.finalize());
    push(&tx, encoder.text_field(PATH_FIELD, &source.path_field)).await?;
    push(&tx, encoder.text_field(SHA1_FIELD, &digest)).await?;
    push(&tx, encoder.closing()).await?;
    Ok(digest)
}

async fn push(tx: &Sender<BodyChunk>, chunk: Vec<u8>) -> UploadResult<()> {
    tx.send(Ok(chunk))
        .await
        .map_err(|_| UploadError::BodyAbandoned)
}
