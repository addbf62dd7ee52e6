use thiserror::Error;

/// The error taxonomy surfaced by every public operation.
///
/// `NotFoundError` and an unclassified client/server error observed while discovering an
/// upload's remote state (`HEAD`) are the only kinds the state machine itself ever recovers
/// from — it falls through to creating a fresh upload instead of propagating them. Every other
/// variant ends the Upload in the `Failed` state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The local file could not be opened, seeked, or read.
    #[error("I/O failure: {0}")]
    IOFailure(#[from] std::io::Error),

    /// An unsupported checksum algorithm, a missing file, or a missing client key before an
    /// operation that requires one.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// The transport could not reach the server, or the exchange was aborted before a final
    /// status was received (including a `100 Continue` treated as an abort signal).
    #[error("connection error: {0}")]
    ConnectionError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// `POST` did not return `201 Created` with a usable `Location`, or a `concat` response
    /// lacked a checksum.
    #[error("resource create error: {0}")]
    ResourceCreateError(String),

    /// The server reported `404`/`410` for an upload the caller expected to exist.
    #[error("resource not found")]
    NotFoundError,

    /// `PATCH` returned `416`: the server rejected the checksum or offset of the chunk just
    /// sent. Local resume is no longer safe without rediscovery.
    #[error("corrupt upload: server rejected chunk at offset")]
    CorruptUploadError,

    /// Any other unexpected status, or a server-reported offset that fails to advance.
    #[error("protocol error: status {status}")]
    ProtocolError { status: u16, body: Vec<u8> },
}

pub type Result<T> = std::result::Result<T, Error>;
