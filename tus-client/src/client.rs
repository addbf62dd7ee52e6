use crate::{
    cache::{Cache, CacheRecord},
    error::{Error, Result},
    reader::FileWindowReader,
    server_info::ServerInfo,
    upload::{make_partial_key, ChecksumMode, FinalUpload, Upload},
};
use log::{debug, info, warn};
use std::{path::Path, time::SystemTime};
use tus_checksum::{digest_bytes, digest_reader, Algorithm};
use tus_http::{HeaderMap, HeaderName, HeaderValue, HttpTransport, Method, Response, TransportError};
use tus_utils::header;

/// Default single-`PATCH` body size cap. Not protocol-bound; chosen as a reasonable balance
/// between memory use and request count for typical uploads.
pub const DEFAULT_WINDOW_CAP: u64 = 4 * 1024 * 1024;

/// The public facade: a single logical upload task driven through discover-or-create and
/// streaming phases.
pub struct TusClient<T, C> {
    base_url: String,
    api_path: String,
    transport: T,
    cache: C,
    algorithm: Algorithm,
    checksum_mode: ChecksumMode,
    window_cap: u64,
    extra_headers: Vec<(String, String)>,
    current: Option<Upload>,
}

impl<T, C> std::fmt::Debug for TusClient<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TusClient")
            .field("base_url", &self.base_url)
            .field("api_path", &self.api_path)
            .field("algorithm", &self.algorithm)
            .field("checksum_mode", &self.checksum_mode)
            .field("window_cap", &self.window_cap)
            .finish_non_exhaustive()
    }
}

impl<T: HttpTransport, C: Cache> TusClient<T, C> {
    /// `configure(baseUrl, apiPath, cache, algorithm='sha256')`.
    pub fn configure(base_url: impl Into<String>, api_path: impl Into<String>, transport: T, cache: C) -> Self {
        Self {
            base_url: base_url.into(),
            api_path: api_path.into(),
            transport,
            cache,
            algorithm: Algorithm::default(),
            checksum_mode: ChecksumMode::default(),
            window_cap: DEFAULT_WINDOW_CAP,
            extra_headers: Vec::new(),
            current: None,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Selects the checksum algorithm by its wire name (e.g. `"sha256"`), as advertised by a
    /// server's `Tus-Checksum-Algorithm` extension. Unknown names are rejected with
    /// `ConfigurationError` before any request is sent, rather than surfacing as a protocol error
    /// mid-upload.
    pub fn with_algorithm_name(self, name: &str) -> Result<Self> {
        let algorithm: Algorithm = name
            .parse()
            .map_err(|err: tus_checksum::UnknownAlgorithm| Error::ConfigurationError(err.to_string()))?;
        Ok(self.with_algorithm(algorithm))
    }

    pub fn with_checksum_mode(mut self, mode: ChecksumMode) -> Self {
        self.checksum_mode = mode;
        self
    }

    pub fn with_window_cap(mut self, window_cap: u64) -> Self {
        self.window_cap = window_cap;
        self
    }

    /// Headers merged into every request issued by this client. A header whose name collides
    /// (case-insensitively) with a protocol-defined header (§4.3) is dropped rather than allowed
    /// to override it.
    pub fn with_extra_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra_headers = headers.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// `setFile(path, name=basename(path))`.
    pub fn set_file(&mut self, path: impl AsRef<Path>, name: Option<String>) -> Result<()> {
        let path = path.as_ref();
        let length = path.metadata().map_err(Error::IOFailure)?.len();
        let name = name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        self.current = Some(Upload::new(path.to_path_buf(), length, name, self.algorithm));
        Ok(())
    }

    /// `setKey(key)`.
    pub fn set_key(&mut self, key: impl Into<String>) -> Result<()> {
        let upload = self.current_mut()?;
        upload.client_key = key.into();
        Ok(())
    }

    /// `seek(offset)`: positions the current upload at a known offset. The first call on a
    /// non-partial upload marks it as partial, deriving its key as
    /// `<current client key><SEP><unique suffix>`; subsequent calls only update the resume hint,
    /// letting a caller reattach to a partial it already created.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        let upload = self.current_mut()?;
        if !upload.partial {
            upload.partial = true;
            upload.client_key = make_partial_key(&upload.client_key);
        }
        upload.offset = offset;
        Ok(())
    }

    /// The last locally known offset for the current upload, without a network round-trip.
    pub fn get_offset(&self) -> Option<u64> {
        self.current.as_ref().map(|u| u.offset)
    }

    fn current_mut(&mut self) -> Result<&mut Upload> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::ConfigurationError("no file set; call set_file first".to_string()))
    }

    fn current_ref(&self) -> Result<&Upload> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::ConfigurationError("no file set; call set_file first".to_string()))
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, self.api_path)
    }

    fn item_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.base_url, self.api_path, key)
    }

    /// Lays down protocol-defined headers first, then merges in any caller-configured extra
    /// headers, dropping any that would collide with one already present.
    fn build_headers(&self, protocol: Vec<(&str, String)>) -> HeaderMap {
        let merged = header::merge_user_headers(
            protocol,
            self.extra_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let mut headers = HeaderMap::new();
        for (name, value) in merged {
            insert_header(&mut headers, &name, &value);
        }
        headers
    }

    fn whole_file_checksum(&mut self) -> Result<Vec<u8>> {
        let upload = self.current_ref()?;
        if let Some(digest) = &upload.checksum {
            return Ok(digest.clone());
        }
        let file = std::fs::File::open(upload.path()).map_err(Error::IOFailure)?;
        let digest = digest_reader(file, upload.algorithm).map_err(Error::IOFailure)?;
        self.current_mut()?.checksum = Some(digest.clone());
        Ok(digest)
    }

    /// `upload(bytes=-1) -> offset`. `bytes = -1` (represented here as `None`) means "to
    /// completion".
    pub fn upload(&mut self, bytes: Option<u64>) -> Result<u64> {
        self.discover_or_create()?;
        self.stream(bytes)
    }

    /// `INIT → DISCOVERING`: unconditionally issues a HEAD, regardless of any cached record — a
    /// cache hit is never a substitute for discovery, since only the server can say whether the
    /// resource it remembers still exists (§7's 404/410→`CREATING` recovery depends on this HEAD
    /// actually reaching the server every time).
    fn discover_or_create(&mut self) -> Result<()> {
        let key = self.current_ref()?.client_key.clone();
        if key.is_empty() {
            return Err(Error::ConfigurationError("no client key set; call set_key first".to_string()));
        }

        let url = self.item_url(&key);
        let headers = self.build_headers(vec![(header::HEADER_TUS_RESUMABLE, header::TUS_RESUMABLE.to_string())]);
        match self.transport.call(Method::HEAD, &url, &headers, None) {
            Ok(response) if response.status.is_success() => {
                require_resumable_header(&response)?;
                let offset = parse_offset_header(&response)?;
                info!("discovered existing upload {key} at offset {offset}");
                let upload = self.current_mut()?;
                upload.server_key = Some(key);
                upload.offset = offset;
                Ok(())
            }
            Err(TransportError::ConnectFailure(err)) => Err(Error::ConnectionError(err)),
            // `Ok(_)` here means a non-success HEAD status; together with any other client/server
            // error (or a future transport-error variant this crate doesn't know about yet,
            // since `TransportError` is `#[non_exhaustive]`), that recovers locally into CREATING
            // per §7's propagation rule rather than surfacing to the caller.
            Ok(_) | Err(_) => {
                debug!("no existing upload for {key}, creating");
                self.create_current()
            }
        }
    }

    /// The §4.6 STREAMING tie-break: only once discovery/creation has run and left `offset == 0`
    /// does a cached record get consulted, to recover an offset a prior session in this process
    /// already advanced past. Never runs in place of the HEAD in [`discover_or_create`], and
    /// never moves the offset backwards relative to what the server just confirmed.
    fn apply_cached_offset_tie_break(&mut self) -> Result<()> {
        let upload = self.current_ref()?;
        if upload.offset != 0 {
            return Ok(());
        }
        let key = upload.client_key.clone();
        if let Some(record) = self.cache.get(&key) {
            debug!("recovering cached offset {} for {key} before streaming", record.offset);
            let upload = self.current_mut()?;
            upload.offset = record.offset;
        }
        Ok(())
    }

    fn create_current(&mut self) -> Result<()> {
        let key = self.current_ref()?.client_key.clone();
        let server_key = self.do_create(&key)?;
        let upload = self.current_mut()?;
        upload.server_key = Some(server_key);
        upload.offset = 0;
        Ok(())
    }

    /// `create(key) -> serverKey`: explicit creation without streaming.
    pub fn create(&mut self, key: impl Into<String>) -> Result<String> {
        let key = key.into();
        self.set_key(key.clone())?;
        let server_key = self.do_create(&key)?;
        let upload = self.current_mut()?;
        upload.server_key = Some(server_key.clone());
        upload.offset = 0;
        Ok(server_key)
    }

    fn do_create(&mut self, key: &str) -> Result<String> {
        let upload = self.current_ref()?;
        let length = upload.length;
        let name = upload.name.clone();
        let partial = upload.partial;

        let metadata = header::encode_metadata([("filename", name.as_bytes())]);
        let mut protocol = vec![
            (header::HEADER_TUS_RESUMABLE, header::TUS_RESUMABLE.to_string()),
            (header::HEADER_UPLOAD_LENGTH, header::format_u64(length)),
            (header::HEADER_UPLOAD_KEY, key.to_string()),
            (header::HEADER_UPLOAD_METADATA, metadata),
        ];
        if partial {
            protocol.push((header::HEADER_UPLOAD_CONCAT, header::encode_concat_partial().to_string()));
        }
        let headers = self.build_headers(protocol);

        let url = self.collection_url();
        let response = self.call(Method::POST, &url, headers, None)?;
        if response.status.as_u16() != 201 {
            return Err(Error::ResourceCreateError(format!(
                "expected 201 Created, got {}",
                response.status
            )));
        }
        let location = response
            .header_str(header::HEADER_LOCATION)
            .ok_or_else(|| Error::ResourceCreateError("response missing Location header".to_string()))?;
        Ok(server_key_from_location(location))
    }

    fn stream(&mut self, bytes: Option<u64>) -> Result<u64> {
        self.apply_cached_offset_tie_break()?;
        let mut budget = bytes;
        // `bytes = 0` (§8 Boundary) still issues exactly one PATCH with an empty body before
        // stopping; only a budget that reaches zero *after* a prior iteration already sent bytes
        // this call stops the loop without a further round-trip.
        let mut first_iteration = true;
        loop {
            let upload = self.current_ref()?;
            if upload.is_complete() {
                break;
            }
            if !first_iteration {
                if let Some(0) = budget {
                    break;
                }
            }
            first_iteration = false;

            let server_key = upload
                .server_key
                .clone()
                .ok_or_else(|| Error::ConfigurationError("upload was not created".to_string()))?;
            let offset = upload.offset;
            let remaining = upload.length - offset;
            let mut chunk_len = remaining.min(self.window_cap);
            if let Some(b) = budget {
                chunk_len = chunk_len.min(b);
            }

            let reader = FileWindowReader::new(upload.path());
            let chunk = reader.read(offset, chunk_len)?;

            let checksum = match self.checksum_mode {
                ChecksumMode::WholeFile => self.whole_file_checksum()?,
                ChecksumMode::PerChunk => digest_bytes(&chunk, self.algorithm),
            };

            let upload = self.current_ref()?;
            let partial = upload.partial;
            let algorithm = upload.algorithm;

            let mut protocol = vec![
                (header::HEADER_TUS_RESUMABLE, header::TUS_RESUMABLE.to_string()),
                (header::HEADER_UPLOAD_OFFSET, header::format_u64(offset)),
                (header::HEADER_CONTENT_LENGTH, header::format_u64(chunk.len() as u64)),
                (header::HEADER_CONTENT_TYPE, header::PATCH_CONTENT_TYPE.to_string()),
                (header::HEADER_UPLOAD_CHECKSUM, header::encode_checksum(algorithm.name(), &checksum)),
            ];
            if partial {
                protocol.push((header::HEADER_UPLOAD_CONCAT, header::encode_concat_partial().to_string()));
            }
            let headers = self.build_headers(protocol);

            let url = self.item_url(&server_key);
            let sent_len = chunk.len() as u64;
            let response = match self.transport.call(Method::PATCH, &url, &headers, Some(chunk)) {
                Ok(response) => response,
                Err(TransportError::ClientError { status: 416, .. }) => {
                    warn!("server rejected chunk at offset {offset} for {server_key} with 416");
                    return Err(Error::CorruptUploadError);
                }
                Err(TransportError::ClientError { status: 100, .. }) => {
                    warn!("transport surfaced pseudo-status 100 for {server_key}; treating as aborted");
                    return Err(Error::ConnectionError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::ConnectionAborted,
                        "connection aborted (100 Continue)",
                    ))));
                }
                Err(TransportError::ClientError { status, body }) => {
                    return Err(Error::ProtocolError { status, body })
                }
                Err(TransportError::ServerError { status, body }) => {
                    return Err(Error::ProtocolError { status, body })
                }
                Err(TransportError::ConnectFailure(err)) => return Err(Error::ConnectionError(err)),
                Err(err) => return Err(map_transport_error(err)),
            };
            if !response.status.is_success() {
                return Err(Error::ProtocolError {
                    status: response.status.as_u16(),
                    body: response.body,
                });
            }
            require_resumable_header(&response)?;

            let new_offset = parse_offset_header(&response)?;
            // A non-empty chunk must strictly advance the offset; an explicit empty-body PATCH
            // (the `bytes = 0` boundary case) is expected to report the offset unchanged, not
            // regressed, so only that one case tolerates `new_offset == offset`.
            let advanced_as_expected = if sent_len > 0 {
                new_offset > offset
            } else {
                new_offset >= offset
            };
            if !advanced_as_expected {
                return Err(Error::ProtocolError {
                    status: response.status.as_u16(),
                    body: response.body,
                });
            }

            let upload = self.current_mut()?;
            upload.offset = new_offset;
            let key = upload.client_key.clone();
            let server_key = upload.server_key.clone().unwrap_or_default();
            self.cache.put(
                &key,
                CacheRecord {
                    offset: new_offset,
                    server_key,
                    cached_at: SystemTime::now(),
                },
            );

            if let Some(b) = budget.as_mut() {
                *b -= sent_len.min(*b);
            }
        }
        Ok(self.current_ref()?.offset)
    }

    /// `concat(finalKey, partials…) -> checksum`.
    pub fn concat(&mut self, final_key: impl Into<String>, partial_keys: Vec<String>) -> Result<String> {
        let final_upload = FinalUpload {
            client_key: final_key.into(),
            partial_keys,
        };

        let partial_urls: Vec<String> = final_upload
            .partial_keys
            .iter()
            .map(|key| self.item_url(key))
            .collect();
        let concat_value =
            header::encode_concat_final(partial_urls.iter().map(String::as_str));

        let headers = self.build_headers(vec![
            (header::HEADER_TUS_RESUMABLE, header::TUS_RESUMABLE.to_string()),
            (header::HEADER_UPLOAD_KEY, final_upload.client_key.clone()),
            (header::HEADER_UPLOAD_CONCAT, concat_value),
        ]);

        let url = self.collection_url();
        let response = self.call(Method::POST, &url, headers, None)?;
        if response.status.as_u16() != 201 {
            return Err(Error::ResourceCreateError(format!(
                "expected 201 Created, got {}",
                response.status
            )));
        }
        let checksum: serde_json::Value =
            serde_json::from_slice(&response.body).map_err(|_| concat_missing_checksum())?;
        checksum
            .get("data")
            .and_then(|data| data.get("checksum"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(concat_missing_checksum)
    }

    /// `delete(key)`.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let url = self.item_url(key);
        let headers = self.build_headers(vec![(header::HEADER_TUS_RESUMABLE, header::TUS_RESUMABLE.to_string())]);
        match self.transport.call(Method::DELETE, &url, &headers, None) {
            Ok(_) => {
                self.cache.delete(key);
                Ok(())
            }
            Err(TransportError::ClientError { status: 404, .. }) | Err(TransportError::ClientError { status: 410, .. }) => {
                self.cache.delete(key);
                Err(Error::NotFoundError)
            }
            Err(TransportError::ClientError { status, body }) => Err(Error::ProtocolError { status, body }),
            Err(TransportError::ServerError { status, body }) => Err(Error::ProtocolError { status, body }),
            Err(TransportError::ConnectFailure(err)) => Err(Error::ConnectionError(err)),
            Err(err) => Err(map_transport_error(err)),
        }
    }

    /// `serverInfo() -> ServerInfo`: probes the server's advertised protocol versions,
    /// extensions, and maximum upload size via `OPTIONS`.
    pub fn server_info(&self) -> Result<ServerInfo> {
        let headers = self.build_headers(vec![(header::HEADER_TUS_RESUMABLE, header::TUS_RESUMABLE.to_string())]);
        let url = self.collection_url();
        let response = self
            .transport
            .call(Method::OPTIONS, &url, &headers, None)
            .map_err(map_transport_error)?;
        if !response.status.is_success() {
            return Err(Error::ProtocolError {
                status: response.status.as_u16(),
                body: response.body,
            });
        }
        Ok(ServerInfo {
            versions: response
                .header_str(header::HEADER_TUS_VERSION)
                .map(header::parse_csv)
                .unwrap_or_default(),
            extensions: response
                .header_str(header::HEADER_TUS_EXTENSION)
                .map(header::parse_csv)
                .unwrap_or_default(),
            max_size: response
                .header_str(header::HEADER_TUS_MAX_SIZE)
                .and_then(|v| v.parse().ok()),
        })
    }

    fn call(&self, method: Method, url: &str, headers: HeaderMap, body: Option<Vec<u8>>) -> Result<Response> {
        self.transport
            .call(method, url, &headers, body)
            .map_err(map_transport_error)
    }
}

fn map_transport_error(err: TransportError) -> Error {
    match err {
        TransportError::ConnectFailure(e) => Error::ConnectionError(e),
        TransportError::ClientError { status, body } | TransportError::ServerError { status, body } => {
            Error::ProtocolError { status, body }
        }
        // `TransportError` is `#[non_exhaustive]`: a transport crate may add a variant this
        // client predates. Treat anything unrecognized as a connection-level failure rather than
        // refusing to compile against a newer `tus-http`.
        _ => Error::ConnectionError(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "unrecognized transport error variant",
        ))),
    }
}

fn concat_missing_checksum() -> Error {
    Error::ResourceCreateError("concat response missing data.checksum".to_string())
}

/// The client rejects any `HEAD`/`PATCH` response missing `Tus-Resumable` as a `ProtocolError`
/// (§6): a server that omits it is not reliably speaking the protocol version this client expects.
fn require_resumable_header(response: &Response) -> Result<()> {
    if response.header_str(header::HEADER_TUS_RESUMABLE).is_some() {
        Ok(())
    } else {
        Err(Error::ProtocolError {
            status: response.status.as_u16(),
            body: response.body.clone(),
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        headers.insert(name, value);
    }
}

fn parse_offset_header(response: &Response) -> Result<u64> {
    response
        .header_str(header::HEADER_UPLOAD_OFFSET)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::ProtocolError {
            status: response.status.as_u16(),
            body: response.body.clone(),
        })
}

fn server_key_from_location(location: &str) -> String {
    location
        .rsplit('/')
        .next()
        .unwrap_or(location)
        .to_string()
}
