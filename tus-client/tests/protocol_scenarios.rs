//! Drives the full state machine against a hand-rolled fake `HttpTransport`, mirroring the
//! teacher SDK's `CallHandlers`/`JSONCallMock` fakes: each test scripts a fixed sequence of
//! responses and asserts both the returned offset/checksum and the requests actually issued.

use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tus_client::{Cache, HttpTransport, InMemoryCache, TusClient};
use tus_http::{HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, TransportError};

type Call = (Method, String, HeaderMap, Option<Vec<u8>>);
type Client = TusClient<Arc<ScriptedTransport>, Arc<InMemoryCache>>;

/// Replays a fixed script of responses, one per call, matched strictly by call order. Panics if
/// more calls are made than were scripted, so an unexpected extra round-trip fails loudly.
struct ScriptedTransport {
    responses: Mutex<Vec<Result<Response, TransportError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<Response, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn call(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.clone(), url.to_string(), headers.clone(), body.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| panic!("unscripted {method} {url}"))
    }
}

fn response(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    Response::new(StatusCode::from_u16(status).unwrap(), map, body.to_vec())
}

fn client_error(status: u16, body: &[u8]) -> TransportError {
    TransportError::ClientError {
        status,
        body: body.to_vec(),
    }
}

fn temp_file_with(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

fn header_value<'a>(call: &'a Call, name: &str) -> Option<&'a str> {
    call.2.get(name).and_then(|v| v.to_str().ok())
}

fn client(transport: &Arc<ScriptedTransport>) -> Client {
    TusClient::configure("http://h", "/files", transport.clone(), Arc::new(InMemoryCache::new()))
}

/// Scenario 1: fresh upload of a 10-byte file, HEAD 404 falls through to create-then-stream.
#[test]
fn fresh_upload_of_small_file_completes_in_one_patch() -> anyhow::Result<()> {
    env_logger::builder().is_test(true).try_init().ok();

    let file = temp_file_with(b"0123456789");
    let transport = ScriptedTransport::new(vec![
        Err(client_error(404, b"")),
        Ok(response(201, &[("Location", "http://h/files/srv1")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "10")], b"")),
    ]);
    let mut client = client(&transport);
    client.set_file(file.path(), Some("hello.txt".to_string()))?;
    client.set_key("abc")?;

    let offset = client.upload(None)?;
    assert_eq!(offset, 10);

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, Method::HEAD);
    assert_eq!(calls[0].1, "http://h/files/abc");
    assert_eq!(calls[1].0, Method::POST);
    assert_eq!(header_value(&calls[1], "Upload-Length"), Some("10"));
    assert_eq!(header_value(&calls[1], "Upload-Key"), Some("abc"));
    assert_eq!(calls[2].0, Method::PATCH);
    assert_eq!(calls[2].1, "http://h/files/srv1");
    assert_eq!(header_value(&calls[2], "Upload-Offset"), Some("0"));
    assert_eq!(calls[2].3.as_deref(), Some(b"0123456789".as_slice()));
    Ok(())
}

/// Scenario 2: resume of a 1000-byte file with 400 bytes already acknowledged.
#[test]
fn resume_continues_from_discovered_offset() {
    let contents: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
    let file = temp_file_with(&contents);
    let transport = ScriptedTransport::new(vec![
        Ok(response(200, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "400")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "1000")], b"")),
    ]);
    let mut client = client(&transport);
    client.set_file(file.path(), Some("big.bin".to_string())).unwrap();
    client.set_key("k").unwrap();

    let offset = client.upload(None).unwrap();
    assert_eq!(offset, 1000);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, Method::PATCH);
    assert_eq!(header_value(&calls[1], "Upload-Offset"), Some("400"));
    assert_eq!(calls[1].3.as_deref(), Some(&contents[400..1000]));
}

/// Scenario 3: the server rejects a chunk with 416; the cache record is never written.
#[test]
fn corrupt_chunk_rejection_surfaces_corrupt_upload_error() {
    let file = temp_file_with(b"hello");
    let transport = ScriptedTransport::new(vec![
        Err(client_error(404, b"")),
        Ok(response(201, &[("Location", "http://h/files/srv2")], b"")),
        Err(client_error(416, b"")),
    ]);
    let cache = Arc::new(InMemoryCache::new());
    let mut client = TusClient::configure("http://h", "/files", transport, cache.clone());
    client.set_file(file.path(), None).unwrap();
    client.set_key("corrupt").unwrap();

    let err = client.upload(None).unwrap_err();
    assert!(matches!(err, tus_client::Error::CorruptUploadError));
    assert!(cache.get("corrupt").is_none());
}

/// Scenario 4: a partial upload's key gets the reserved separator suffix, and both the creation
/// and streaming requests carry `Upload-Concat: partial`.
#[test]
fn partial_upload_marks_concat_partial_on_create_and_patch() {
    let file = temp_file_with(&vec![7u8; 50]);
    let transport = ScriptedTransport::new(vec![
        Err(client_error(404, b"")),
        Ok(response(201, &[("Location", "http://h/files/srv3")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "50")], b"")),
    ]);
    let mut client = client(&transport);
    client.set_file(file.path(), None).unwrap();
    client.set_key("p").unwrap();
    client.seek(0).unwrap();

    let offset = client.upload(None).unwrap();
    assert_eq!(offset, 50);

    let calls = transport.calls();
    assert!(calls[0].1.starts_with("http://h/files/p+"));
    assert_eq!(header_value(&calls[1], "Upload-Concat"), Some("partial"));
    assert_eq!(header_value(&calls[2], "Upload-Concat"), Some("partial"));
}

/// Scenario 5: concatenation preserves caller-supplied partial order and returns the server's
/// checksum verbatim.
#[test]
fn concat_preserves_order_and_returns_server_checksum() {
    let transport = ScriptedTransport::new(vec![Ok(response(
        201,
        &[],
        br#"{"data":{"checksum":"deadbeef"}}"#,
    ))]);
    let mut client = client(&transport);

    let checksum = client
        .concat("final", vec!["p_a".to_string(), "p_b".to_string(), "p_c".to_string()])
        .unwrap();
    assert_eq!(checksum, "deadbeef");

    let calls = transport.calls();
    assert_eq!(
        header_value(&calls[0], "Upload-Concat"),
        Some("final;http://h/files/p_a http://h/files/p_b http://h/files/p_c")
    );
}

/// Scenario 6: deleting an already-gone resource surfaces `NotFoundError`.
#[test]
fn delete_of_gone_resource_is_not_found() {
    let transport = ScriptedTransport::new(vec![Err(client_error(410, b""))]);
    let mut client = client(&transport);

    let err = client.delete("x").unwrap_err();
    assert!(matches!(err, tus_client::Error::NotFoundError));
}

/// Scenario 7 (expansion): the capability probe parses versions, extensions, and max size.
#[test]
fn server_info_parses_capability_headers() {
    let transport = ScriptedTransport::new(vec![Ok(response(
        204,
        &[
            ("Tus-Resumable", "1.0.0"),
            ("Tus-Version", "1.0.0,0.2.2"),
            ("Tus-Extension", "creation,concatenation,checksum"),
            ("Tus-Max-Size", "5368709120"),
        ],
        b"",
    ))]);
    let client = client(&transport);

    let info = client.server_info().unwrap();
    assert_eq!(info.versions, vec!["1.0.0", "0.2.2"]);
    assert_eq!(info.extensions, vec!["creation", "concatenation", "checksum"]);
    assert_eq!(info.max_size, Some(5_368_709_120));
}

/// Boundary: `offset == length` after HEAD means no PATCH is ever issued.
#[test]
fn already_complete_upload_issues_no_patch() {
    let file = temp_file_with(b"done");
    let transport = ScriptedTransport::new(vec![Ok(response(
        200,
        &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "4")],
        b"",
    ))]);
    let mut client = client(&transport);
    client.set_file(file.path(), None).unwrap();
    client.set_key("done").unwrap();

    let offset = client.upload(None).unwrap();
    assert_eq!(offset, 4);
    assert_eq!(transport.calls().len(), 1);
}

/// Boundary: a zero-byte budget still issues one `PATCH` with an empty body and an unchanged
/// offset (§8), rather than being treated as a pure local no-op.
#[test]
fn zero_byte_budget_issues_single_empty_patch() {
    let file = temp_file_with(b"0123456789");
    let transport = ScriptedTransport::new(vec![
        Err(client_error(404, b"")),
        Ok(response(201, &[("Location", "http://h/files/srv9")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "0")], b"")),
    ]);
    let mut client = client(&transport);
    client.set_file(file.path(), None).unwrap();
    client.set_key("z").unwrap();

    let offset = client.upload(Some(0)).unwrap();
    assert_eq!(offset, 0);

    let calls = transport.calls();
    assert_eq!(calls.len(), 3, "HEAD+POST+PATCH, the PATCH carrying an empty body");
    assert_eq!(calls[2].0, Method::PATCH);
    assert_eq!(header_value(&calls[2], "Upload-Offset"), Some("0"));
    assert_eq!(header_value(&calls[2], "Content-Length"), Some("0"));
    assert_eq!(calls[2].3.as_deref(), Some(b"".as_slice()));
}

/// A cache hit never substitutes for the HEAD at `INIT`: the HEAD is always issued, and if the
/// server reports the resource gone, the client re-creates instead of trusting stale cache state
/// for the server key. Once re-created (offset reset to 0), a cached offset from an earlier
/// session in this process is recovered before the first `PATCH` (§4.6 STREAMING tie-break).
#[test]
fn cache_hit_never_bypasses_head_but_recovers_offset_after_recreate() {
    let contents: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
    let file = temp_file_with(&contents);
    let transport = ScriptedTransport::new(vec![
        Err(client_error(404, b"")),
        Ok(response(201, &[("Location", "http://h/files/srv-recreated")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "1000")], b"")),
    ]);
    let cache = Arc::new(InMemoryCache::new());
    cache.put(
        "k",
        tus_client::CacheRecord {
            offset: 400,
            server_key: "stale-srv".to_string(),
            cached_at: std::time::SystemTime::now(),
        },
    );
    let mut client = TusClient::configure("http://h", "/files", transport.clone(), cache);
    client.set_file(file.path(), Some("big.bin".to_string())).unwrap();
    client.set_key("k").unwrap();

    let offset = client.upload(None).unwrap();
    assert_eq!(offset, 1000);

    let calls = transport.calls();
    assert_eq!(calls.len(), 3, "HEAD is still issued despite the cache hit");
    assert_eq!(calls[0].0, Method::HEAD);
    assert_eq!(calls[0].1, "http://h/files/k");
    assert_eq!(calls[1].0, Method::POST, "HEAD miss falls through to create, ignoring the stale cache");
    assert_eq!(calls[2].0, Method::PATCH);
    assert_eq!(
        calls[2].1, "http://h/files/srv-recreated",
        "PATCH targets the freshly created server key, not the stale cached one"
    );
    assert_eq!(
        header_value(&calls[2], "Upload-Offset"),
        Some("400"),
        "cached offset recovered once the fresh create reset the offset to 0"
    );
    assert_eq!(calls[2].3.as_deref(), Some(&contents[400..1000]));
}

/// If the HEAD instead discovers the resource is still alive, its server-confirmed offset wins
/// outright; a stale cache entry for the same key is never consulted (offset is already nonzero).
#[test]
fn cache_hit_does_not_override_a_live_head_discovery() {
    let contents: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
    let file = temp_file_with(&contents);
    let transport = ScriptedTransport::new(vec![
        Ok(response(200, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "600")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "1000")], b"")),
    ]);
    let cache = Arc::new(InMemoryCache::new());
    cache.put(
        "k",
        tus_client::CacheRecord {
            offset: 50,
            server_key: "k".to_string(),
            cached_at: std::time::SystemTime::now(),
        },
    );
    let mut client = TusClient::configure("http://h", "/files", transport.clone(), cache);
    client.set_file(file.path(), Some("big.bin".to_string())).unwrap();
    client.set_key("k").unwrap();

    let offset = client.upload(None).unwrap();
    assert_eq!(offset, 1000);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        header_value(&calls[1], "Upload-Offset"),
        Some("600"),
        "the live HEAD's offset wins over the smaller cached offset"
    );
    assert_eq!(calls[1].3.as_deref(), Some(&contents[600..1000]));
}

/// A server response missing `Tus-Resumable` on `HEAD` is a protocol error, not silently accepted.
#[test]
fn missing_tus_resumable_header_on_head_is_a_protocol_error() {
    let file = temp_file_with(b"x");
    let transport = ScriptedTransport::new(vec![Ok(response(200, &[("Upload-Offset", "0")], b""))]);
    let mut client = client(&transport);
    client.set_file(file.path(), None).unwrap();
    client.set_key("no-header").unwrap();

    let err = client.upload(None).unwrap_err();
    assert!(matches!(err, tus_client::Error::ProtocolError { .. }));
}

/// User-supplied headers are merged in but never override a protocol-defined header.
#[test]
fn extra_headers_never_override_protocol_headers() {
    let file = temp_file_with(b"x");
    let transport = ScriptedTransport::new(vec![
        Err(client_error(404, b"")),
        Ok(response(201, &[("Location", "http://h/files/srv4")], b"")),
        Ok(response(204, &[("Tus-Resumable", "1.0.0"), ("Upload-Offset", "1")], b"")),
    ]);
    let mut client = client(&transport).with_extra_headers([("Tus-Resumable", "9.9.9"), ("X-Request-Id", "trace-1")]);
    client.set_file(file.path(), None).unwrap();
    client.set_key("hdrs").unwrap();

    client.upload(None).unwrap();

    let calls = transport.calls();
    assert_eq!(header_value(&calls[0], "Tus-Resumable"), Some("1.0.0"));
    assert_eq!(header_value(&calls[0], "X-Request-Id"), Some("trace-1"));
}

/// An unknown checksum algorithm name is rejected before any request is sent.
#[test]
fn unknown_algorithm_name_is_a_configuration_error() {
    let transport = ScriptedTransport::new(vec![]);
    let err = client(&transport).with_algorithm_name("crc32").unwrap_err();
    assert!(matches!(err, tus_client::Error::ConfigurationError(_)));
}
