//! In-process stand-in for the signing service, served with warp on an
//! ephemeral port.
//!
//! Sign and verify are simulated unless a canned reply is configured: the
//! "signature" of a file is the base64 of `sig:` followed by its bytes, and
//! verification recomputes it.

use base64::Engine;
use bytes::Buf;
use futures::TryStreamExt;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warp::http::{Response, StatusCode};
use warp::multipart::FormData;
use warp::Filter;

pub const SIGNATURE_PREFIX: &[u8] = b"sig:";

/// A fixed answer for one endpoint.
#[derive(Debug, Clone)]
pub struct CannedReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl CannedReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            content_disposition: None,
            body: body.to_string().into_bytes(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            content_disposition: None,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            content_disposition: None,
            body: Vec::new(),
        }
    }

    pub fn archive(file_name: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: Some("application/zip".to_string()),
            content_disposition: Some(format!("attachment; filename=\"{file_name}\"")),
            body: body.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub generate: CannedReply,
    pub download: CannedReply,
    pub sign: Option<CannedReply>,
    pub verify: Option<CannedReply>,
    /// Delay before any answer is sent
    pub delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            generate: CannedReply::empty(200),
            download: CannedReply::archive("credentials.zip", b"PK\x03\x04mock"),
            sign: None,
            verify: None,
            delay: Duration::ZERO,
        }
    }
}

/// One request as the service saw it.
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub fields: BTreeMap<String, Vec<u8>>,
    pub file_names: BTreeMap<String, String>,
}

impl RecordedRequest {
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

struct MockState {
    config: MockConfig,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockService {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockService {
    /// Start the service on the current runtime.
    pub fn start(config: MockConfig) -> Self {
        let state = Arc::new(MockState {
            config,
            requests: Mutex::new(Vec::new()),
        });
        let (addr, server) = warp::serve(routes(state.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().expect("requests lock").len()
    }
}

/// Signature the simulated service produces for `data`.
pub fn expected_signature(data: &[u8]) -> String {
    let mut raw = SIGNATURE_PREFIX.to_vec();
    raw.extend_from_slice(data);
    base64::engine::general_purpose::STANDARD.encode(raw)
}

fn routes(
    state: Arc<MockState>,
) -> impl Filter<Extract = (Response<Vec<u8>>,), Error = warp::Rejection> + Clone {
    let generate = warp::path!("api" / "generate")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(|state: Arc<MockState>| async move {
            record(&state, "POST", "/api/generate", BTreeMap::new(), BTreeMap::new());
            Ok::<_, warp::Rejection>(delayed(&state, state.config.generate.clone()).await)
        });

    let download = warp::path!("api" / "generate")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|state: Arc<MockState>| async move {
            record(&state, "GET", "/api/generate", BTreeMap::new(), BTreeMap::new());
            Ok::<_, warp::Rejection>(delayed(&state, state.config.download.clone()).await)
        });

    let sign = warp::path!("api" / "sign")
        .and(warp::post())
        .and(warp::multipart::form().max_length(16 * 1024 * 1024))
        .and(with_state(state.clone()))
        .and_then(|form: FormData, state: Arc<MockState>| async move {
            let (fields, file_names) = collect_form(form).await?;
            record(&state, "POST", "/api/sign", fields.clone(), file_names);
            let reply = state
                .config
                .sign
                .clone()
                .unwrap_or_else(|| simulate_sign(&fields));
            Ok::<_, warp::Rejection>(delayed(&state, reply).await)
        });

    let verify = warp::path!("api" / "verify")
        .and(warp::post())
        .and(warp::multipart::form().max_length(16 * 1024 * 1024))
        .and(with_state(state))
        .and_then(|form: FormData, state: Arc<MockState>| async move {
            let (fields, file_names) = collect_form(form).await?;
            record(&state, "POST", "/api/verify", fields.clone(), file_names);
            let reply = state
                .config
                .verify
                .clone()
                .unwrap_or_else(|| simulate_verify(&fields));
            Ok::<_, warp::Rejection>(delayed(&state, reply).await)
        });

    generate.or(download).unify().or(sign).unify().or(verify).unify()
}

fn with_state(
    state: Arc<MockState>,
) -> impl Filter<Extract = (Arc<MockState>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

type Fields = (BTreeMap<String, Vec<u8>>, BTreeMap<String, String>);

/// Read the form one field at a time; each field's body is drained before
/// the next field is requested.
async fn collect_form(mut form: FormData) -> Result<Fields, warp::Rejection> {
    let mut fields = BTreeMap::new();
    let mut file_names = BTreeMap::new();
    while let Some(part) = form.try_next().await.map_err(|_| warp::reject())? {
        let name = part.name().to_string();
        if let Some(file_name) = part.filename() {
            file_names.insert(name.clone(), file_name.to_string());
        }
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.extend_from_slice(buf.chunk());
                Ok(acc)
            })
            .await
            .map_err(|_| warp::reject())?;
        fields.insert(name, bytes);
    }
    Ok((fields, file_names))
}

fn record(
    state: &MockState,
    method: &str,
    path: &str,
    fields: BTreeMap<String, Vec<u8>>,
    file_names: BTreeMap<String, String>,
) {
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            fields,
            file_names,
        });
}

async fn delayed(state: &MockState, reply: CannedReply) -> Response<Vec<u8>> {
    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }
    to_response(reply)
}

fn to_response(reply: CannedReply) -> Response<Vec<u8>> {
    let mut builder =
        Response::builder().status(StatusCode::from_u16(reply.status).expect("status code"));
    if let Some(content_type) = &reply.content_type {
        builder = builder.header("content-type", content_type);
    }
    if let Some(disposition) = &reply.content_disposition {
        builder = builder.header("content-disposition", disposition);
    }
    builder.body(reply.body).expect("response")
}

fn simulate_sign(fields: &BTreeMap<String, Vec<u8>>) -> CannedReply {
    let (Some(data), Some(key)) = (fields.get("data"), fields.get("key")) else {
        return CannedReply::json(400, serde_json::json!({ "error": "Missing data or key" }));
    };
    if !String::from_utf8_lossy(key).contains("PRIVATE KEY") {
        return CannedReply::json(
            400,
            serde_json::json!({
                "error": "Invalid private key",
                "details": "failed to decode PEM block containing private key"
            }),
        );
    }
    CannedReply::json(
        200,
        serde_json::json!({ "signature": expected_signature(data) }),
    )
}

fn simulate_verify(fields: &BTreeMap<String, Vec<u8>>) -> CannedReply {
    let (Some(data), Some(signature), Some(cert)) = (
        fields.get("data"),
        fields.get("signature"),
        fields.get("cert"),
    ) else {
        return CannedReply::json(400, serde_json::json!({ "error": "Missing fields" }));
    };
    if !String::from_utf8_lossy(cert).contains("CERTIFICATE") {
        return CannedReply::json(400, serde_json::json!({ "error": "Invalid certificate" }));
    }
    if String::from_utf8_lossy(signature).trim() == expected_signature(data) {
        CannedReply::json(200, serde_json::json!({ "message": "Signature is valid" }))
    } else {
        CannedReply::json(
            400,
            serde_json::json!({
                "error": "bad signature",
                "details": "crypto/rsa: verification error"
            }),
        )
    }
}
