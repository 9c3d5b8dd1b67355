//! HTTP client for the REST collection endpoints.
//!
//! Endpoints follow one convention for every [`ResourceKind`]:
//!
//! | operation | request                                  |
//! |-----------|------------------------------------------|
//! | list      | `GET    /{kind}?page&per_page&filters...` |
//! | create    | `POST   /{kind}`                         |
//! | update    | `PATCH  /{kind}/{id}`                    |
//! | delete    | `DELETE /{kind}/{id}?hard=1`             |
//! | upload    | `POST   /{kind}/upload` (multipart)      |
//! | profile   | `GET    /auth/me`                        |

use crate::client::ResourceClient;
use crate::envelope::{Envelope, Page, Reply};
use crate::error::{Error, ErrorKind, Result};
use crate::models::{ItemStatus, Profile, ResourceId, ResourceKind};
use crate::query::ListQuery;
use crate::upload::{ProgressReporter, UploadReceipt, UploadRequest};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

/// Size of the chunks an upload body is streamed in; progress is reported
/// once per chunk.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct WireReceipt {
    id: ResourceId,
    #[serde(default)]
    status: Option<String>,
}

/// [`ResourceClient`] talking to the real backend over HTTP(S).
///
/// # Examples
///
/// ```no_run
/// use clipflow_api::client::HttpClient;
/// use std::time::Duration;
///
/// # fn example() -> clipflow_api::error::Result<()> {
/// let token = Some("token".to_string());
/// let client = HttpClient::new("production", "https://api.example.com/v1", token, Duration::from_secs(30))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    name: String,
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// # Arguments
    /// * `name` - A name for this client (used in logging)
    /// * `base_url` - API root, e.g. `https://api.example.com/v1`
    /// * `token` - Bearer token sent with every request, if any
    /// * `timeout` - Whole-request timeout (uploads included)
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            exn::bail!(ErrorKind::InvalidRequest(format!("base URL must be http(s): {base_url}")));
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("clipflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::InvalidRequest("could not build HTTP client".to_string()))?;
        Ok(Self {
            name: name.into(),
            http,
            base_url: trimmed.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url).header("accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Reply<T>> {
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.bytes().await.map_err(transport)?;
        decode_envelope(status, &url, &body)
    }
}

fn transport(err: reqwest::Error) -> Error {
    let message = err.to_string();
    exn::Exn::from(err).raise(ErrorKind::Transport(message))
}

/// Turn a status code and body into a [`Reply`], or the matching error.
///
/// Validation failures (422) and business rejections still carry an envelope,
/// so the body is parsed before the status code is consulted.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, url: &str, body: &[u8]) -> Result<Reply<T>> {
    match status {
        StatusCode::UNAUTHORIZED => exn::bail!(ErrorKind::Unauthorized),
        StatusCode::NOT_FOUND => exn::bail!(ErrorKind::NotFound(url.to_string())),
        _ => {},
    }
    match serde_json::from_slice::<Envelope<T>>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(e) if status.is_server_error() => {
            Err(e).or_raise(|| ErrorKind::Transport(format!("HTTP {status} from {url}")))
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::InvalidResponse(format!("HTTP {status} from {url}"))),
    }
}

fn receipt(kind: ResourceKind, wire: WireReceipt) -> UploadReceipt {
    let status = wire
        .status
        .as_deref()
        .and_then(|raw| ItemStatus::from_wire(kind, raw))
        .unwrap_or(ItemStatus::Ready);
    UploadReceipt { id: wire.id, status }
}

#[async_trait]
impl ResourceClient for HttpClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(client = %self.name))]
    async fn profile(&self) -> Result<Profile> {
        let reply: Reply<Profile> = self.send(self.request(Method::GET, &self.url(&["auth", "me"]))).await?;
        reply.data.ok_or_raise(|| ErrorKind::InvalidResponse("profile missing from response".to_string()))
    }

    #[instrument(skip(self), fields(client = %self.name))]
    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page<Value>> {
        let builder = self.request(Method::GET, &self.url(&[kind.path()])).query(&query.to_pairs(kind));
        let reply: Reply<Vec<Value>> = self.send(builder).await?;
        Ok(Page::from_reply(reply, query.per_page))
    }

    #[instrument(skip(self, payload), fields(client = %self.name))]
    async fn create(&self, kind: ResourceKind, payload: &Value) -> Result<Value> {
        let builder = self.request(Method::POST, &self.url(&[kind.path()])).json(payload);
        let reply: Reply<Value> = self.send(builder).await?;
        Ok(reply.data.unwrap_or(Value::Null))
    }

    #[instrument(skip(self, payload), fields(client = %self.name))]
    async fn update(&self, kind: ResourceKind, id: &ResourceId, payload: &Value) -> Result<Value> {
        let builder = self.request(Method::PATCH, &self.url(&[kind.path(), id.as_str()])).json(payload);
        let reply: Reply<Value> = self.send(builder).await?;
        Ok(reply.data.unwrap_or(Value::Null))
    }

    #[instrument(skip(self), fields(client = %self.name))]
    async fn delete(&self, kind: ResourceKind, id: &ResourceId, hard: bool) -> Result<()> {
        let mut builder = self.request(Method::DELETE, &self.url(&[kind.path(), id.as_str()]));
        if hard {
            builder = builder.query(&[("hard", "1")]);
        }
        let _: Reply<Value> = self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self, progress), fields(client = %self.name))]
    async fn upload(
        &self,
        kind: ResourceKind,
        request: &UploadRequest,
        progress: ProgressReporter,
    ) -> Result<UploadReceipt> {
        if !kind.accepts_uploads() {
            exn::bail!(ErrorKind::InvalidRequest(format!("{kind} does not accept uploads")));
        }
        let total = request.size();
        let chunks = request.chunks(UPLOAD_CHUNK_SIZE);
        let reporter = progress.clone();
        let mut sent = 0_u64;
        reporter.bytes(0, total);
        // Progress is reported as reqwest pulls each chunk off the stream,
        // which tracks what has been handed to the socket.
        let body = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            reporter.bytes(sent, total);
            Ok::<_, std::io::Error>(chunk)
        });
        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(request.file_name.clone())
            .mime_str(&request.content_type)
            .or_raise(|| ErrorKind::InvalidRequest(format!("invalid content type: {}", request.content_type)))?;
        let form = Form::new().text("path", request.destination.clone()).part("file", part);
        let builder = self.request(Method::POST, &self.url(&[kind.path(), "upload"])).multipart(form);
        let reply: Reply<WireReceipt> = self.send(builder).await?;
        let wire =
            reply.data.ok_or_raise(|| ErrorKind::InvalidResponse("upload id missing from response".to_string()))?;
        let receipt = receipt(kind, wire);
        tracing::info!(%kind, id = %receipt.id, status = %receipt.status, file = %request.file_name, "Upload accepted");
        Ok(receipt)
    }
}
