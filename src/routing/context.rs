//! Per-dispatch request context.
//!
//! # Responsibilities
//! - Expose the request, its normalized path and extracted parameters
//! - Track the response status the handler chose
//! - Give handlers the not-found / server-error escape hatches
//! - Carry an optional markup buffer for post-processing
//!
//! Nothing in a context outlives the dispatch that created it.

use std::fmt::Display;

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, Method, Request, StatusCode};
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;

use crate::http::response::ResponseWriter;
use crate::observability::LogLevel;
use crate::routing::pattern::Params;
use crate::routing::router::Router;

/// Error type for request body helpers.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The request body is not the expected JSON document.
    #[error("invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// The response value could not be encoded.
    #[error("invalid json object: {0}")]
    Encode(#[source] serde_json::Error),

    /// A redirect target is not a valid header value.
    #[error("invalid redirect location {0:?}")]
    InvalidLocation(String),
}

/// Handler view of a single dispatch.
pub struct RequestContext<'a> {
    router: &'a Router,
    writer: &'a mut ResponseWriter,
    request: &'a Request<Bytes>,
    path: &'a str,
    params: Params,
    status: StatusCode,
    markup: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub(crate) fn new(
        router: &'a Router,
        writer: &'a mut ResponseWriter,
        request: &'a Request<Bytes>,
        path: &'a str,
        params: Params,
    ) -> Self {
        Self {
            router,
            writer,
            request,
            path,
            params,
            status: StatusCode::OK,
            markup: None,
        }
    }

    /// Value of a URL parameter, or `""` if the route has no such parameter.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn request(&self) -> &Request<Bytes> {
        self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The normalized request path the route was resolved against.
    pub fn path(&self) -> &str {
        self.path
    }

    /// The status most recently set by this context (200 unless changed).
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Write the response status.
    pub fn status(&mut self, code: StatusCode) {
        if !self.writer.write_header(code) && self.router.log_level() >= LogLevel::Debug {
            let committed = self.writer.status();
            self.router.log(|| {
                tracing::debug!(
                    committed = committed.as_u16(),
                    ignored = code.as_u16(),
                    "Superfluous status write"
                )
            });
        }
        self.status = code;
    }

    /// Append to the response body.
    pub fn write(&mut self, body: impl AsRef<[u8]>) {
        self.writer.write(body);
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.writer.set_header(name, value);
    }

    /// Direct access to the response under construction.
    pub fn writer(&mut self) -> &mut ResponseWriter {
        &mut *self.writer
    }

    /// Redirect to `location` with the given status.
    pub fn redirect(&mut self, location: &str, code: StatusCode) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.set_header(header::LOCATION, value);
                self.status(code);
            }
            Err(_) => self.error(ContextError::InvalidLocation(location.to_string())),
        }
    }

    /// Queue markup to be preprocessed and written once the handler returns.
    ///
    /// Handler markup is never cached: it depends on request state.
    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = Some(markup.into());
    }

    pub(crate) fn take_markup(&mut self) -> Option<String> {
        self.markup.take().filter(|m| !m.is_empty())
    }

    /// Decode the request body as JSON.
    ///
    /// Unknown fields and trailing data after the document are rejected. On
    /// failure the response status is set to 400 Bad Request.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, ContextError> {
        let request = self.request;
        let mut de = serde_json::Deserializer::from_slice(request.body());
        let mut ignored = Vec::new();
        let decoded: Result<T, _> =
            serde_ignored::deserialize(&mut de, |path| ignored.push(path.to_string()));
        let decoded = decoded
            .and_then(|value| de.end().map(|()| value))
            .and_then(|value| match ignored.first() {
                Some(field) => Err(serde_json::Error::custom(format_args!("unknown field `{}`", field))),
                None => Ok(value),
            });

        decoded.map_err(|e| {
            self.status(StatusCode::BAD_REQUEST);
            if self.router.log_level() >= LogLevel::Debug {
                self.router.log(|| tracing::debug!(error = %e, "Invalid request"));
            }
            ContextError::InvalidBody(e)
        })
    }

    /// Encode `value` as JSON and write it.
    ///
    /// Encoding failures go through the server-error fallback.
    pub fn write_json<T: Serialize>(&mut self, value: &T) -> Result<(), ContextError> {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.writer.default_content_type("application/json");
                self.write(body);
                Ok(())
            }
            Err(e) => {
                let err = ContextError::Encode(e);
                self.error(&err);
                Err(err)
            }
        }
    }

    /// Answer with the not-found fallback and cache that outcome for this path.
    pub fn not_found(&mut self) {
        let (router, request, path) = (self.router, self.request, self.path);
        router.not_found(request, path, &mut *self.writer);
    }

    /// Answer with the server-error fallback, logging `err`.
    pub fn error(&mut self, err: impl Display) {
        let (router, request, path) = (self.router, self.request, self.path);
        router.internal_error(&err, request, path, &mut *self.writer);
    }

    pub(crate) fn router(&self) -> &'a Router {
        self.router
    }
}
