//! Request decoding: body, path, query and header binding plus validation.
//!
//! A [`Decoder`] turns one HTTP request into a validated request model:
//!
//! 1. clone the configured template,
//! 2. run the pre-decode hooks in order,
//! 3. merge a JSON body over the template,
//! 4. bind path segments, then query parameters, then headers,
//! 5. validate.
//!
//! Handlers receive the result through the [`Decoded`] extractor, which finds
//! its decoder in application data. Every decode failure becomes an
//! `invalid_request` error.

pub mod binding;

use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, error};
use validator::Validate;

use crate::domain::Error;
use crate::middleware::request_log::DecodedRequest;

use super::validation::{ValidationErrorSet, Validator};

pub use binding::{BindingSource, FieldBinding, FieldBindingError, Setter, parse_bool, parse_uuid};

/// Reasons a request could not be decoded into its model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    MalformedFieldValue(#[from] FieldBindingError),
    #[error("malformed query string: {message}")]
    MalformedQuery { message: String },
    #[error("request body is not a valid {model}: {message}")]
    BodyParseFailed { model: &'static str, message: String },
    #[error("request rejected: {reason}")]
    PreDecodeRejected { reason: String },
    #[error("{0}")]
    ValidationFailed(ValidationErrorSet),
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        let message = value.to_string();
        let details = match value {
            DecodeError::MalformedFieldValue(FieldBindingError::Malformed {
                location,
                field,
                value: raw,
                expected,
            }) => json!({
                "code": "malformed_field_value",
                "source": location.as_str(),
                "field": field,
                "value": raw,
                "expected": expected,
            }),
            DecodeError::MalformedQuery { .. } => json!({ "code": "malformed_query" }),
            DecodeError::BodyParseFailed { model, .. } => {
                json!({ "code": "body_parse_failed", "model": model })
            }
            DecodeError::PreDecodeRejected { .. } => json!({ "code": "pre_decode_rejected" }),
            DecodeError::ValidationFailed(set) => Value::Object(
                set.iter()
                    .map(|(path, text)| (path.to_owned(), Value::String(text.to_owned())))
                    .collect(),
            ),
        };
        Self::invalid_request(message).with_details(details)
    }
}

/// A record describing one endpoint's input.
///
/// JSON body fields come from `serde`; models should carry
/// `#[serde(default)]` so absent keys keep their template values. Fields read
/// from the path, query or headers are listed by [`RequestModel::bindings`].
pub trait RequestModel:
    Validate + Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Namespace used for validation paths, e.g. `CreateEntryRequest`.
    const NAME: &'static str;
    /// Operation label used by the access log and request metrics.
    const OPERATION: &'static str;

    /// Binding table for non-body fields.
    fn bindings() -> Vec<FieldBinding<Self>> {
        Vec::new()
    }
}

/// Hook run on the fresh template before the body is read.
///
/// Returning `Err(reason)` rejects the request.
pub type PreDecodeHook<M> = Box<dyn Fn(&mut M, &HttpRequest) -> Result<(), String> + Send + Sync>;

/// When the body is parsed as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyMode {
    /// Only when `Content-Type` declares JSON.
    #[default]
    JsonContentType,
    /// Whenever the body is non-empty.
    AlwaysJson,
}

/// Template, binding table, hooks and body mode for one model.
pub struct DecodeConfig<M> {
    template: M,
    bindings: Vec<FieldBinding<M>>,
    hooks: Vec<PreDecodeHook<M>>,
    body_mode: BodyMode,
}

impl<M: RequestModel> Default for DecodeConfig<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RequestModel> DecodeConfig<M> {
    /// Default template with the model's own binding table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            template: M::default(),
            bindings: M::bindings(),
            hooks: Vec::new(),
            body_mode: BodyMode::default(),
        }
    }

    /// Replace the template every request starts from.
    #[must_use]
    pub fn with_template(mut self, template: M) -> Self {
        self.template = template;
        self
    }

    /// Append a binding to the table.
    #[must_use]
    pub fn with_binding(mut self, binding: FieldBinding<M>) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Append a pre-decode hook.
    #[must_use]
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut M, &HttpRequest) -> Result<(), String> + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Choose when the body is parsed.
    #[must_use]
    pub const fn with_body_mode(mut self, body_mode: BodyMode) -> Self {
        self.body_mode = body_mode;
        self
    }
}

/// Decodes requests for one model using a shared validator.
pub struct Decoder<M> {
    config: Option<DecodeConfig<M>>,
    validator: Arc<Validator>,
}

impl<M: RequestModel> Decoder<M> {
    /// Decoder producing `M` as configured.
    pub fn new(config: DecodeConfig<M>, validator: Arc<Validator>) -> Self {
        Self {
            config: Some(config),
            validator,
        }
    }

    /// Decoder for endpoints without a request model.
    pub fn bodyless(validator: Arc<Validator>) -> Self {
        Self {
            config: None,
            validator,
        }
    }

    /// Decode `req` and its `body`.
    ///
    /// Returns `Ok(None)` when no model is configured.
    ///
    /// # Errors
    /// The first [`DecodeError`] met, in pipeline order.
    pub fn decode(&self, req: &HttpRequest, body: &[u8]) -> Result<Option<M>, DecodeError> {
        let Some(config) = &self.config else {
            return Ok(None);
        };
        let mut model = config.template.clone();

        for hook in &config.hooks {
            hook(&mut model, req).map_err(|reason| DecodeError::PreDecodeRejected { reason })?;
        }

        let parse_body = match config.body_mode {
            BodyMode::AlwaysJson => true,
            BodyMode::JsonContentType => declares_json(req),
        };
        if parse_body && !body.is_empty() {
            model = merge_json(&model, body)?;
        }

        bind_path(&config.bindings, &mut model, req)?;
        bind_query(&config.bindings, &mut model, req)?;
        bind_headers(&config.bindings, &mut model, req)?;

        self.validator
            .validate(&model, M::NAME)
            .map_err(DecodeError::ValidationFailed)?;
        Ok(Some(model))
    }
}

fn declares_json(req: &HttpRequest) -> bool {
    match req.mime_type() {
        Ok(Some(mime)) => {
            mime.essence_str() == "application/json"
                || mime.suffix().is_some_and(|suffix| suffix.as_str() == "json")
        }
        _ => false,
    }
}

/// Deserialise `body` as a partial update over `template`.
fn merge_json<M: RequestModel>(template: &M, body: &[u8]) -> Result<M, DecodeError> {
    let failed = |err: serde_json::Error| DecodeError::BodyParseFailed {
        model: M::NAME,
        message: err.to_string(),
    };
    let incoming: Value = serde_json::from_slice(body).map_err(failed)?;
    let merged = match (serde_json::to_value(template).map_err(failed)?, incoming) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            overlay_keys(&mut base, overlay);
            Value::Object(base)
        }
        (_, other) => other,
    };
    serde_json::from_value(merged).map_err(failed)
}

fn overlay_keys(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

fn bindings_from<M>(
    bindings: &[FieldBinding<M>],
    source: BindingSource,
) -> impl Iterator<Item = &FieldBinding<M>> {
    bindings.iter().filter(move |binding| binding.source == source)
}

fn bind_path<M>(
    bindings: &[FieldBinding<M>],
    model: &mut M,
    req: &HttpRequest,
) -> Result<(), DecodeError> {
    for binding in bindings_from(bindings, BindingSource::Path) {
        if let Some(raw) = req.match_info().get(binding.tag) {
            binding.bind(model, raw)?;
        }
    }
    Ok(())
}

fn bind_query<M>(
    bindings: &[FieldBinding<M>],
    model: &mut M,
    req: &HttpRequest,
) -> Result<(), DecodeError> {
    let mut wanted = bindings_from(bindings, BindingSource::Query).peekable();
    if wanted.peek().is_none() {
        return Ok(());
    }
    let pairs = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map_err(|err| DecodeError::MalformedQuery {
            message: err.to_string(),
        })?
        .into_inner();

    for binding in wanted {
        if let Some((_, raw)) = pairs.iter().find(|(name, _)| *name == binding.tag) {
            binding.bind(model, raw)?;
        }
    }
    Ok(())
}

fn bind_headers<M>(
    bindings: &[FieldBinding<M>],
    model: &mut M,
    req: &HttpRequest,
) -> Result<(), DecodeError> {
    for binding in bindings_from(bindings, BindingSource::Header) {
        let Some(header) = req.headers().get(binding.tag) else {
            continue;
        };
        let raw = header.to_str().map_err(|_| FieldBindingError::Malformed {
            location: BindingSource::Header,
            field: binding.tag,
            value: String::from_utf8_lossy(header.as_bytes()).into_owned(),
            expected: binding.setter.kind(),
        })?;
        binding.bind(model, raw)?;
    }
    Ok(())
}

/// Extractor yielding the decoded, validated model.
///
/// Requires `web::Data<Decoder<M>>` in application data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<M>(pub M);

impl<M> Decoded<M> {
    /// Unwrap the model.
    pub fn into_inner(self) -> M {
        self.0
    }
}

impl<M: RequestModel> FromRequest for Decoded<M> {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let body = web::Bytes::from_request(&req, payload);
        Box::pin(async move {
            let Some(decoder) = req.app_data::<web::Data<Decoder<M>>>().cloned() else {
                error!(model = M::NAME, "no decoder registered for request model");
                return Err(Error::internal(format!(
                    "no decoder registered for {}",
                    M::NAME
                )));
            };
            req.extensions_mut().insert(DecodedRequest {
                operation: M::OPERATION,
                params: None,
            });
            let body = body.await.map_err(|err| {
                Error::from(DecodeError::BodyParseFailed {
                    model: M::NAME,
                    message: err.to_string(),
                })
            })?;
            match decoder.decode(&req, &body) {
                Ok(Some(model)) => {
                    let params = serde_json::to_string(&model).ok();
                    req.extensions_mut().insert(DecodedRequest {
                        operation: M::OPERATION,
                        params,
                    });
                    Ok(Self(model))
                }
                Ok(None) => {
                    error!(model = M::NAME, "decoder has no request model configured");
                    Err(Error::internal(format!(
                        "no request model configured for {}",
                        M::NAME
                    )))
                }
                Err(err) => {
                    debug!(model = M::NAME, error = %err, "request decoding failed");
                    Err(err.into())
                }
            }
        })
    }
}
