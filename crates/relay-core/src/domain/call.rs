//! CallDescriptor - API 呼び出しの静的な定義
//!
//! 1 つの API エンドポイントにつき 1 回だけ定義し、すべての submit で共有します。
//!
//! # 学習ポイント
//! - Builder スタイルの `with_*` メソッド
//! - `Arc<dyn Trait>` による schema ハンドルの共有

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::request::RequestPart;
use crate::ports::RequestSchema;

/// HTTP method of the deferred call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Link,
    Unlink,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Link => "LINK",
            HttpMethod::Unlink => "UNLINK",
        }
    }

    /// LINK / UNLINK have no task-queue dispatch equivalent.
    pub fn is_dispatchable(self) -> bool {
        !matches!(self, HttpMethod::Link | HttpMethod::Unlink)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the request body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingKind {
    #[default]
    Json,
    FormData,
    Binary,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncodingKind::Json => "json",
            EncodingKind::FormData => "form-data",
            EncodingKind::Binary => "binary",
        };
        f.write_str(s)
    }
}

/// Logical destination group. Calls sharing a routing class share queue,
/// project, location and service account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingClass(String);

impl RoutingClass {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Schema handles for each request part. `None` means "accept anything".
#[derive(Clone, Default)]
pub struct CallSchemas {
    pub headers: Option<Arc<dyn RequestSchema>>,
    pub params: Option<Arc<dyn RequestSchema>>,
    pub query: Option<Arc<dyn RequestSchema>>,
    pub body: Option<Arc<dyn RequestSchema>>,
}

impl CallSchemas {
    pub fn get(&self, part: RequestPart) -> Option<&Arc<dyn RequestSchema>> {
        match part {
            RequestPart::Headers => self.headers.as_ref(),
            RequestPart::Params => self.params.as_ref(),
            RequestPart::Query => self.query.as_ref(),
            RequestPart::Body => self.body.as_ref(),
        }
    }
}

impl fmt::Debug for CallSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSchemas")
            .field("headers", &self.headers.is_some())
            .field("params", &self.params.is_some())
            .field("query", &self.query.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Immutable description of one API endpoint.
///
/// # 使用例
/// ```ignore
/// let call = CallDescriptor::new("sendReminder", HttpMethod::Post, "/reminders/{id}/send")
///     .with_routing_class("internal")
///     .with_params_schema(Arc::new(MyParamsSchema));
/// ```
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    name: String,
    method: HttpMethod,
    url_template: String,
    routing_class: RoutingClass,
    encoding: EncodingKind,
    schemas: CallSchemas,
}

impl CallDescriptor {
    pub fn new(name: impl Into<String>, method: HttpMethod, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            url_template: url_template.into(),
            routing_class: RoutingClass::new("default"),
            encoding: EncodingKind::Json,
            schemas: CallSchemas::default(),
        }
    }

    pub fn with_routing_class(mut self, routing_class: impl Into<String>) -> Self {
        self.routing_class = RoutingClass::new(routing_class);
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingKind) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_headers_schema(mut self, schema: Arc<dyn RequestSchema>) -> Self {
        self.schemas.headers = Some(schema);
        self
    }

    pub fn with_params_schema(mut self, schema: Arc<dyn RequestSchema>) -> Self {
        self.schemas.params = Some(schema);
        self
    }

    pub fn with_query_schema(mut self, schema: Arc<dyn RequestSchema>) -> Self {
        self.schemas.query = Some(schema);
        self
    }

    pub fn with_body_schema(mut self, schema: Arc<dyn RequestSchema>) -> Self {
        self.schemas.body = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn routing_class(&self) -> &RoutingClass {
        &self.routing_class
    }

    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    pub fn schemas(&self) -> &CallSchemas {
        &self.schemas
    }
}
