//! Request shapes before and after materialization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four parts of an HTTP-shaped request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPart {
    Headers,
    Params,
    Query,
    Body,
}

impl RequestPart {
    pub const ALL: [RequestPart; 4] = [
        RequestPart::Headers,
        RequestPart::Params,
        RequestPart::Query,
        RequestPart::Body,
    ];
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestPart::Headers => "headers",
            RequestPart::Params => "params",
            RequestPart::Query => "query",
            RequestPart::Body => "body",
        };
        f.write_str(s)
    }
}

/// Caller-owned request in its pre-serialization form.
///
/// Parts are held as JSON values; `with_*` accepts anything `Serialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl TypedRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers<T: Serialize>(mut self, headers: &T) -> Result<Self, serde_json::Error> {
        self.headers = Some(serde_json::to_value(headers)?);
        Ok(self)
    }

    pub fn with_params<T: Serialize>(mut self, params: &T) -> Result<Self, serde_json::Error> {
        self.params = Some(serde_json::to_value(params)?);
        Ok(self)
    }

    pub fn with_query<T: Serialize>(mut self, query: &T) -> Result<Self, serde_json::Error> {
        self.query = Some(serde_json::to_value(query)?);
        Ok(self)
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn part(&self, part: RequestPart) -> Option<&serde_json::Value> {
        match part {
            RequestPart::Headers => self.headers.as_ref(),
            RequestPart::Params => self.params.as_ref(),
            RequestPart::Query => self.query.as_ref(),
            RequestPart::Body => self.body.as_ref(),
        }
    }
}

/// Concrete request derived for one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}
