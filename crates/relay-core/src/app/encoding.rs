//! Encoding - body encoder テーブルと header 変換
//!
//! # 設計
//! - encoder は EncodingKind をキーにした純粋関数のテーブル
//! - テーブルに無い kind（form-data / binary）は ConfigurationError
//! - エントリを追加するだけで拡張できる

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::url::stringify;
use crate::domain::{ConfigurationError, EncodingKind, MaterializeError};

pub const CONTENT_TYPE: &str = "content-type";

/// Pure body encoder.
pub type BodyEncodeFn = fn(&Value) -> Result<Vec<u8>, String>;

#[derive(Debug, Clone, Copy)]
pub struct BodyEncoder {
    /// Injected when the request carries no `content-type`.
    pub default_content_type: &'static str,
    pub encode: BodyEncodeFn,
}

fn encode_json(body: &Value) -> Result<Vec<u8>, String> {
    serde_json::to_vec(body).map_err(|e| e.to_string())
}

/// Encoders keyed by encoding kind.
#[derive(Debug, Clone)]
pub struct EncoderTable {
    encoders: HashMap<EncodingKind, BodyEncoder>,
}

impl Default for EncoderTable {
    /// JSON only.
    fn default() -> Self {
        let mut encoders = HashMap::new();
        encoders.insert(
            EncodingKind::Json,
            BodyEncoder {
                default_content_type: "application/json",
                encode: encode_json,
            },
        );
        Self { encoders }
    }
}

impl EncoderTable {
    pub fn with_encoder(mut self, kind: EncodingKind, encoder: BodyEncoder) -> Self {
        self.encoders.insert(kind, encoder);
        self
    }

    pub fn get(&self, kind: EncodingKind) -> Result<&BodyEncoder, ConfigurationError> {
        self.encoders
            .get(&kind)
            .ok_or(ConfigurationError::UnsupportedEncoding(kind))
    }

    /// Lower-case names, drop nulls, stringify values, inject the default content type.
    pub fn convert_headers(
        &self,
        kind: EncodingKind,
        headers: Option<&Value>,
    ) -> Result<BTreeMap<String, String>, ConfigurationError> {
        let encoder = self.get(kind)?;

        let mut out = BTreeMap::new();
        if let Some(Value::Object(entries)) = headers {
            for (name, value) in entries {
                if value.is_null() {
                    continue;
                }
                out.insert(name.to_lowercase(), stringify(value));
            }
        }

        out.entry(CONTENT_TYPE.to_string())
            .or_insert_with(|| encoder.default_content_type.to_string());
        Ok(out)
    }

    /// `None` body stays `None`.
    pub fn encode_body(
        &self,
        kind: EncodingKind,
        body: Option<&Value>,
    ) -> Result<Option<Vec<u8>>, MaterializeError> {
        let encoder = self.get(kind)?;
        body.map(|b| (encoder.encode)(b).map_err(MaterializeError::Encoding))
            .transpose()
    }
}
