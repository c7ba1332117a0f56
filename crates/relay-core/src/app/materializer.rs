//! RequestMaterializer - 型付き request を具体的な URL / headers / body に変換
//!
//! # フロー
//! 1. headers / params / query / body を並行にシリアライズ（`tokio::join!`）
//! 2. validation mode が `None` 以外なら検証（soft は通知のみ、hard は中断）
//! 3. header 変換・body エンコード（EncoderTable）
//! 4. URL の `{param}` 置換 + query string 付与

use std::sync::Arc;

use tracing::debug;

use super::encoding::EncoderTable;
use super::url::{append_query, make_query_string, populate_param_markers};
use crate::domain::{
    CallDescriptor, MaterializeError, MaterializedRequest, RequestPart, TypedRequest,
    ValidationError,
};
use crate::ports::{
    PermissiveSchema, RequestSchema, SerializedPart, SubmissionObserver, ValidationIssue,
    ValidationMode,
};

pub struct RequestMaterializer {
    encoders: EncoderTable,
    fallback: Arc<dyn RequestSchema>,
}

impl Default for RequestMaterializer {
    fn default() -> Self {
        Self::new(EncoderTable::default())
    }
}

impl RequestMaterializer {
    pub fn new(encoders: EncoderTable) -> Self {
        Self {
            encoders,
            fallback: Arc::new(PermissiveSchema),
        }
    }

    /// Schema used for parts the call declares no schema for.
    pub fn with_fallback_schema(mut self, schema: Arc<dyn RequestSchema>) -> Self {
        self.fallback = schema;
        self
    }

    fn serialize_part<'a>(
        &'a self,
        call: &'a CallDescriptor,
        request: &'a TypedRequest,
        part: RequestPart,
        mode: ValidationMode,
    ) -> impl Future<Output = SerializedPart> + Send + 'a {
        let schema = call
            .schemas()
            .get(part)
            .map_or(self.fallback.as_ref(), |s| s.as_ref());
        schema.serialize(request.part(part), mode)
    }

    pub async fn materialize(
        &self,
        call: &CallDescriptor,
        request: &TypedRequest,
        mode: ValidationMode,
        observer: &dyn SubmissionObserver,
    ) -> Result<MaterializedRequest, MaterializeError> {
        let (headers, params, query, body) = tokio::join!(
            self.serialize_part(call, request, RequestPart::Headers, mode),
            self.serialize_part(call, request, RequestPart::Params, mode),
            self.serialize_part(call, request, RequestPart::Query, mode),
            self.serialize_part(call, request, RequestPart::Body, mode),
        );

        if mode != ValidationMode::None
            && let Some((part, issue)) = first_issue([&headers, &params, &query, &body])
        {
            observer.on_validation_error(call, request, part, issue);
            if mode == ValidationMode::Hard {
                return Err(ValidationError {
                    part,
                    message: issue.message.clone(),
                }
                .into());
            }
            debug!(call = call.name(), %part, message = %issue.message, "soft validation issue");
        }

        let encoding = call.encoding();
        let header_map = self
            .encoders
            .convert_headers(encoding, headers.value.as_ref())?;
        let encoded_body = self.encoders.encode_body(encoding, body.value.as_ref())?;

        let path = populate_param_markers(call.url_template(), params.value.as_ref())?;
        let url = append_query(&path, &make_query_string(query.value.as_ref()));

        Ok(MaterializedRequest {
            url,
            headers: header_map,
            body: encoded_body,
        })
    }
}

/// First issue in headers, params, query, body order.
fn first_issue(serialized: [&SerializedPart; 4]) -> Option<(RequestPart, &ValidationIssue)> {
    RequestPart::ALL
        .into_iter()
        .zip(serialized)
        .find_map(|(part, s)| s.issue.as_ref().map(|issue| (part, issue)))
}
