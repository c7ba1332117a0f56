use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_core::app::TaskSubmitterBuilder;
use relay_core::config::{ConfigError, DispatchConfig, RouteConfig};
use relay_core::domain::{
    CallDescriptor, HttpMethod, LimitType, SubmissionResult, SubmitOptions, TypedRequest,
};
use relay_core::impls::{InMemoryTaskBackend, TracingObserver};
use relay_core::ports::{RequestSchema, SerializedPart, ValidationIssue, ValidationMode};

#[derive(Debug, Serialize)]
struct ReminderParams {
    id: String,
}

#[derive(Debug, Serialize)]
struct ReminderBody {
    channel: String,
    attempt: u32,
}

/// body に `channel` 文字列を要求する schema
struct ReminderBodySchema;

#[async_trait]
impl RequestSchema for ReminderBodySchema {
    async fn serialize(&self, value: Option<&Value>, _mode: ValidationMode) -> SerializedPart {
        match value.and_then(|v| v.get("channel")).and_then(Value::as_str) {
            Some(_) => SerializedPart::valid(value.cloned()),
            None => SerializedPart::invalid(
                value.cloned(),
                ValidationIssue::new("channel must be a string").at("channel"),
            ),
        }
    }
}

/// 引数のパス → `relay.toml` の順に探し、無ければデモ用のデフォルト
fn load_config(arg: Option<String>) -> Result<DispatchConfig, ConfigError> {
    let candidates: Vec<String> = arg.into_iter().chain(["relay.toml".to_string()]).collect();

    if let Some(path) = candidates.iter().find(|p| Path::new(p).exists()) {
        let config = DispatchConfig::load(path)?;
        info!(path = %path, "loaded configuration");
        return Ok(config);
    }

    info!("no config file found, using demo defaults");
    let mut config = DispatchConfig::default();
    config.set_defaults(RouteConfig {
        project: "demo-project".to_string(),
        location: "us-central1".to_string(),
        queue: "deferred-calls".to_string(),
        service_account_email: "relay@demo-project.iam.gserviceaccount.com".to_string(),
        url_base: Some("https://api.example.test".to_string()),
    });
    Ok(config)
}

fn print_result(label: &str, result: &SubmissionResult) {
    match serde_json::to_string(result) {
        Ok(json) => println!("{label}: {json}"),
        Err(e) => println!("{label}: <unprintable: {e}>"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // (A) 設定と backend を用意（backend は遅延ありで同時実行を重ねる）
    let config = load_config(std::env::args().nth(1))?;
    let backend = Arc::new(InMemoryTaskBackend::new().with_latency(Duration::from_millis(25)));

    let submitter = Arc::new(
        TaskSubmitterBuilder::new()
            .backend(backend.clone())
            .config(config)
            .observer(Arc::new(TracingObserver))
            .expect_routes(&["default"])
            .build()?,
    );

    let call = CallDescriptor::new("sendReminder", HttpMethod::Post, "/reminders/{id}/send")
        .with_body_schema(Arc::new(ReminderBodySchema));

    // (B) 同じバケットに入る同等の submit を同時に 5 件
    let mut joins = Vec::new();
    for attempt in 0..5 {
        let submitter = submitter.clone();
        let call = call.clone();
        let request = TypedRequest::new()
            .with_params(&ReminderParams { id: "r-42".to_string() })?
            .with_body(&ReminderBody {
                channel: "email".to_string(),
                attempt,
            })?;
        joins.push(tokio::spawn(async move {
            submitter
                .submit(&call, &request, &SubmitOptions::default().with_delay_ms(1_000))
                .await
        }));
    }
    for (i, join) in joins.into_iter().enumerate() {
        print_result(&format!("burst[{i}]"), &join.await??);
    }

    // (C) limiting 無効なら毎回新しいタスク
    let request = TypedRequest::new()
        .with_params(&ReminderParams { id: "r-42".to_string() })?
        .with_body(&ReminderBody {
            channel: "sms".to_string(),
            attempt: 0,
        })?;
    let unlimited = SubmitOptions::default().with_limit_type(LimitType::None);
    print_result("unlimited", &submitter.submit(&call, &request, &unlimited).await?);

    // (D) backend に作られたタスク
    for task in backend.tasks() {
        println!(
            "task: {} schedule_ms={:?}",
            task.name,
            task.schedule_time.map(|t| t.epoch_ms())
        );
    }
    Ok(())
}
