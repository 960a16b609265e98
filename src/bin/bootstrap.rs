//! Lambda entry point behind an API Gateway proxy integration.

use std::sync::Arc;

use dotenv::dotenv;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use travel_gpt::{AwsSecretStore, Handler, HandlerConfig, OpenAiProviderFactory, Request};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false) // CloudWatch does not render colors
        .without_time() // the platform stamps every line
        .init();

    let config = HandlerConfig::from_env();
    info!(
        region = %config.secrets_region,
        model = %config.completion.model,
        whitelisted_ips = config.whitelisted_ips.len(),
        "Travel assistant initializing"
    );

    let secrets = AwsSecretStore::connect(config.secrets_region.clone()).await;
    let providers = OpenAiProviderFactory::new(&config.openai_base_url, config.http.clone());
    let handler = Handler::new(config, Arc::new(secrets), Arc::new(providers));
    let handler = &handler;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let request = Request::from_proxy_event(&event.payload);
        let response = handler.handle(&request).await;
        Ok::<Value, Error>(serde_json::to_value(response)?)
    }))
    .await
}
