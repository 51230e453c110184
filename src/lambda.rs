#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "lambda")]
use shift_report_etl::config::lambda::{LambdaConfig, S3Storage};
#[cfg(feature = "lambda")]
use shift_report_etl::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use shift_report_etl::{EtlEngine, LineReplyClient, ReportPipeline, WebhookResponse};

/// Function URL request; only the fields the webhook needs.
#[cfg(feature = "lambda")]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_context: Option<RequestContext>,
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
pub struct RequestContext {
    pub http: HttpContext,
}

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
pub struct HttpContext {
    pub method: String,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: std::collections::HashMap<String, String>,
    pub body: String,
}

#[cfg(feature = "lambda")]
impl Response {
    fn json(content: &WebhookResponse) -> Result<Self, Error> {
        Ok(Self {
            status_code: 200,
            headers: [("content-type".to_string(), "application/json".to_string())].into(),
            body: serde_json::to_string(content)?,
        })
    }
}

#[cfg(feature = "lambda")]
fn load_config() -> shift_report_etl::Result<LambdaConfig> {
    let config = LambdaConfig::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    let request = event.payload;
    let method = request
        .request_context
        .as_ref()
        .map(|ctx| ctx.http.method.clone())
        .unwrap_or_else(|| "POST".to_string());

    if method.eq_ignore_ascii_case("GET") {
        return Response::json(&WebhookResponse::get_ok());
    }

    if request.is_base64_encoded {
        tracing::warn!("Base64 encoded bodies are not supported");
        let error = shift_report_etl::EtlError::webhook("Unsupported body encoding");
        return Response::json(&WebhookResponse::failed(&error));
    }

    let lambda_config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Lambda configuration error: {}", e);
            return Response::json(&WebhookResponse::failed(&e));
        }
    };

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let s3_client = S3Client::from_conf(s3_config);

    let storage = S3Storage::new(
        s3_client,
        lambda_config.s3_bucket.clone(),
        lambda_config.s3_prefix.clone(),
    );
    let replier = LineReplyClient::from_config(&lambda_config);
    let engine = EtlEngine::new(ReportPipeline::new(storage, lambda_config, replier));

    let response = engine
        .handle_webhook(&method, request.body.as_deref())
        .await;
    if response.is_ok() {
        tracing::info!("Webhook handled: {}", response.content);
    }

    Response::json(&response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
