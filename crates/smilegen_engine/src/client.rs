use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use smilegen_logging::{smile_debug, smile_info, smile_warn};
use uuid::Uuid;

use crate::response::{
    message_from_text, parse_body, parse_poll, parse_submit, PollStatus, SubmitShape,
};
use crate::retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::{
    validate_upload, ApiKey, ClientError, ClientStats, Expression, FailureKind, ImageUpload,
    ResultImage, UploadLimits,
};

pub const API_KEY_HEADER: &str = "ailabapi-api-key";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub expression_path: String,
    /// Job-status endpoint; the job id is appended as a path segment.
    pub result_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    pub limits: UploadLimits,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.ailabapi.com".to_string(),
            expression_path: "/api/portrait/effects/emotion-editor".to_string(),
            result_path: "/api/v1/result".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(2),
            poll_attempts: 30,
            limits: UploadLimits::default(),
        }
    }
}

#[async_trait::async_trait]
pub trait ExpressionApi: Send + Sync {
    /// Sends one image for editing and returns the edited result.
    async fn submit_image(
        &self,
        upload: &ImageUpload,
        expression: Expression,
    ) -> Result<ResultImage, ClientError>;

    /// Downloads a hosted result.
    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, ClientError>;
}

#[derive(Debug, Default)]
struct StatsCounter {
    requests: AtomicU64,
    errors: AtomicU64,
}

pub struct ApiClient {
    settings: ClientSettings,
    http: reqwest::Client,
    credential: RwLock<Option<ApiKey>>,
    sleeper: Arc<dyn Sleeper>,
    stats: StatsCounter,
}

impl ApiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        Self::with_sleeper(settings, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        settings: ClientSettings,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            http,
            credential: RwLock::new(None),
            sleeper,
            stats: StatsCounter::default(),
        })
    }

    pub fn with_credential(self, credential: ApiKey) -> Self {
        self.set_credential(Some(credential));
        self
    }

    pub fn set_credential(&self, credential: Option<ApiKey>) {
        if let Ok(mut slot) = self.credential.write() {
            *slot = credential;
        }
    }

    pub fn has_credential(&self) -> bool {
        self.current_credential().is_ok()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            requests: self.stats.requests.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
        }
    }

    /// Polls the job-status endpoint until the job reaches a terminal status.
    ///
    /// Only transient failures (network errors, 5xx) are polled through; anything
    /// else ends the wait with that error.
    pub async fn poll_result(&self, job_id: &str) -> Result<ResultImage, ClientError> {
        let credential = self.current_credential()?;
        let url = format!("{}/{}", self.endpoint(&self.settings.result_path), job_id);
        let attempts = self.settings.poll_attempts.max(1);

        for attempt in 1..=attempts {
            match self.poll_once(&url, &credential).await {
                Ok(PollStatus::Done(image)) => {
                    smile_info!("Job {} finished after {} polls", job_id, attempt);
                    return Ok(image);
                }
                Ok(PollStatus::Failed(message)) => {
                    return Err(ClientError::new(FailureKind::Api { status: None }, message));
                }
                Ok(PollStatus::Pending) => {
                    smile_debug!("Job {} pending (poll {}/{})", job_id, attempt, attempts);
                }
                Err(err) if attempt == attempts || !RetryPolicy::is_retryable(&err.kind) => {
                    return Err(err);
                }
                Err(err) => {
                    smile_warn!("Poll {}/{} for job {} failed: {}", attempt, attempts, job_id, err);
                }
            }
            if attempt < attempts {
                self.sleeper.sleep(self.settings.poll_interval).await;
            }
        }

        Err(ClientError::new(
            FailureKind::ResultNotReady,
            "Processing timeout - result not ready",
        ))
    }

    async fn poll_once(&self, url: &str, credential: &ApiKey) -> Result<PollStatus, ClientError> {
        let response = self
            .send_with_retry(credential, || Ok(self.http.get(url)))
            .await?;
        let body = read_body(response).await?;
        parse_poll(&parse_body(&body)?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn current_credential(&self) -> Result<ApiKey, ClientError> {
        self.credential
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .ok_or_else(|| {
                ClientError::new(
                    FailureKind::MissingCredential,
                    "API key is required. Please set your AILabTools API key.",
                )
            })
    }

    /// Sends the request built by `build`, retrying transient failures.
    ///
    /// The builder runs once per attempt because multipart bodies are consumed on send.
    async fn send_with_retry<F>(
        &self,
        credential: &ApiKey,
        build: F,
    ) -> Result<reqwest::Response, ClientError>
    where
        F: Fn() -> Result<RequestBuilder, ClientError> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let request = build()?
                .header(API_KEY_HEADER, credential.expose())
                .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
            let err = match self.execute(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            match self.settings.retry.after_failure(attempt, &err.kind) {
                RetryDecision::Retry { retry, delay } => {
                    smile_warn!(
                        "Request failed ({}), retrying in {:?} ({}/{})",
                        err,
                        delay,
                        retry,
                        self.settings.retry.max_retries
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => return Err(err),
            }
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);
        let result = match request.send().await {
            Ok(response) => check_status(response).await,
            Err(err) => Err(map_reqwest_error(err)),
        };
        if result.is_err() {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

#[async_trait::async_trait]
impl ExpressionApi for ApiClient {
    async fn submit_image(
        &self,
        upload: &ImageUpload,
        expression: Expression,
    ) -> Result<ResultImage, ClientError> {
        validate_upload(upload, &self.settings.limits)?;
        let credential = self.current_credential()?;
        let url = self.endpoint(&self.settings.expression_path);
        smile_info!(
            "Submitting {} ({} bytes, {}) with expression {}",
            upload.file_name,
            upload.size(),
            upload.mime,
            expression.code()
        );

        let response = self
            .send_with_retry(&credential, || {
                let part = Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.mime)
                    .map_err(|err| ClientError::new(FailureKind::Validation, err.to_string()))?;
                let form = Form::new()
                    .part("image_target", part)
                    .text("service_choice", expression.code().to_string());
                Ok(self.http.post(&url).multipart(form))
            })
            .await?;

        let body = read_body(response).await?;
        match parse_submit(&parse_body(&body)?)? {
            SubmitShape::Image(image) => Ok(image),
            SubmitShape::Job(job_id) => {
                smile_info!("Service queued job {}; polling for the result", job_id);
                self.poll_result(&job_id).await
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))?;
        let response = self.execute(self.http.get(parsed)).await?;
        read_body(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = message_from_text(&text).unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
    });
    Err(ClientError::new(
        FailureKind::Api {
            status: Some(status.as_u16()),
        },
        message,
    ))
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ClientError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(map_reqwest_error)
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
