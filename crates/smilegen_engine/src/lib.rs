//! Smilegen engine: expression API client, result handling and effect execution.
mod client;
mod credential;
mod data_url;
mod engine;
mod persist;
mod placeholder;
mod response;
mod retry;
mod types;
mod upload;

pub use client::{ApiClient, ClientSettings, ExpressionApi, API_KEY_HEADER, REQUEST_ID_HEADER};
pub use credential::{
    resolve_credential, resolve_from, ApiKey, CredentialError, CredentialSource, CredentialStore,
    API_KEY_ENV,
};
pub use data_url::{DataUrl, DataUrlError, DEFAULT_IMAGE_PREFIX};
pub use engine::{
    process_image, ChannelProgressSink, EngineError, EngineHandle, EngineSettings, ProgressSink,
};
pub use persist::{ensure_output_dir, save_result, AtomicFileWriter, PersistError};
pub use placeholder::{render_placeholder, PlaceholderError, BAND_HEIGHT};
pub use retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
pub use types::{
    ClientError, ClientStats, EngineEvent, Expression, FailureKind, JobId, ResultImage, Stage,
};
pub use upload::{optimize_upload, validate_upload, ImageUpload, Optimization, UploadLimits};
