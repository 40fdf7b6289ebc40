use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use smilegen_logging::{smile_error, smile_info, smile_warn};
use thiserror::Error;

use crate::client::{ApiClient, ClientSettings, ExpressionApi};
use crate::retry::{Sleeper, TokioSleeper};
use crate::{
    render_placeholder, save_result, ApiKey, ClientError, ClientStats, EngineEvent, Expression,
    ImageUpload, JobId, ResultImage, Stage,
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    /// Pause between the early checkpoints so progress does not jump straight to 50%.
    pub pacing: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            pacing: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    Process {
        job_id: JobId,
        upload: ImageUpload,
        expression: Expression,
    },
    RenderPlaceholder {
        original: Vec<u8>,
    },
    Save {
        image: ResultImage,
        dir: PathBuf,
        filename: String,
    },
    SetCredential(Option<ApiKey>),
}

/// Runs API work on a background Tokio runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    client: Arc<ApiClient>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let client = Arc::new(ApiClient::new(settings.client)?);
        Self::with_client(client, Arc::new(TokioSleeper), settings.pacing)
    }

    pub fn with_client(
        client: Arc<ApiClient>,
        sleeper: Arc<dyn Sleeper>,
        pacing: Duration,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let worker_client = client.clone();

        thread::spawn(move || {
            let client = worker_client;
            while let Ok(command) = cmd_rx.recv() {
                if let EngineCommand::SetCredential(credential) = command {
                    client.set_credential(credential);
                    continue;
                }
                let client = client.clone();
                let sleeper = sleeper.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let sink = ChannelProgressSink::new(event_tx);
                    handle_command(client.as_ref(), sleeper.as_ref(), pacing, command, &sink)
                        .await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            client,
        })
    }

    pub fn set_credential(&self, credential: Option<ApiKey>) {
        let _ = self.cmd_tx.send(EngineCommand::SetCredential(credential));
    }

    pub fn process(&self, job_id: JobId, upload: ImageUpload, expression: Expression) {
        let _ = self.cmd_tx.send(EngineCommand::Process {
            job_id,
            upload,
            expression,
        });
    }

    pub fn render_placeholder(&self, original: Vec<u8>) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::RenderPlaceholder { original });
    }

    pub fn save(&self, image: ResultImage, dir: PathBuf, filename: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Save {
            image,
            dir,
            filename: filename.into(),
        });
    }

    pub fn stats(&self) -> ClientStats {
        self.client.stats()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    api: &dyn ExpressionApi,
    sleeper: &dyn Sleeper,
    pacing: Duration,
    command: EngineCommand,
    sink: &dyn ProgressSink,
) {
    match command {
        EngineCommand::Process {
            job_id,
            upload,
            expression,
        } => {
            let result = process_image(api, sleeper, pacing, job_id, &upload, expression, sink).await;
            sink.emit(EngineEvent::JobCompleted { job_id, result });
        }
        EngineCommand::RenderPlaceholder { original } => {
            let rendered = tokio::task::spawn_blocking(move || render_placeholder(&original))
                .await
                .map_err(|err| err.to_string())
                .and_then(|result| result.map_err(|err| err.to_string()));
            if let Err(err) = &rendered {
                smile_warn!("Placeholder rendering failed: {}", err);
            }
            sink.emit(EngineEvent::PlaceholderRendered(rendered));
        }
        EngineCommand::Save {
            image,
            dir,
            filename,
        } => {
            let saved = save_result(api, &image, &dir, &filename)
                .await
                .map_err(|err| err.to_string());
            if let Err(err) = &saved {
                smile_error!("Saving {} failed: {}", filename, err);
            }
            sink.emit(EngineEvent::ResultSaved(saved));
        }
        EngineCommand::SetCredential(_) => {}
    }
}

/// One processing run: checkpoints around a single submit call.
pub async fn process_image(
    api: &dyn ExpressionApi,
    sleeper: &dyn Sleeper,
    pacing: Duration,
    job_id: JobId,
    upload: &ImageUpload,
    expression: Expression,
    sink: &dyn ProgressSink,
) -> Result<ResultImage, ClientError> {
    let stage = |stage| sink.emit(EngineEvent::StageReached { job_id, stage });

    stage(Stage::Preparing);
    sleeper.sleep(pacing).await;
    stage(Stage::Sending);
    sleeper.sleep(pacing).await;
    stage(Stage::Analyzing);

    let result = api.submit_image(upload, expression).await;
    match &result {
        Ok(_) => {
            stage(Stage::Generating);
            smile_info!("Job {} succeeded", job_id);
        }
        Err(err) => smile_warn!("Job {} failed: {}", job_id, err),
    }
    result
}
