use std::path::PathBuf;
use std::time::{Duration, Instant};

use smilegen_core::{Effect, Msg, ShareAction};
use smilegen_engine::{ClientStats, CredentialStore, EngineEvent, EngineHandle, ImageUpload, JobId};
use smilegen_logging::{smile_info, smile_warn};

use super::mapping::{from_source, map_expression, map_failure, map_stage, to_source};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    store: Option<CredentialStore>,
    upload: Option<ImageUpload>,
    output_dir: PathBuf,
    next_job_id: JobId,
    active_job: Option<JobId>,
    /// Set when the engine reports back on a placeholder that could not be built.
    placeholder_failed: bool,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: Option<CredentialStore>, output_dir: PathBuf) -> Self {
        Self {
            engine,
            store,
            upload: None,
            output_dir,
            next_job_id: 1,
            active_job: None,
            placeholder_failed: false,
        }
    }

    /// Keeps the picked image's bytes; the core state only tracks its metadata.
    pub fn stage_upload(&mut self, upload: ImageUpload) {
        self.upload = Some(upload);
    }

    pub fn placeholder_failed(&self) -> bool {
        self.placeholder_failed
    }

    pub fn stats(&self) -> ClientStats {
        self.engine.stats()
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit { image, expression } => {
                    let Some(upload) = self.upload.clone() else {
                        smile_warn!("Submit for {} without staged image bytes", image.name);
                        continue;
                    };
                    let job_id = self.next_job_id;
                    self.next_job_id += 1;
                    self.active_job = Some(job_id);
                    smile_info!("Submit job_id={} image={}", job_id, image.name);
                    self.engine
                        .process(job_id, upload, map_expression(expression));
                }
                Effect::RenderPlaceholder { image } => match &self.upload {
                    Some(upload) => self.engine.render_placeholder(upload.bytes.clone()),
                    None => {
                        smile_warn!("No bytes to build a placeholder for {}", image.name);
                        self.placeholder_failed = true;
                    }
                },
                Effect::SaveResult { source, filename } => {
                    self.engine
                        .save(from_source(source), self.output_dir.clone(), filename);
                }
                Effect::PromptCredential => {
                    println!("Set an API key with `smilegen key set <KEY>` or the AILABTOOLS_API_KEY variable.");
                }
                Effect::ClearCredential => {
                    self.engine.set_credential(None);
                    if let Some(store) = &self.store {
                        if let Err(err) = store.clear() {
                            smile_warn!("Could not clear stored API key: {}", err);
                        }
                    }
                }
                Effect::Share(action) => print_share(&action),
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that maps to a message.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        let now = Instant::now();
        match event {
            EngineEvent::StageReached { job_id, stage } if self.active_job == Some(job_id) => {
                Some(Msg::StageReached {
                    stage: map_stage(stage),
                    now,
                })
            }
            EngineEvent::StageReached { .. } => Some(Msg::NoOp),
            EngineEvent::JobCompleted { job_id, result } => {
                if self.active_job != Some(job_id) {
                    return Some(Msg::NoOp);
                }
                self.active_job = None;
                Some(match result {
                    Ok(image) => Msg::ProcessingSucceeded {
                        result: to_source(image),
                        now,
                    },
                    Err(err) => {
                        smile_warn!("Job {} failed: {}", job_id, err);
                        Msg::ProcessingFailed {
                            failure: map_failure(&err),
                            now,
                        }
                    }
                })
            }
            EngineEvent::PlaceholderRendered(Ok(data_url)) => Some(Msg::PlaceholderReady(
                smilegen_core::ResultSource::Inline(data_url.into_string()),
            )),
            EngineEvent::PlaceholderRendered(Err(err)) => {
                smile_warn!("Placeholder unavailable: {}", err);
                self.placeholder_failed = true;
                Some(Msg::NoOp)
            }
            EngineEvent::ResultSaved(outcome) => Some(Msg::DownloadFinished(
                outcome.map(|path| path.display().to_string()),
            )),
        }
    }
}

pub fn print_share(action: &ShareAction) {
    match action {
        ShareAction::OpenUrl(url) => println!("Open to share: {url}"),
        ShareAction::CopyLink(url) => println!("Link to share: {url}"),
    }
}
