use std::io::{self, BufRead};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use smilegen_core::{update, AppState, Effect, Msg};
use smilegen_engine::{
    optimize_upload, resolve_credential, validate_upload, CredentialSource, CredentialStore,
    EngineHandle, ImageUpload,
};
use smilegen_logging::{smile_info, smile_warn};

use super::cli::{Cli, Command, KeyAction, ProcessArgs};
use super::config::load_settings;
use super::effects::{print_share, EffectRunner};
use super::mapping::selected_image;
use super::render::Renderer;

/// Frame interval for progress easing while waiting on the engine.
const TICK_INTERVAL: Duration = Duration::from_millis(16);
/// Exit status when processing could not start because no key is configured.
const EXIT_NO_CREDENTIAL: u8 = 2;

pub fn run_app() -> Result<ExitCode> {
    let cli = Cli::parse();
    smilegen_logging::initialize(cli.log_destination(), LevelFilter::Info);

    match cli.command {
        Command::Process(args) => run_process(args),
        Command::Key { action } => run_key(action),
        Command::Share { platform, page_url } => {
            let (_, effects) = update(
                AppState::new(),
                Msg::ShareClicked {
                    platform: platform.into(),
                    page_url,
                },
            );
            for effect in effects {
                if let Effect::Share(action) = effect {
                    print_share(&action);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_process(args: ProcessArgs) -> Result<ExitCode> {
    let settings = load_settings()?;
    let limits = settings.client.limits.clone();

    let store = match CredentialStore::default_location() {
        Ok(store) => Some(store),
        Err(err) => {
            smile_warn!("Credential store unavailable: {}", err);
            None
        }
    };
    let credential = resolve_credential(store.as_ref());
    let engine = EngineHandle::new(settings).context("cannot start processing engine")?;
    if let Some((key, source)) = &credential {
        smile_info!("Using API key {} from {}", key.masked(), describe_source(*source));
        engine.set_credential(Some(key.clone()));
    }

    let mut session = Session::new(
        AppState::with_credential(credential.is_some()),
        EffectRunner::new(engine, store, args.out.clone()),
    );
    session.dispatch(Msg::ExpressionSelected(args.expression.into()));

    let upload = ImageUpload::from_path(&args.image)
        .and_then(|upload| optimize_upload(upload, &limits))
        .and_then(|(upload, optimization)| {
            validate_upload(&upload, &limits).map(|()| (upload, optimization))
        });
    match upload {
        Ok((upload, optimization)) => {
            let image = selected_image(&upload, optimization.as_ref());
            session.runner.stage_upload(upload);
            session.dispatch(Msg::ImageSelected(image));
        }
        Err(err) => {
            session.dispatch(Msg::ImageRejected(err.message));
            return Ok(ExitCode::FAILURE);
        }
    }

    session.dispatch(Msg::ProcessClicked {
        now: Instant::now(),
    });
    if !session.state.is_busy() {
        return Ok(ExitCode::from(EXIT_NO_CREDENTIAL));
    }

    let outcome = session.run_to_completion();
    let stats = session.runner.stats();
    smile_info!(
        "Requests: {}, errors: {}, success rate: {:.1}%",
        stats.requests,
        stats.errors,
        stats.success_rate()
    );
    Ok(match outcome {
        Outcome::Edited => ExitCode::SUCCESS,
        Outcome::Fallback | Outcome::Failed => ExitCode::FAILURE,
    })
}

fn run_key(action: KeyAction) -> Result<ExitCode> {
    let store = CredentialStore::default_location()?;
    match action {
        KeyAction::Set { key } => {
            let raw = match key {
                Some(key) => key,
                None => read_line().context("cannot read API key from stdin")?,
            };
            match store.set(&raw)? {
                Some(key) => println!("Stored API key {} in {}", key.masked(), store.path().display()),
                None => println!("Empty key given; stored API key removed."),
            }
        }
        KeyAction::Clear => {
            store.clear()?;
            println!("Stored API key removed.");
        }
        KeyAction::Show => match resolve_credential(Some(&store)) {
            Some((key, source)) => {
                println!("Using API key {} from {}", key.masked(), describe_source(source));
            }
            None => println!("No API key configured."),
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn describe_source(source: CredentialSource) -> &'static str {
    match source {
        CredentialSource::BuildTime => "the build configuration",
        CredentialSource::Environment => "the environment",
        CredentialSource::Stored => "the local key store",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Edited,
    Fallback,
    Failed,
}

/// Owns the session state and drives `update` with user and engine messages.
struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl Session {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self {
            state,
            runner,
            renderer: Renderer::default(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
        if self.state.consume_dirty() {
            let status = self.state.progress().status_line(Instant::now());
            self.renderer.render(&self.state.view(), status);
        }
    }

    /// Pumps engine events until the result (real or fallback) is written.
    fn run_to_completion(&mut self) -> Outcome {
        let mut edited = false;
        loop {
            let msg = self.runner.next_msg(TICK_INTERVAL).unwrap_or(Msg::Tick);
            let result_ready = match &msg {
                Msg::ProcessingSucceeded { .. } => {
                    edited = true;
                    true
                }
                Msg::PlaceholderReady(_) => true,
                _ => false,
            };
            let saved = match &msg {
                Msg::DownloadFinished(outcome) => Some(outcome.is_ok()),
                _ => None,
            };

            self.dispatch(msg);
            if result_ready {
                self.settle_progress();
                self.dispatch(Msg::DownloadClicked);
            }

            match saved {
                Some(true) if edited => return Outcome::Edited,
                Some(true) => return Outcome::Fallback,
                Some(false) => return Outcome::Failed,
                None if self.runner.placeholder_failed() => return Outcome::Failed,
                None => {}
            }
        }
    }

    fn settle_progress(&mut self) {
        while !self.state.progress().is_settled() {
            self.dispatch(Msg::Tick);
        }
    }
}
