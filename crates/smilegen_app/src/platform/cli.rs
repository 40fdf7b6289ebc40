use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use smilegen_core::{Expression, SharePlatform};
use smilegen_logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "smilegen", version, about = "Give the face in a photo a new expression")]
pub struct Cli {
    /// Also log to the terminal.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log file location; `-` logs to the terminal only.
    #[arg(long, global = true, default_value = smilegen_logging::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Edit a portrait and save the result next to the other outputs.
    Process(ProcessArgs),
    /// Manage the stored AILabTools API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Print a share link for a page.
    Share {
        platform: ShareArg,
        page_url: String,
    },
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// JPEG or PNG portrait, at most 5 MB.
    pub image: PathBuf,

    #[arg(short, long, value_enum, default_value_t = ExpressionArg::DimpleSmile)]
    pub expression: ExpressionArg,

    /// Directory the result is written to.
    #[arg(short, long, default_value = "output")]
    pub out: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum KeyAction {
    /// Store a key; reads one line from stdin when omitted.
    Set { key: Option<String> },
    /// Remove the stored key.
    Clear,
    /// Show which key would be used and where it comes from.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExpressionArg {
    DimpleSmile,
    PearDimpleSmile,
    BigGrin,
    StandardGrin,
    CoolPose,
    Sad,
    ForcedSmile,
    OpeningEyes,
}

impl From<ExpressionArg> for Expression {
    fn from(arg: ExpressionArg) -> Self {
        match arg {
            ExpressionArg::DimpleSmile => Expression::DimpleSmile,
            ExpressionArg::PearDimpleSmile => Expression::PearDimpleSmile,
            ExpressionArg::BigGrin => Expression::BigGrin,
            ExpressionArg::StandardGrin => Expression::StandardGrin,
            ExpressionArg::CoolPose => Expression::CoolPose,
            ExpressionArg::Sad => Expression::Sad,
            ExpressionArg::ForcedSmile => Expression::ForcedSmile,
            ExpressionArg::OpeningEyes => Expression::OpeningEyes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShareArg {
    Facebook,
    Twitter,
    Instagram,
    Copy,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        if self.log_file.as_os_str() == "-" {
            LogDestination::Terminal
        } else if self.verbose {
            LogDestination::Both(self.log_file.clone())
        } else {
            LogDestination::File(self.log_file.clone())
        }
    }
}

impl From<ShareArg> for SharePlatform {
    fn from(arg: ShareArg) -> Self {
        match arg {
            ShareArg::Facebook => SharePlatform::Facebook,
            ShareArg::Twitter => SharePlatform::Twitter,
            ShareArg::Instagram => SharePlatform::Instagram,
            ShareArg::Copy => SharePlatform::Copy,
        }
    }
}
