use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use desfire::card::MAX_FRAMES;
use desfire::directory::ApplicationId;
use desfire::pcsc::{Context, PcscCard};
use desfire::session::{DEFAULT_APPLICATION_ID, DEFAULT_FILE_NO};
use desfire::{Card, Session, SessionConfig, SessionError};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Error occurred on communicating with PC/SC: {0}")]
    Pcsc(#[from] desfire::pcsc::Error),

    #[error("The card returned an error: {0}")]
    Card(#[from] desfire::Error),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Reads the balance of a DESFire value file from a PC/SC reader.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Raises the log level; can be repeated. RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Prints the result as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Reads the current value and the last transaction (default).
    Balance(Target),

    /// Prints the manufacturing data of the card.
    Version,

    /// Lists the applications on the card.
    Apps,

    /// Lists the files in an application.
    Files {
        /// Application identifier in hex.
        #[arg(long, default_value_t = DEFAULT_APPLICATION_ID)]
        aid: ApplicationId,
    },

    /// Prints the settings of a file.
    Settings(Target),
}

#[derive(Args)]
struct Target {
    /// Application identifier in hex.
    #[arg(long, default_value_t = DEFAULT_APPLICATION_ID)]
    aid: ApplicationId,

    /// File number in the application.
    #[arg(long, default_value_t = DEFAULT_FILE_NO)]
    file: u8,

    /// Frames accepted in a chained response.
    #[arg(long, default_value_t = MAX_FRAMES)]
    max_frames: usize,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            aid: DEFAULT_APPLICATION_ID,
            file: DEFAULT_FILE_NO,
            max_frames: MAX_FRAMES,
        }
    }
}

impl From<&Target> for SessionConfig {
    fn from(target: &Target) -> Self {
        Self {
            application_id: target.aid,
            file_no: target.file,
            max_frames: target.max_frames,
        }
    }
}

fn print<T>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()>
where
    T: Serialize,
{
    match json {
        true => println!("{}", serde_json::to_string_pretty(value)?),
        _ => println!("{}", text(value)),
    }

    Ok(())
}

/// Runs the closure against the card, then invalidates it with the outcome.
fn with_card<T, F>(card: PcscCard<'static>, f: F) -> Result<T>
where
    F: FnOnce(&Card<PcscCard<'static>, ()>) -> desfire::Result<T>,
{
    let card = Card::new(Box::new(card));
    let result = f(&card);
    card.invalidate((), result.as_ref().err().map(|e| e.to_string()).as_deref());

    Ok(result?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::try_new()?;
    let device = ctx.open()?;
    let card = device.connect(ctx)?;

    match cli.command.unwrap_or_else(|| Command::Balance(Target::default())) {
        Command::Balance(target) => {
            info!("Reading file {} of application {}", target.file, target.aid);

            let balance = Session::new(Box::new(card), SessionConfig::from(&target)).run(())?;
            print(cli.json, &balance, |b| {
                format!(
                    "Current value: {}\nLast transaction: {}",
                    b.value, b.last_transaction
                )
            })
        }
        Command::Version => {
            let version = with_card(card, |card| card.version(()))?;
            print(cli.json, &version, |v| {
                format!(
                    "Hardware: vendor {:#04X}, type {:#04X}, v{}.{}, {} octets{}\n\
                     Software: vendor {:#04X}, type {:#04X}, v{}.{}\n\
                     UID: {}\n\
                     Batch: {}\n\
                     Production: week {:02X} of 20{:02X}",
                    v.hardware.vendor,
                    v.hardware.kind,
                    v.hardware.major,
                    v.hardware.minor,
                    v.hardware.storage_bytes().0,
                    if v.hardware.storage_bytes().1 { "+" } else { "" },
                    v.software.vendor,
                    v.software.kind,
                    v.software.major,
                    v.software.minor,
                    hex::encode_upper(v.uid),
                    hex::encode_upper(v.batch),
                    v.production_week,
                    v.production_year,
                )
            })
        }
        Command::Apps => {
            let ids = with_card(card, |card| card.application_ids(()))?;
            print(cli.json, &ids, |ids| {
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Files { aid } => {
            let ids = with_card(card, |card| {
                card.select_application((), aid)
                    .and_then(|_| card.file_ids(()))
            })?;
            print(cli.json, &ids, |ids| {
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Settings(target) => {
            let settings = with_card(card, |card| {
                card.select_application((), target.aid)
                    .and_then(|_| card.file_settings((), target.file))
            })?;
            print(cli.json, &settings, |s| format!("{:#?}", s))
        }
    }
}
