use std::error::Error;
use std::io;
use std::path::PathBuf;

use courtside_adapters::mysql::MysqlBackend;
use courtside_core::catalog::QueryCatalog;
use courtside_core::config::{ConfigError, ConnectionSettings};
use courtside_core::connection::ConnectionProvider;
use courtside_core::session::BrowserSession;
use courtside_tui::{LogBuffer, TuiError};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "COURTSIDE_LOG";
const DEFAULT_LOG_DIRECTIVE: &str = "info";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseOutcome {
    Run(CliOptions),
    HelpRequested,
}

fn parse_args_from(args: impl IntoIterator<Item = String>) -> io::Result<ParseOutcome> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-h" | "--help" => return Ok(ParseOutcome::HelpRequested),
            "-c" | "--config" => {
                options.config_path = Some(PathBuf::from(next_value(&mut args, "--config")?));
            }
            other => return Err(io_other(format!("unknown argument `{other}`"))),
        }
    }

    Ok(ParseOutcome::Run(options))
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> io::Result<String> {
    args.next()
        .ok_or_else(|| io_other(format!("missing value for `{flag}`")))
}

fn print_help() {
    println!(
        "courtside: browse the tennis schema of a MySQL server\n\n\
Usage:\n  courtside [OPTIONS]\n\n\
Options:\n  -c, --config <path>   Config file (default: <config dir>/courtside/config.toml)\n  -h, --help            Print this help\n\n\
Environment:\n  COURTSIDE_CONFIG_DIR   Directory holding courtside/config.toml\n  COURTSIDE_DB_HOST, COURTSIDE_DB_PORT, COURTSIDE_DB_USER,\n  COURTSIDE_DB_PASSWORD, COURTSIDE_DB_NAME override the [connection] table\n  COURTSIDE_LOG          Log filter directive (default: info)\n"
    );
}

fn io_other(error: impl std::fmt::Display) -> io::Error {
    io::Error::other(error.to_string())
}

fn load_settings(options: &CliOptions) -> Result<ConnectionSettings, ConfigError> {
    let mut settings = match &options.config_path {
        Some(path) => ConnectionSettings::load_from_path(path.clone())?,
        None => ConnectionSettings::load_default()?,
    };
    settings.apply_env_overrides()?;
    Ok(settings)
}

fn init_logging(logs: &LogBuffer) -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(io_other)
}

fn launch_browser(settings: ConnectionSettings, logs: &LogBuffer) -> Result<(), TuiError> {
    let catalog = QueryCatalog::tennis_default();
    let provider = ConnectionProvider::new(MysqlBackend, settings);
    courtside_tui::run(BrowserSession::new(&catalog, provider), logs)
}

fn run_app(
    args: impl IntoIterator<Item = String>,
    logs: &LogBuffer,
    run_tui: impl FnOnce(ConnectionSettings, &LogBuffer) -> Result<(), TuiError>,
) -> Result<(), Box<dyn Error>> {
    let options = match parse_args_from(args)? {
        ParseOutcome::HelpRequested => {
            print_help();
            return Ok(());
        }
        ParseOutcome::Run(options) => options,
    };

    let settings = load_settings(&options)?;
    info!(server = %settings.display_target(), "starting browser");
    run_tui(settings, logs)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let logs = LogBuffer::default();
    init_logging(&logs)?;
    run_app(std::env::args().skip(1), &logs, launch_browser)
}
