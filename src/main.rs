use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, WriteLogger};

use revolt_tui::LogLevel;
use revolt_tui::client::{ChatClient, RevoltClient};
use revolt_tui::core::config::{self, ConfigDir, ResolvedConfig};
use revolt_tui::core::credentials;
use revolt_tui::tui;
use revolt_tui::tui::login::{self, LoginOutcome};

#[derive(Parser)]
#[command(name = "revolt-tui", about = "Terminal client for Revolt")]
struct Args {
    /// Minimum level written to log.txt
    #[arg(long, default_value_t, value_enum)]
    loglevel: LogLevel,
}

#[tokio::main]
async fn main() -> std::io::Result<ExitCode> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let dir = match ConfigDir::resolve() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Err(e) = init_logging(&dir.log_path(), args.loglevel) {
        eprintln!("unable to open log file: {e}");
        return Ok(ExitCode::FAILURE);
    }
    info!("RevoltTUI starting up (config dir {})", dir.path().display());

    let file_config = match config::load_config(&dir.config_path()) {
        Ok(file_config) => file_config,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let resolved = config::resolve(&file_config);

    let Some(client) = authenticate(&dir, &resolved).await? else {
        println!("You must authenticate to use RevoltTUI");
        return Ok(ExitCode::FAILURE);
    };

    let token = client.token().to_string();
    tui::run(Arc::new(client), token, resolved)?;
    info!("RevoltTUI shut down");
    Ok(ExitCode::SUCCESS)
}

/// Writes to `log.txt` in the config directory, or `./log.txt` when that
/// cannot be opened.
fn init_logging(path: &Path, level: LogLevel) -> std::io::Result<()> {
    let log_file = File::create(path).or_else(|_| File::create("log.txt"))?;
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = WriteLogger::init(level.filter(), log_config, log_file);
    Ok(())
}

/// A client for the stored token if it still works, otherwise one from the
/// login form. None when the user cancels the login.
async fn authenticate(
    dir: &ConfigDir,
    config: &ResolvedConfig,
) -> std::io::Result<Option<RevoltClient>> {
    let token_path = dir.token_path();
    match credentials::load_token(&token_path) {
        Ok(Some(token)) => {
            let client = RevoltClient::new(config.api_url.clone(), token);
            match client.fetch_self().await {
                Ok(user) => {
                    info!("Authenticated with stored token as {}", user.username);
                    return Ok(Some(client));
                }
                Err(e) => warn!("Stored token rejected: {}", e),
            }
        }
        Ok(None) => info!("No stored token"),
        Err(e) => warn!("Failed to read token file: {}", e),
    }

    match login::prompt(config)? {
        LoginOutcome::LoggedIn(client) => {
            if let Err(e) = credentials::save_token(&token_path, client.token()) {
                warn!("Failed to save token: {}", e);
            }
            Ok(Some(client))
        }
        LoginOutcome::Cancelled => Ok(None),
    }
}
