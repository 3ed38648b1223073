mod app_config;

use anyhow::Result;
use app_config::{AppConfig, MODE_SERVER, MODE_SNAPSHOT};
use colored::Colorize;
use nifty_pulse::logging;
use nifty_pulse::nse::nse_commands::NSECommands;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let app_config = AppConfig::from_env();
    app_config.log_config();

    if let Err(e) = app_config.validate() {
        eprintln!("{} {}", "✗".red(), e);
        NSECommands::print_usage();
        std::process::exit(1);
    }

    match app_config.mode.as_str() {
        MODE_SERVER => NSECommands::run_server(app_config.port).await?,
        MODE_SNAPSHOT => NSECommands::run_snapshot(&app_config.output_file).await?,
        _ => NSECommands::print_usage(),
    }

    Ok(())
}
