use anyhow::{Result, bail};
use colored::Colorize;
use nifty_pulse::nse::config;

pub const MODE_SERVER: &str = "server";
pub const MODE_SNAPSHOT: &str = "snapshot";

/// Application configuration handler
pub struct AppConfig {
    pub mode: String,
    pub port: u16,
    pub output_file: String,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            mode: config::get_execution_mode(),
            port: Self::get_port(),
            output_file: config::get_output_file(),
        }
    }

    /// Get port from environment or default
    fn get_port() -> u16 {
        std::env::var("NSE_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .unwrap_or(3001)
    }

    pub fn log_config(&self) {
        println!("{} Mode: {}", "→".cyan(), self.mode.yellow());
        if self.mode == MODE_SERVER {
            println!("{} Port: {}", "→".cyan(), self.port);
        } else {
            println!("{} Output: {}", "→".cyan(), self.output_file.yellow());
        }
        println!("{} Upstream: {}", "→".cyan(), config::get_base_url());
        println!();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.mode != MODE_SERVER && self.mode != MODE_SNAPSHOT {
            bail!("Unknown NSE_MODE '{}'", self.mode);
        }
        if self.mode == MODE_SNAPSHOT && self.output_file.trim().is_empty() {
            bail!("NSE_OUTPUT_FILE must not be empty");
        }
        Ok(())
    }
}
