use super::config;
use super::dashboard::{Dashboard, SnapshotSlot, assemble_dashboard};
use super::NSEClient;
use crate::api_server_axum;
use crate::utility::timing::Timer;

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

/// NSE Command Handler - encapsulates the CLI modes
pub struct NSECommands;

impl NSECommands {
    /// One-shot fetch of the dashboard, written to a JSON file
    pub async fn run_snapshot(output_file: &str) -> Result<()> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "NIFTY Options Pulse - Snapshot".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let client = NSEClient::new();

        println!("{}", "Step 1: Fetching option chain and market data...".cyan());
        let timer = Timer::silent("snapshot fetch");
        let inputs = client
            .fetch_dashboard_inputs()
            .await
            .context("Failed to fetch option chain from NSE")?;
        println!(
            "{} Fetched in {:.2}s",
            "✓".green(),
            timer.elapsed().as_secs_f64()
        );
        println!();

        println!("{}", "Step 2: Enriching contracts and generating alerts...".cyan());
        let dashboard = Timer::measure_async("dashboard assembly", || async move {
            assemble_dashboard(inputs)
        })
        .await;
        Self::display_dashboard_summary(&dashboard);

        std::fs::write(output_file, serde_json::to_string_pretty(&dashboard)?)
            .with_context(|| format!("Failed to write {}", output_file))?;
        println!("{} Saved dashboard to {}", "✓".green(), output_file.yellow());

        println!();
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Done!".green().bold());
        println!("{}", "=".repeat(60).blue());

        Ok(())
    }

    /// Run API server mode
    pub async fn run_server(port: u16) -> Result<()> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "NIFTY Options Pulse - API Server".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let client = Arc::new(NSEClient::new());
        api_server_axum::start_server(client, port).await
    }

    fn display_dashboard_summary(dashboard: &Dashboard) {
        let alerts = &dashboard.alerts;

        println!("{}", "=".repeat(60).blue());
        println!("{}", "Summary".cyan().bold());
        println!("{}", "=".repeat(60).blue());
        println!("{} Spot: {:.2}", "✓".green(), dashboard.spot_price);
        println!("{} Nearest expiry: {}", "✓".green(), dashboard.nearest_expiry.yellow());
        println!("{} Strikes: {}", "✓".green(), dashboard.option_chain_details.len());
        println!(
            "{} Most active: {} calls, {} puts, {} by OI",
            "✓".green(),
            dashboard.most_active_calls.len(),
            dashboard.most_active_puts.len(),
            dashboard.most_active_oi.len()
        );
        println!();

        println!("{} {}", "ℹ".blue(), alerts.fair_valuation);
        println!("{} {}", "ℹ".blue(), alerts.market_breadth);
        println!("{} {}", "ℹ".blue(), alerts.buying_interest);
        println!();

        let buckets = [
            ("Momentum", &alerts.momentum),
            ("Unwinding", &alerts.unwinding),
            ("Fresh longs", &alerts.fresh_longs),
            ("Buyer dominance", &alerts.buyer_dominance),
            ("Seller dominance", &alerts.seller_dominance),
        ];
        for (name, keys) in buckets {
            if keys.is_empty() {
                continue;
            }
            let preview: Vec<&str> = keys.iter().take(8).map(String::as_str).collect();
            println!("{} {} ({}): {}", "⚡".yellow(), name.cyan(), keys.len(), preview.join(", "));
        }
        if alerts.signal_count() == 0 {
            println!("{} No contract signals", "ℹ".blue());
        }
        println!();

        let snapshots = [
            ("Large deals", dashboard.large_deals.is_ready()),
            ("Volume gainers", dashboard.volume_gainers.is_ready()),
            ("Most active securities", dashboard.most_active_securities.is_ready()),
            ("Insider disclosures", dashboard.corporates_pit.is_ready()),
        ];
        for (name, ready) in snapshots {
            if ready {
                println!("{} {}", "✓".green(), name);
            } else {
                println!("{} {}", "✗".red(), name);
            }
        }

        if let SnapshotSlot::Ready(pit) = &dashboard.corporates_pit {
            println!(
                "{} Insider disclosures: {}",
                "ℹ".blue(),
                pit.summary.total_disclosures
            );
        }

        if !dashboard.source_errors.is_empty() {
            println!();
            println!("{}", "Degraded sources:".red());
            for err in &dashboard.source_errors {
                println!(
                    "  {} {} → {}",
                    "✗".red(),
                    err.source.yellow(),
                    err.error.chars().take(80).collect::<String>()
                );
            }
        }
        println!();
    }

    /// Print usage instructions
    pub fn print_usage() {
        eprintln!("Set NSE_MODE environment variable to control execution mode");
        eprintln!("Examples:");
        eprintln!("  NSE_MODE=server NSE_PORT=3001 cargo run   # Start API server on port 3001");
        eprintln!(
            "  NSE_MODE=snapshot cargo run                # Write {}",
            config::get_output_file()
        );
        eprintln!("  NSE_BASE_URL=http://localhost:8080 ...    # Point at a mirror");
    }
}
