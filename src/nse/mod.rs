pub mod config;
pub mod dashboard;
pub mod enrichment;
pub mod expiry;
pub mod index_stats;
pub mod models;
pub mod normalize;
pub mod nse_client;
pub mod nse_commands;
pub mod processor;
pub mod ranking;
pub mod rules;
pub mod session;
pub mod snapshots;

// Re-exports (public API)
pub use config::ClientSettings;
pub use dashboard::{Dashboard, DashboardInputs, SnapshotSlot, assemble_dashboard};
pub use enrichment::{QuoteTable, build_quote_table, enrich_contract, enrich_contracts};
pub use index_stats::{IndexStats, merge_index_stats};
pub use models::{
    ContractKey, ContractKind, DisplayValue, EnrichedContract, OptionChainPayload,
    OptionContract, OptionSide, QuoteDetail, StrikeDetail,
};
pub use normalize::{Row, to_number};
pub use nse_client::NSEClient;
pub use processor::{ProcessedChain, process_option_chain};
pub use ranking::{rank_by_open_interest, sort_by_strike};
pub use rules::{Alerts, check_contract_rules, generate_alerts};
pub use session::NseSession;
