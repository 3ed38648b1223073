//! Assembles the aggregate `/nifty/data` response from already fetched
//! payloads. Nothing in here touches the network.

use super::enrichment::{QuoteTable, build_quote_table, enrich_contracts};
use super::index_stats::{IndexStats, merge_index_stats};
use super::models::{
    ActiveContractsPayload, EnrichedContract, OptionChainPayload, StrikeDetail, TabularPayload,
};
use super::normalize::{Row, to_number};
use super::processor::process_option_chain;
use super::ranking::{rank_by_open_interest, sort_by_strike};
use super::rules::{Alerts, generate_alerts};
use super::snapshots::{
    InsiderSnapshot, LargeDealsSnapshot, MostActiveSecuritiesSnapshot, VolumeGainersSnapshot,
    build_insider_snapshot, build_large_deals, build_most_active_securities,
    build_volume_gainers,
};
use crate::error::NSEError;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

// -----------------------------------------------
// SOURCE NAMES
// -----------------------------------------------
pub const SOURCE_INDEX_DATA: &str = "indexData";
pub const SOURCE_ADVANCE_DECLINE: &str = "advanceDecline";
pub const SOURCE_ACTIVE_CONTRACTS: &str = "mostActiveContracts";
pub const SOURCE_LARGE_DEALS: &str = "largeDeals";
pub const SOURCE_VOLUME_GAINERS: &str = "volumeGainers";
pub const SOURCE_MOST_ACTIVE_SECURITIES: &str = "mostActiveSecurities";
pub const SOURCE_CORPORATES_PIT: &str = "corporatesPIT";

/// Everything fetched for one dashboard request. The option chain is
/// mandatory; every other source may have failed.
#[derive(Debug)]
pub struct DashboardInputs {
    pub chain: OptionChainPayload,
    pub nearest_expiry: String,
    pub index_data: Result<TabularPayload, NSEError>,
    pub advance_decline: Result<TabularPayload, NSEError>,
    pub active_contracts: Result<ActiveContractsPayload, NSEError>,
    pub large_deals: Result<Row, NSEError>,
    pub volume_gainers: Result<TabularPayload, NSEError>,
    pub most_active_securities: Result<TabularPayload, NSEError>,
    pub corporates_pit: Result<Row, NSEError>,
}

/// A snapshot, or the reason it is missing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SnapshotSlot<T> {
    Ready(T),
    Failed { error: String },
}

impl<T> SnapshotSlot<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, SnapshotSlot::Ready(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceError {
    pub source: String,
    pub error: String,
}

/// Aggregate response of `/nifty/data`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub nifty_stats: IndexStats,
    pub alerts: Alerts,
    pub most_active_calls: Vec<EnrichedContract>,
    pub most_active_puts: Vec<EnrichedContract>,
    #[serde(rename = "mostActiveOI")]
    pub most_active_oi: Vec<EnrichedContract>,
    pub option_chain_details: Vec<StrikeDetail>,
    pub spot_price: f64,
    pub nearest_expiry: String,
    pub timestamp: Option<Value>,
    pub large_deals: SnapshotSlot<LargeDealsSnapshot>,
    pub volume_gainers: SnapshotSlot<VolumeGainersSnapshot>,
    pub most_active_securities: SnapshotSlot<MostActiveSecuritiesSnapshot>,
    #[serde(rename = "corporatesPIT")]
    pub corporates_pit: SnapshotSlot<InsiderSnapshot>,
    pub source_errors: Vec<SourceError>,
}

/// The three enriched most-active lists, ranked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveLists {
    pub calls: Vec<EnrichedContract>,
    pub puts: Vec<EnrichedContract>,
    pub by_oi: Vec<EnrichedContract>,
}

pub fn build_active_lists(
    active: &ActiveContractsPayload,
    table: &QuoteTable,
    nearest_expiry: Option<&str>,
) -> ActiveLists {
    let mut calls = enrich_contracts(&active.calls, table, nearest_expiry);
    let mut puts = enrich_contracts(&active.puts, table, nearest_expiry);
    sort_by_strike(&mut calls);
    sort_by_strike(&mut puts);

    ActiveLists {
        calls,
        puts,
        by_oi: rank_by_open_interest(enrich_contracts(&active.by_oi, table, nearest_expiry)),
    }
}

/// Unwrap a degradable source, recording the failure
fn degrade<T: Default>(source: &str, result: Result<T, NSEError>, errors: &mut Vec<SourceError>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            record_failure(source, &e, errors);
            T::default()
        }
    }
}

pub fn snapshot_slot<P, T>(
    source: &str,
    result: Result<P, NSEError>,
    build: impl FnOnce(P) -> T,
    errors: &mut Vec<SourceError>,
) -> SnapshotSlot<T> {
    match result {
        Ok(payload) => SnapshotSlot::Ready(build(payload)),
        Err(e) => {
            record_failure(source, &e, errors);
            SnapshotSlot::Failed {
                error: e.to_string(),
            }
        }
    }
}

fn record_failure(source: &str, err: &NSEError, errors: &mut Vec<SourceError>) {
    warn!(source, error = %err, "Source unavailable, serving without it");
    errors.push(SourceError {
        source: source.to_string(),
        error: err.to_string(),
    });
}

pub fn assemble_dashboard(inputs: DashboardInputs) -> Dashboard {
    let mut errors = Vec::new();
    let nearest = inputs.nearest_expiry.as_str();

    let chain = process_option_chain(&inputs.chain.filtered.data, Some(nearest));
    let table = build_quote_table(&chain.contracts);

    let index_rows = degrade(SOURCE_INDEX_DATA, inputs.index_data, &mut errors).data;
    let breadth_rows = degrade(SOURCE_ADVANCE_DECLINE, inputs.advance_decline, &mut errors).data;
    let nifty_stats = merge_index_stats(&index_rows, &breadth_rows).with_defaults();

    let active = degrade(SOURCE_ACTIVE_CONTRACTS, inputs.active_contracts, &mut errors);
    let lists = build_active_lists(&active, &table, Some(nearest));

    let alerts = generate_alerts(&nifty_stats, &chain.contracts);

    let large_deals = snapshot_slot(
        SOURCE_LARGE_DEALS,
        inputs.large_deals,
        |p| build_large_deals(&p),
        &mut errors,
    );
    let volume_gainers = snapshot_slot(
        SOURCE_VOLUME_GAINERS,
        inputs.volume_gainers,
        build_volume_gainers,
        &mut errors,
    );
    let most_active_securities = snapshot_slot(
        SOURCE_MOST_ACTIVE_SECURITIES,
        inputs.most_active_securities,
        build_most_active_securities,
        &mut errors,
    );
    let corporates_pit = snapshot_slot(
        SOURCE_CORPORATES_PIT,
        inputs.corporates_pit,
        |p| build_insider_snapshot(&p),
        &mut errors,
    );

    Dashboard {
        nifty_stats,
        alerts,
        most_active_calls: lists.calls,
        most_active_puts: lists.puts,
        most_active_oi: lists.by_oi,
        option_chain_details: chain.details,
        spot_price: to_number(inputs.chain.records.underlying_value.as_ref(), 0.0),
        nearest_expiry: inputs.nearest_expiry,
        timestamp: inputs.chain.records.timestamp.filter(|v| !v.is_null()),
        large_deals,
        volume_gainers,
        most_active_securities,
        corporates_pit,
        source_errors: errors,
    }
}
