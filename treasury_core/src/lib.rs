pub mod aggregate;
pub mod classify;
pub mod coingecko;
pub mod config;
pub mod error;
pub mod export;
pub mod helpers;
pub mod ingest;
pub mod ledger;
pub mod maintenance;
pub mod normalize;
pub mod skynet;
pub mod snapshots;
pub mod store;
pub mod transfers;
