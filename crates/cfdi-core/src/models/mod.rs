//! Data models shared by the extractor, aggregator and ledger store.

pub mod config;
pub mod invoice;
