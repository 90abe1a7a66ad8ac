//! Donation Gate - Donation & Ticket Transaction Engine
//!
//! Prices events, accepts payment intents, reconciles payment-provider
//! webhooks idempotently, and enforces exactly-once ticket redemption.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
