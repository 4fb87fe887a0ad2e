//! readarabic: data layer and HTTP API for an Arabic book reader
//!
//! The catalog (books, categories, authors) and per-reader data
//! (vocabulary, reading positions, subscriptions) live in SQLite. PDFs are
//! served from a [`storage::PdfStore`]; accounts come from Google sign-in
//! and subscriptions are kept in sync with PayPal webhooks.

pub mod api;
pub mod backfill;
pub mod commands;
pub mod config;
pub mod db;
pub mod dictionary;
pub mod error;
pub mod google;
pub mod paypal;
pub mod progress;
pub mod storage;
pub mod subscription;
pub mod turath;
