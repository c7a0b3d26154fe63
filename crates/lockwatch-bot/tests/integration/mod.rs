//! Integration tests for lockwatch-bot.
//!
//! These tests drive the real upstream clients against an in-process
//! HTTP server:
//! - Discovery failures and recovery
//! - Deduplication across cycles
//! - Degraded enrichment
//! - Cancellation of hung calls

pub mod common;
