//! # Civic Common Library
//!
//! Shared code for the civic platform services:
//! - Common error and result types
//! - Event types (`CivicEvent`) and the broadcast `EventBus`
//! - Configuration loading and root folder resolution
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
