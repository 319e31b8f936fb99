// crates/datamart-config/src/lib.rs
// ============================================================================
// Module: Datamart Config Library
// Description: Configuration model and validation for datamart tools.
// Purpose: Single source of truth for datamart.toml semantics.
// Dependencies: datamart-core, datamart-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `datamart-config` loads `datamart.toml` with strict, fail-closed
//! validation and converts it into the store configuration and data source
//! catalog the report engine consumes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
