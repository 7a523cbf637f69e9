//! # Engine Module
//!
//! This module implements the resource-aware batch scheduler: everything between a list
//! of ligand sources and a sequence of GPU invocations that together dock every ligand
//! exactly once without exceeding the device memory budget.
//!
//! ## Architecture
//!
//! - **Cost Model** ([`cost`]) - Predicted peak device memory of a candidate batch
//! - **Device Profiling** ([`device`]) - One-time device query, effective budget and tier
//! - **Jobs** ([`job`]) - Per-ligand cost descriptors and the ordered job set
//! - **Ingestion** ([`ingest`]) - Fail-soft parallel loading of every job
//! - **Planning** ([`planner`]) - Greedy admission of the next batch against the budget
//! - **Engine Seam** ([`snapshot`]) - The docking engine trait and the shared snapshot
//!   every batch checks out an exclusive working copy from
//! - **Execution** ([`executor`]) - One synchronous search invocation per batch plus output
//! - **Output** ([`output`]) - Pose writers producing one artifact per job
//! - **External Engine** ([`process`]) - A docking engine backed by an external GPU program
//! - **Configuration** ([`config`]) - Search, scoring and search-space settings
//! - **Progress Monitoring** ([`progress`]) - Progress events for front-ends
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Key Capabilities
//!
//! - **Bounded-memory packing** using an empirically fit, tier-aware linear cost model
//! - **Guaranteed forward progress**: every planning call admits at least one job
//! - **Precomputation reuse**: the expensive engine state is built once and cloned per batch
//! - **Fail-soft ingestion**: unparseable ligands keep their slot as degenerate jobs

pub mod config;
pub mod cost;
pub mod device;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod job;
pub mod output;
pub mod planner;
pub mod process;
pub mod progress;
pub mod snapshot;
