//! # vbatch Core Library
//!
//! A library for running large molecular docking campaigns on a single GPU with bounded
//! device memory. It decides online how many ligands can be packed into one GPU invocation,
//! executes invocations back-to-back until the ligand set is drained, and reports
//! per-invocation throughput.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless molecule models (`Molecule`, `Atom`) and the
//!   PDBQT reader/writer used to ingest ligands and emit docked poses.
//!
//! - **[`engine`]: The Scheduler.** The device memory budget model, the tiered peak-memory
//!   predictor, ligand ingestion, the greedy batch planner, the engine snapshot and the
//!   per-batch executor, together with the docking engine seam and its external-process
//!   implementation.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the
//!   plan/execute cycle that drains an entire screening campaign.

pub mod core;
pub mod engine;
pub mod workflows;
