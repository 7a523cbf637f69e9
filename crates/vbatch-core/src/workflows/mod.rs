//! # Workflows Module
//!
//! High-level entry points that drive a complete screening campaign.
//!
//! ## Overview
//!
//! A campaign profiles the device once, ingests every ligand, and then alternates between
//! planning the next batch and executing it until no ligand is left. Each workflow owns
//! that cycle and reports its progress; the collaborators (ligand loader, device query,
//! docking engine, pose writer) are supplied by the caller.
//!
//! ## Architecture
//!
//! - **Screening Workflow** ([`screen`]) - The full plan/execute cycle producing one output
//!   artifact per ligand.
//! - **Planning Workflow** ([`plan`]) - The same batching decisions without running the
//!   engine, for inspecting how a campaign will be split.

pub mod plan;
pub mod screen;
