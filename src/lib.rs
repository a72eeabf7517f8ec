//! Multi-country payroll engine
//!
//! This crate generates monthly payroll records from employee compensation
//! profiles and per-country tax rules, drives records through their
//! lifecycle (generated, processing, processed, paid or failed), runs bulk
//! generation jobs and aggregates payroll statistics.

#![warn(missing_docs)]

pub mod api;
pub mod bulk;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod stats;
pub mod store;
