//! Wastage upload server library.
//!
//! Core functionality for recording challan wastage entries: database
//! operations, image storage, the upsert workflow, and the inward challan
//! notification client.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
