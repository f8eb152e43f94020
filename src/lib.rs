// src/lib.rs
pub mod api;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod report;
pub mod scene;
pub mod types;
