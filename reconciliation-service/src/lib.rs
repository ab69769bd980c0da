//! Reconciliation Service - GST purchase and sales register reconciliation.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
