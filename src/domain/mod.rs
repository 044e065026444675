//! Core domain types and logic.

pub mod account;
pub mod config;
pub mod error;
pub mod frequency;
pub mod guard;
pub mod indicator;
pub mod manager;
pub mod ohlcv;
pub mod order;
pub mod position;
pub mod strategy;
