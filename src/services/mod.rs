// src/services/mod.rs

pub mod analytics;
pub mod answer_key;
pub mod gate;
pub mod matcher;
pub mod recorder;
pub mod reports;
pub mod store;
