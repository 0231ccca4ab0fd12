// src/handlers/mod.rs

pub mod admin;
pub mod analytics;
pub mod quiz;
pub mod score;
