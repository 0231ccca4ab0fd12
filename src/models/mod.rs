// src/models/mod.rs

pub mod analytics;
pub mod comment;
pub mod question;
pub mod quiz;
pub mod score;
pub mod user;
