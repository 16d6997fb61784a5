// src/models/mod.rs

pub mod answer;
pub mod permission;
pub mod question;
pub mod session;
