// src/models/mod.rs

pub mod answer;
pub mod assessment;
pub mod assignment;
pub mod question;
pub mod result;
