// src/models/mod.rs

pub mod attempt;
pub mod exam;
pub mod question;
pub mod team;
pub mod user;
