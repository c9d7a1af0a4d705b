// src/handlers/mod.rs

pub mod admin;
pub mod analytics;
pub mod assignments;
pub mod attempts;
pub mod auth;
pub mod notify;
pub mod question_sets;
pub mod registration;
pub mod schedule;
pub mod upload;
