//! HTTP handlers

pub mod health;
pub mod index;
pub mod readings;
