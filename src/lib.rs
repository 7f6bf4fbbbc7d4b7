pub mod audio;
pub mod capture;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod kv;
pub mod library;
pub mod logging;
pub mod models;
pub mod notice;
pub mod pictograms;
pub mod screens;

#[cfg(test)]
mod integration_tests;

pub use error::*;
pub use models::*;
