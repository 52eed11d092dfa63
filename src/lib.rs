//! code-critique - AI-powered code critique
//!
//! Collects the source files of one service, asks a language model to review
//! them against a fixed rubric, reconciles the model's self-reported counts
//! with its findings and writes a JSON report plus an HTML view.

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reporters;

pub use error::{CritiqueError, CritiqueResult};
