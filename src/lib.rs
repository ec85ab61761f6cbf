//! specdoc library crate
//!
//! Generates Markdown documentation for end-to-end test files by asking an
//! LLM provider to analyze each file. The binary drives [`runner::BatchRunner`]
//! over a list of files that failed in an earlier pass.

pub mod config;
pub mod llm;
pub mod prompt;
pub mod render;
pub mod report;
pub mod runner;
