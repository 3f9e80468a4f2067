//! `gh-copilot`: ask GitHub Copilot from the command line and stream a rendered answer.

pub mod app;
pub mod args;
pub mod config;
