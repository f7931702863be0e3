#![deny(missing_docs)]
//! Imgur Uploader Bot library.
//!
//! A Telegram bot that takes received photos, uploads them to Imgur and
//! answers with the hosted link.

/// Telegram transport: handlers and the platform adapter.
pub mod bot;
/// Configuration management.
pub mod config;
/// Imgur client.
pub mod imgur;
/// Photo upload pipeline.
pub mod relay;
/// Telegram runtime entrypoint.
pub mod runner;

#[cfg(test)]
pub mod testing;
