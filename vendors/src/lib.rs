//! Client implementations for the generation endpoint
//!
//! This crate provides the `GenerateClient` and `ClientFactory`
//! implementations used against a live server:
//!
//! - [`OllamaClient`]: non-streaming `POST /api/generate` over reqwest
//! - [`OllamaClientFactory`]: one client, with its own connection pool, per batch

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;
pub mod ollama;

pub use http::{HttpClientPool, HttpConfig};
pub use ollama::{OllamaClient, OllamaClientFactory};
