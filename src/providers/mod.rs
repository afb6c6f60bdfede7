//! Providers Module - External Services
//!
//! HTTP clients for everything outside the process. Currently one
//! provider: the local Ollama server.

pub mod ollama;

pub use ollama::*;
