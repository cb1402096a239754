//! Shared types and collaborators for the BagsPay checkout widget.
//!
//! This crate carries everything the resolution engine in `bagspay-core`
//! talks to: wallet address validation, `.sol` name-service resolution,
//! quote request/response objects, and the quote backends (mock and live
//! HTTP). The live HTTP client is gated behind the `client` cargo feature
//! so downstream crates that only need the shared types do not pull in
//! `reqwest`.

pub mod address;
pub mod client;
pub mod config;
pub mod objects;
pub mod sns;
