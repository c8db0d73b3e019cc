//! Weather-aware movie recommendations.
//!
//! A request names a city and optionally some free-text context. The service
//! looks up the current weather, asks a language model for matching films,
//! attaches movie database metadata to each one, and caches the result.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
