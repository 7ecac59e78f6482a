//! # AppStore API Server Library
//!
//! HTTP layer of the app marketplace: routing, token authentication,
//! request/response shapes and error mapping. Business rules live in
//! `appstore-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON and path extractors with API-shaped rejections
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
