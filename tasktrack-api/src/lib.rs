//! # TaskTrack API Server Library
//!
//! HTTP surface of TaskTrack: a small task tracker where authors assign
//! work to other users, who report progress and discuss it in comments.
//!
//! ## Modules
//!
//! - `app`: Application state, router and bearer authentication
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
