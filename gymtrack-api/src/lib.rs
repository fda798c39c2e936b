//! # GymTrack API Server Library
//!
//! HTTP API for gym members and administrators: authentication, equipment
//! sessions with balance accrual, and auction win management.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Auth and security header layers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
