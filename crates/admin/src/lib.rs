//! Wildbloom admin panel library.
//!
//! This crate provides the admin panel functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This binary can read customer PII and manage admin accounts. Deploy it
//! on an internal network or behind an allowlist, never on the public
//! storefront host.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
