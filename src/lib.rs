//! Library crate for tote-panel, the operator panel of the LED tote board.
//!
//! Exposes the modules used by the binaries and tests.

pub mod config;
pub mod dto;
pub mod error;
pub mod remote;
pub mod routes;
pub mod services;
pub mod state;
