//! EDGE - Employee Development & Growth Engine
//!
//! Application crate for the EDGE performance-review platform. The workflow
//! core (state machine, permission gate, cycle lifecycle) lives in the
//! `edge-workflow` crate; this crate wires it to Postgres, the employee
//! directory, and the HTTP API.

pub mod api;
pub mod database;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, AppResult};
