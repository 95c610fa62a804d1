//! Clio NLP agent — library crate for the orchestration service.
//!
//! Re-exports every module so the binary (`main.rs`) and `cn-e2e-tests`
//! can reach `AppState`, `build_router` and the `Dispatcher`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod routes;
pub mod service;
pub mod state;
