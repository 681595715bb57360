//! HTTP gateway for the exchange platform
//!
//! Serves three action-dispatched APIs (`/exchange`, `/kyc-aml`, `/trading`)
//! over an injected `persistence::Store`.

pub mod action;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
