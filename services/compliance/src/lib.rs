//! Compliance Service
//!
//! Decides whether a client may perform an exchange of a given USD value
//! under their verification tier, and runs the KYC/AML workflow around it:
//!
//! - `gate`: pure limit/KYC/AML evaluation producing a `Decision`
//! - `scoring`: pure AML risk scoring
//! - `codes`: random challenge and referral codes
//! - `config`: tunable thresholds
//! - `service`: orchestration against an injected store

pub mod codes;
pub mod config;
pub mod gate;
pub mod scoring;
pub mod service;

pub use config::ComplianceConfig;
pub use service::{ComplianceService, KycSubmission, WalletChallenge};
