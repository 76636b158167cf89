//! Avolve - services for the Avolve community platform
//!
//! Durable state, auth and transactional procedures live on the hosted
//! platform. This crate holds the logic around them.
//!
//! ## Services
//!
//! - **Functions**: action-dispatching handlers served over HTTP
//!   (challenges, data export, maintenance, value creation, staking)
//! - **Staking**: effective APY shown before a stake is committed
//! - **Tokens**: the weekday token table shared by claims and simulation
//! - **Simulation**: concurrent load replay against the hosted procedures

pub mod auth;
pub mod config;
pub mod db;
pub mod functions;
pub mod logging;
pub mod pillars;
pub mod platform;
pub mod routes;
pub mod server;
pub mod simulation;
pub mod staking;
pub mod tokens;
pub mod types;

pub use config::{Args, FeatureFlags};
pub use server::{run, AppState};
pub use types::{AvolveError, Result};
