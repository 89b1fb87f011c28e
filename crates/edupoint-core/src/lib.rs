//! Core types: profile, auth state snapshots, tracing setup

pub mod profile;
pub mod state;
pub mod tracing;

pub use profile::Profile;
pub use state::{AuthSnapshot, AuthStage};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
