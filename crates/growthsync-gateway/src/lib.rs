//! Growthsync Gateway - the experimentation platform seam
//!
//! The sync controller talks to the platform only through
//! [`ExperimentGateway`]. [`HttpGateway`] implements it over the Growthbook
//! REST API; tests substitute fakes or mocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use growthsync_gateway::{ExperimentGateway, GatewayConfig, HttpGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::new().with_api_key("secret_abc");
//! let gateway = HttpGateway::new(&config)?;
//!
//! let patch = growthsync_model::ExperimentPatch::status(
//!     growthsync_model::ExperimentStatus::Running,
//! );
//! let experiment = gateway.update_experiment("exp_123", &patch).await?;
//! println!("{} is {}", experiment.id, experiment.status);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod http;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpGateway;

use async_trait::async_trait;
use growthsync_model::{CreateExperimentRequest, ExperimentPatch, FeatureFlagSpec, RemoteExperiment};

/// Remote operations on experiments and feature flags
///
/// Experiment calls return the experiment as the platform holds it after the
/// call. Flag calls return nothing on success.
#[async_trait]
pub trait ExperimentGateway: Send + Sync {
    /// Create an experiment
    async fn create_experiment(
        &self,
        request: &CreateExperimentRequest,
    ) -> Result<RemoteExperiment, GatewayError>;

    /// Patch experiment `id`
    async fn update_experiment(
        &self,
        id: &str,
        patch: &ExperimentPatch,
    ) -> Result<RemoteExperiment, GatewayError>;

    /// Create a feature flag; its id travels in `spec`
    async fn create_feature_flag(&self, spec: &FeatureFlagSpec) -> Result<(), GatewayError>;

    /// Replace feature flag `id`
    async fn update_feature_flag(
        &self,
        id: &str,
        spec: &FeatureFlagSpec,
    ) -> Result<(), GatewayError>;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
