//! Growthsync data model
//!
//! Types shared by the gateway and the sync controller:
//! - The locally edited [`ExperimentDraft`] and its [`EntryLink`] references
//! - The platform-owned [`RemoteExperiment`] and its variations/phases
//! - Request payloads for creating and patching experiments
//! - [`FeatureFlagSpec`] payloads wiring a flag to an experiment
//!
//! Everything here is plain data plus pure helpers; no I/O.

#![warn(unreachable_pub)]

pub mod draft;
pub mod error;
pub mod experiment;
pub mod flag;
pub mod naming;

pub use draft::{EntryLink, ExperimentDraft};
pub use error::ModelError;
pub use experiment::{
    uniform_weights, variation_inputs, CreateExperimentRequest, ExperimentEnvelope,
    ExperimentPatch, ExperimentStatus, Phase, RemoteExperiment, Variation, VariationInput,
};
pub use flag::{FeatureFlagSpec, FlagDefaults, FlagEnvironment, FlagRule, FlagVariation};
pub use naming::{next_variation_name, slugify};

/// Assignment query every experiment is bucketed by
pub const DEFAULT_ASSIGNMENT_QUERY_ID: &str = "user_id";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
