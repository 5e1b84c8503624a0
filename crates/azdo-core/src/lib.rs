//! Core traits, types, and error handling for azdo-mcp.
//!
//! Besides the service API traits this crate holds the pure work item
//! mutation engine: field patches, link resolution, relation patches and
//! `$batch` framing.

pub mod batch;
pub mod config;
pub mod domains;
pub mod error;
pub mod links;
pub mod patch;
pub mod provider;
pub mod relations;
pub mod test_case;
pub mod types;
pub mod user_agent;

pub use domains::Domain;
pub use error::{Error, Result};
pub use patch::{FieldUpdate, Operation, PatchOperation, TextFormat};
pub use provider::{BuildApi, CoreApi, ReleaseApi, TestPlanApi, WikiApi, WorkApi, WorkItemTrackingApi};
pub use user_agent::UserAgent;
