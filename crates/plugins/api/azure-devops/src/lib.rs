//! Azure DevOps REST client for azdo-mcp.
//!
//! [`AzureDevOpsClient`] implements every service API trait of
//! `azdo-core` against the Azure DevOps Services (or Server) REST API.
//! Personal access tokens are sent as HTTP Basic credentials, OAuth
//! tokens as Bearer credentials.

mod build;
mod client;
mod projects;
mod release;
mod test_plan;
mod types;
mod wiki;
mod wit;
mod work;

pub use client::{AzureDevOpsClient, Credential};
