//! forge
//!
//! Abstraction for hosted Git forges (GitLab, GitHub, etc.).
//!
//! # Architecture
//!
//! The `Service` and `Project` traits define the interface for
//! interacting with hosting services. Callers use the [`create_service`]
//! factory function rather than importing specific implementations
//! directly, and the record/replay wrappers in [`crate::replay`]
//! implement the same traits, so live and replayed sessions are
//! interchangeable.
//!
//! # Modules
//!
//! - `traits`: Core `Service`/`Project` traits and the error taxonomy
//! - [`gitlab`]: GitLab implementation using the REST v4 API
//! - `github`: GitHub stub (requires `github` feature)
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Forge selection and creation
//!
//! # Example
//!
//! ```ignore
//! use forgery::forge::{create_service, ServiceConfig};
//!
//! let service = create_service(
//!     ServiceConfig {
//!         instance_url: "https://gitlab.gnome.org".parse()?,
//!         token: std::env::var("GITLAB_TOKEN")?,
//!     },
//!     None, // No provider override
//! )?;
//!
//! let project = service.get_project("mygroup", "myrepo")?;
//! let branches = project.get_branches().await?;
//! ```

mod factory;
#[cfg(feature = "github")]
pub mod github;
pub mod gitlab;
pub mod mock;
mod traits;

pub use factory::{
    create_service, detect_provider, valid_forge_names, ForgeProvider, ServiceConfig,
};
pub use traits::*;
