//! forge::factory
//!
//! Forge selection and service creation.
//!
//! # Design
//!
//! This module is the central location for forge selection logic.
//! Callers use [`create_service`] instead of importing specific backend
//! implementations, which keeps the architecture boundary intact: code
//! above this layer depends on the `Service` trait only.
//!
//! # Provider Detection
//!
//! The factory can detect the appropriate forge from an instance URL
//! host: `gitlab.com` and self-hosted hosts carrying "gitlab" map to
//! GitLab, `github.com` maps to GitHub (when the feature is enabled).
//! Anything else requires an explicit provider override.

use url::Url;

use super::gitlab::{GitLabConfig, GitLabService};
use super::traits::{ForgeError, Service};

#[cfg(feature = "github")]
use super::github::{GitHubConfig, GitHubService};

/// Connection settings shared by every provider.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Forge instance base URL.
    pub instance_url: Url,
    /// Personal access token.
    pub token: String,
}

/// Supported forge providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeProvider {
    /// GitLab (always available)
    GitLab,
    /// GitHub (requires `github` feature)
    #[cfg(feature = "github")]
    GitHub,
}

impl ForgeProvider {
    /// Get all providers enabled in the current build configuration.
    pub fn all() -> &'static [ForgeProvider] {
        &[
            ForgeProvider::GitLab,
            #[cfg(feature = "github")]
            ForgeProvider::GitHub,
        ]
    }

    /// Get the provider name as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ForgeProvider::GitLab => "gitlab",
            #[cfg(feature = "github")]
            ForgeProvider::GitHub => "github",
        }
    }

    /// Parse a provider from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gitlab" => Some(ForgeProvider::GitLab),
            #[cfg(feature = "github")]
            "github" => Some(ForgeProvider::GitHub),
            _ => None,
        }
    }
}

impl std::fmt::Display for ForgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the forge provider from an instance URL.
///
/// # Example
///
/// ```
/// use forgery::forge::{detect_provider, ForgeProvider};
///
/// let url = "https://gitlab.gnome.org".parse().unwrap();
/// assert_eq!(detect_provider(&url), Some(ForgeProvider::GitLab));
/// ```
pub fn detect_provider(instance_url: &Url) -> Option<ForgeProvider> {
    let host = instance_url.host_str()?;

    if host == "gitlab.com" || host.contains("gitlab") {
        return Some(ForgeProvider::GitLab);
    }

    #[cfg(feature = "github")]
    if host == "github.com" || host.contains("github") {
        return Some(ForgeProvider::GitHub);
    }

    None
}

/// Create a service from connection settings.
///
/// This is the primary entry point for constructing forge services.
/// The provider is auto-detected from the instance URL unless an
/// explicit override name is given.
///
/// # Errors
///
/// - `ForgeError::NotImplemented` if the provider exists but is not
///   enabled in this build
/// - `ForgeError::NotFound` if the provider is unknown or cannot be
///   detected from the URL
pub fn create_service(
    config: ServiceConfig,
    provider_override: Option<&str>,
) -> Result<Box<dyn Service>, ForgeError> {
    let provider = if let Some(name) = provider_override {
        resolve_provider_override(name)?
    } else {
        detect_provider(&config.instance_url).ok_or_else(|| {
            ForgeError::NotFound(format!(
                "could not detect forge provider from instance URL: {}. \
                 Supported forges: {}",
                config.instance_url,
                available_providers_string()
            ))
        })?
    };

    create_service_for_provider(provider, config)
}

/// Resolve a provider override string to a `ForgeProvider`.
fn resolve_provider_override(name: &str) -> Result<ForgeProvider, ForgeError> {
    if let Some(provider) = ForgeProvider::parse(name) {
        return Ok(provider);
    }

    if is_known_but_disabled(name) {
        return Err(ForgeError::NotImplemented(format!(
            "forge '{}' is not enabled in this build. \
             Rebuild with `--features {}` to enable it.",
            name, name
        )));
    }

    Err(ForgeError::NotFound(format!(
        "unknown forge provider '{}'. Available providers: {}",
        name,
        available_providers_string()
    )))
}

/// Check if a provider name is known but disabled.
fn is_known_but_disabled(name: &str) -> bool {
    match name.to_lowercase().as_str() {
        #[cfg(not(feature = "github"))]
        "github" => true,
        _ => false,
    }
}

/// Create a service for a specific provider.
fn create_service_for_provider(
    provider: ForgeProvider,
    config: ServiceConfig,
) -> Result<Box<dyn Service>, ForgeError> {
    match provider {
        ForgeProvider::GitLab => {
            let service = GitLabService::new(GitLabConfig {
                instance_url: config.instance_url,
                token: config.token,
            })?;
            Ok(Box::new(service))
        }
        #[cfg(feature = "github")]
        ForgeProvider::GitHub => {
            let service = GitHubService::new(GitHubConfig {
                instance_url: config.instance_url,
                token: config.token,
            });
            Ok(Box::new(service))
        }
    }
}

/// Get a comma-separated string of available providers.
fn available_providers_string() -> String {
    ForgeProvider::all()
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Get the list of valid forge names for configuration validation.
///
/// Includes all known forges, not just enabled ones, so configuration
/// can be validated before features are enabled.
pub fn valid_forge_names() -> &'static [&'static str] {
    &["gitlab", "github"]
}
