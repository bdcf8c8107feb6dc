//! Error types for the dependency injection container.

use std::error::Error as StdError;
use std::sync::Arc;

/// Dependency injection errors
///
/// Represents the failure conditions that can occur while planning or
/// executing a resolution. Note that an unregistered key is *not* an error:
/// resolution of an absent service yields `Ok(None)` (or an empty sequence
/// for collection resolution).
///
/// # Examples
///
/// ```rust
/// use tiered_di::DiError;
///
/// let circular = DiError::Circular(vec!["app::A", "app::B"]);
/// assert_eq!(circular.to_string(), "Circular dependency: app::A -> app::B -> app::A");
///
/// let missing = DiError::MissingDependency { service: "app::Repo", dependency: "app::Db" };
/// println!("Error: {}", missing);
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// Circular dependency detected; carries the cycle starting at the key
    /// that was re-entered
    #[error("Circular dependency: {}", format_cycle(.0))]
    Circular(Vec<&'static str>),
    /// A constructor parameter has no registration
    #[error("Unable to resolve {dependency} while constructing {service}")]
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// User construction code failed; `source` is the error it returned
    #[error("Construction of {service} failed: {source}")]
    Construction {
        service: &'static str,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },
    /// The scope was disposed and no longer hands out cached or tracked instances
    #[error("Scope has been disposed")]
    ScopeDisposed,
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// Wraps a foreign error raised by user construction code.
    ///
    /// The original error is kept unchanged and can be recovered with
    /// [`DiError::construction_error`] and a downcast.
    pub fn construction<E>(service: &'static str, error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        DiError::Construction {
            service,
            source: Arc::from(error.into()),
        }
    }

    /// Returns the user error carried by a `Construction` failure.
    ///
    /// Unlike [`std::error::Error::source`], this yields the original error
    /// itself rather than the shared handle around it, so it can be downcast.
    pub fn construction_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            DiError::Construction { source, .. } => Some(&**source),
            _ => None,
        }
    }

    /// Returns the cycle for `Circular` errors.
    pub fn cycle(&self) -> Option<&[&'static str]> {
        match self {
            DiError::Circular(path) => Some(path),
            _ => None,
        }
    }
}

fn format_cycle(path: &[&'static str]) -> String {
    let mut out = path.join(" -> ");
    if let Some(first) = path.first() {
        out.push_str(" -> ");
        out.push_str(first);
    }
    out
}

/// Result type for DI operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{DiResult, DiError};
///
/// fn open() -> DiResult<String> {
///     Err(DiError::construction("app::Conn", "refused"))
/// }
///
/// assert!(open().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
