//! Provider configuration.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// When and where compiled accessors are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum CompileMode {
    /// Compile on a detached worker; callers never wait for it
    #[default]
    Background,
    /// Compile on the invocation that reaches the threshold
    ///
    /// Deterministic, at the price of one slower call. Mostly useful in tests
    /// and in environments without threads.
    Inline,
    /// Never compile; every resolution walks the call-site tree
    Disabled,
}

/// Options for a built [`ServiceProvider`](crate::ServiceProvider).
///
/// # Examples
///
/// ```rust
/// use tiered_di::{CompileMode, ProviderOptions, ServiceCollection};
///
/// let options = ProviderOptions::new()
///     .compile_mode(CompileMode::Inline)
///     .compile_threshold(4);
///
/// let provider = ServiceCollection::new().build_with(options);
/// assert_eq!(provider.options().compile_threshold, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ProviderOptions {
    pub compile_mode: CompileMode,
    /// Invocation count of an accessor that triggers its compile; 0 is
    /// treated as 1
    pub compile_threshold: usize,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile_mode(mut self, mode: CompileMode) -> Self {
        self.compile_mode = mode;
        self
    }

    pub fn compile_threshold(mut self, threshold: usize) -> Self {
        self.compile_threshold = threshold;
        self
    }
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            compile_mode: CompileMode::Background,
            compile_threshold: 2,
        }
    }
}
