//! # tiered-di
//!
//! Call-site based dependency injection for Rust, modeled on
//! Microsoft.Extensions.DependencyInjection.
//!
//! ## Features
//!
//! - **Lifetimes**: Singleton, Scoped and Transient services
//! - **Registration order**: the last registration of a key wins, collection
//!   resolution returns every registration in order
//! - **Cycle detection**: constructor cycles are found while planning, factory
//!   cycles while resolving, with the offending path in the error
//! - **Tiered execution**: each key starts out interpreting its call-site tree
//!   and switches to a compiled closure form after repeated use
//! - **Disposal tracking**: scopes release their disposables deterministically
//!
//! ## Quick Start
//!
//! ```rust
//! use tiered_di::{key_of, Lifetime, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_constructor::<UserService, _>(Lifetime::Transient, [key_of::<Database>()], |args| {
//!     Ok(UserService { db: args.get::<Database>(0)? })
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: created once per provider, shared by every scope
//! - **Scoped**: created once per scope
//! - **Transient**: created fresh on every resolution
//!
//! ## Absent services
//!
//! Resolving a key with no registration is not an error:
//!
//! ```rust
//! use tiered_di::{Resolver, ServiceCollection};
//!
//! struct Unregistered;
//!
//! let provider = ServiceCollection::new().build();
//! assert!(provider.get::<Unregistered>().unwrap().is_none());
//! assert!(provider.get_all::<Unregistered>().unwrap().is_empty());
//! ```

pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod traits;

mod call_site;
mod executor;
mod internal;
mod planner;
mod registration;

pub use collection::{Ordered, OrderedServiceCollectionExt, ServiceCollection};
pub use config::{CompileMode, ProviderOptions};
pub use descriptors::{Args, ServiceDescriptor};
pub use error::{DiError, DiResult};
pub use executor::AccessorState;
pub use key::{key_of, key_of_trait, Key};
pub use lifetime::Lifetime;
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use traits::{Dispose, Resolver, ResolverCore};
