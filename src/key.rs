//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

/// Key for service storage and lookup.
///
/// A key names what a caller asks for. Registrations are grouped by key into
/// ordered entry chains; the last registration of a chain is the one handed
/// out for single-value resolution, the whole chain is used for collection
/// resolution through [`Key::All`].
///
/// # Examples
///
/// ```rust
/// use tiered_di::{key_of, key_of_trait, Key};
///
/// trait Logger: Send + Sync {}
///
/// let number = key_of::<u32>();
/// let logger = key_of_trait::<dyn Logger>();
/// let every_logger = logger.clone().all();
///
/// assert_eq!(number.display_name(), "u32");
/// assert!(logger.display_name().contains("Logger"));
/// assert_eq!(every_logger.element(), Some(&logger));
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    ///
    /// Values are stored as `Arc<T>`.
    Type(TypeId, &'static str),
    /// Trait object key (`dyn Trait`)
    ///
    /// Values are stored as `Arc<Arc<dyn Trait>>` so the fat pointer can be
    /// carried through `dyn Any`.
    Trait(TypeId, &'static str),
    /// One numbered slot under another key
    ///
    /// Used by layered registration features that need several independent
    /// registrations per element key without them showing up in the element
    /// key's own entry chain.
    Indexed(Box<Key>, usize),
    /// Every registration of the inner key, in registration order
    All(Box<Key>),
}

impl Key {
    /// Get the type or trait name for display
    ///
    /// ```rust
    /// use tiered_di::Key;
    /// use std::any::TypeId;
    ///
    /// let key = Key::Type(TypeId::of::<String>(), "alloc::string::String");
    /// assert_eq!(key.display_name(), "alloc::string::String");
    /// assert_eq!(key.all().display_name(), "alloc::string::String");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(_, name) => name,
            Key::Indexed(inner, _) => inner.display_name(),
            Key::All(inner) => inner.display_name(),
        }
    }

    /// Wraps this key into a collection request for all of its registrations.
    pub fn all(self) -> Key {
        Key::All(Box::new(self))
    }

    /// Addresses slot `index` under this key.
    pub fn indexed(self, index: usize) -> Key {
        Key::Indexed(Box::new(self), index)
    }

    /// Returns the element key if this is a collection request.
    pub fn element(&self) -> Option<&Key> {
        match self {
            Key::All(inner) => Some(inner),
            _ => None,
        }
    }
}

// TypeId-only comparison: the name is diagnostic and never part of identity
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a, _), Key::Trait(b, _)) => a == b,
            (Key::Indexed(a, idx_a), Key::Indexed(b, idx_b)) => idx_a == idx_b && a == b,
            (Key::All(a), Key::All(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state); // Discriminant
                id.hash(state);
            }
            Key::Trait(id, _) => {
                1u8.hash(state);
                id.hash(state);
            }
            Key::Indexed(inner, idx) => {
                2u8.hash(state);
                inner.hash(state);
                idx.hash(state);
            }
            Key::All(inner) => {
                3u8.hash(state);
                inner.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Type(_, name) | Key::Trait(_, name) => f.write_str(name),
            Key::Indexed(inner, idx) => write!(f, "{}[{}]", inner, idx),
            Key::All(inner) => write!(f, "all<{}>", inner),
        }
    }
}

/// Key for a concrete service type.
#[inline(always)]
pub fn key_of<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait-object service, e.g. `key_of_trait::<dyn Logger>()`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(TypeId::of::<T>(), std::any::type_name::<T>())
}
