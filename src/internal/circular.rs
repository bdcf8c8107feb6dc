//! Circular dependency detection for dynamic resolution.
//!
//! Factories resolve their dependencies at run time, out of sight of the
//! planner. Every resolution therefore carries the chain of keys it is nested
//! in as a stack-allocated linked list that is passed explicitly down the
//! call stack. No state is shared between threads or scopes.

use crate::error::{DiError, DiResult};
use crate::key::Key;

pub(crate) const MAX_DEPTH: usize = 1024;

/// One link of the active resolution path.
pub(crate) struct CallChain<'a> {
    key: &'a Key,
    parent: Option<&'a CallChain<'a>>,
    depth: usize,
}

impl<'a> CallChain<'a> {
    /// Enters `key` below `parent`, failing if it is already being resolved.
    pub(crate) fn enter(parent: Option<&'a CallChain<'a>>, key: &'a Key) -> DiResult<Self> {
        let depth = parent.map_or(0, |p| p.depth + 1);
        if depth >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(depth));
        }
        if let Some(parent) = parent {
            if let Some(cycle) = parent.cycle_to(key) {
                return Err(DiError::Circular(cycle));
            }
        }
        Ok(Self { key, parent, depth })
    }

    pub(crate) fn key(&self) -> &Key {
        self.key
    }

    // Keys from the first occurrence of `key` down to this link, outermost first
    fn cycle_to(&self, key: &Key) -> Option<Vec<&'static str>> {
        let mut path = Vec::new();
        let mut link = Some(self);
        while let Some(current) = link {
            path.push(current.key.display_name());
            if current.key == key {
                path.reverse();
                return Some(path);
            }
            link = current.parent;
        }
        None
    }
}
