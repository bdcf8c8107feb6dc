//! Internal disposal bag for tracked disposable instances.

use std::panic::{self, AssertUnwindSafe};

use crate::descriptors::Releaser;
use crate::registration::AnyArc;

/// Disposable instances in creation order, each with its releaser.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<(AnyArc, Releaser)>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, value: AnyArc, release: Releaser) {
        self.entries.push((value, release));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Appends `other` after this bag's entries.
    pub(crate) fn append(&mut self, mut other: DisposeBag) {
        self.entries.append(&mut other.entries);
    }

    /// Releases every entry in creation order (FIFO).
    ///
    /// A panicking releaser does not stop the rest from running; the first
    /// panic is resumed once the bag is empty.
    pub(crate) fn run_all(self) {
        let mut first_panic = None;
        for (value, release) in self.entries {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| release(&value))) {
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}
