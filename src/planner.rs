//! Resolution planning: turns a requested key into a call-site tree.

use crate::call_site::CallSite;
use crate::descriptors::Source;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Registration, ServiceTable};

/// Builds call sites from the registration table.
///
/// `active` holds the keys being planned on the current path. It is owned by
/// the caller of [`plan`](CallSiteFactory::plan) and lives for one top-level
/// planning pass, so concurrent planning on other threads never sees it.
pub(crate) struct CallSiteFactory<'t> {
    table: &'t ServiceTable,
}

impl<'t> CallSiteFactory<'t> {
    pub(crate) fn new(table: &'t ServiceTable) -> Self {
        Self { table }
    }

    /// Plans `key`; `Ok(None)` means nothing is registered for it.
    pub(crate) fn plan(&self, key: &Key, active: &mut Vec<Key>) -> DiResult<Option<CallSite>> {
        if let Some(start) = active.iter().position(|k| k == key) {
            return Err(DiError::Circular(
                active[start..].iter().map(Key::display_name).collect(),
            ));
        }

        active.push(key.clone());
        let planned = self.plan_entry(key, active);
        // Path-sensitive: siblings may plan the same key again
        active.pop();
        planned
    }

    fn plan_entry(&self, key: &Key, active: &mut Vec<Key>) -> DiResult<Option<CallSite>> {
        if let Some(entry) = self.table.lookup(key) {
            return self.plan_registration(entry.last(), active).map(Some);
        }

        if let Key::All(element) = key {
            let site = match self.table.lookup(element) {
                Some(entry) => CallSite::ResolveAll {
                    element: (**element).clone(),
                    items: entry
                        .iter()
                        .map(|registration| self.plan_registration(registration, active))
                        .collect::<DiResult<Vec<_>>>()?,
                },
                None => CallSite::EmptyCollection {
                    element: (**element).clone(),
                },
            };
            return Ok(Some(site));
        }

        Ok(None)
    }

    /// Plans one registration wrapped in its lifetime node.
    fn plan_registration(&self, registration: &Registration, active: &mut Vec<Key>) -> DiResult<CallSite> {
        let descriptor = &registration.descriptor;
        let inner = match &descriptor.source {
            Source::Constructor { params, ctor } => {
                let mut planned = Vec::with_capacity(params.len());
                for param in params.iter() {
                    match self.plan(param, active)? {
                        Some(site) => planned.push(site),
                        None => {
                            return Err(DiError::MissingDependency {
                                service: descriptor.impl_type_name,
                                dependency: param.display_name(),
                            })
                        }
                    }
                }
                CallSite::Constructor {
                    service: descriptor.impl_type_name,
                    params: planned,
                    ctor: ctor.clone(),
                }
            }
            Source::Factory(factory) => CallSite::Factory {
                key: descriptor.key.clone(),
                factory: factory.clone(),
            },
            Source::Instance(value) => CallSite::Instance(value.clone()),
        };

        let inner = Box::new(inner);
        let release = descriptor.release.clone();
        Ok(match descriptor.lifetime {
            Lifetime::Transient => CallSite::Transient { inner, release },
            Lifetime::Scoped => CallSite::Scoped {
                id: registration.id,
                inner,
                release,
            },
            Lifetime::Singleton => CallSite::Singleton {
                id: registration.id,
                inner,
                release,
            },
        })
    }
}
