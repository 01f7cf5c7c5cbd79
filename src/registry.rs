//! Method registry mapping names to wire-id bindings.
//!
//! The registry is the mutable cache behind the bind protocol: seeded from
//! an immutable [`MethodTable`], it tracks which methods have been resolved
//! to a server-assigned id on the current connection. Assigned ids are a
//! property of the connection, so [`MethodRegistry::reset`] drops them all
//! (except the two protocol-reserved entries) when the connection is
//! reopened.

use std::collections::HashMap;

use crate::methods::MethodTable;

/// Association of a method name with its types and, once bound, a wire id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    /// Method name, unique key.
    pub method: String,
    /// Full input message type name.
    pub input: String,
    /// Full output message type name.
    pub output: String,
    /// Owning plugin, if any.
    pub plugin: Option<String>,
    /// Server-assigned wire id; `None` until the method is bound.
    pub assigned_id: Option<i16>,
    /// Reserved entries keep their id across resets.
    reserved: bool,
}

impl MethodBinding {
    /// Check if this binding has a resolved wire id.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.assigned_id.is_some()
    }
}

/// Name-keyed map of method bindings for one connection.
pub struct MethodRegistry {
    bindings: HashMap<String, MethodBinding>,
}

impl MethodRegistry {
    /// Seed a registry from a static table.
    ///
    /// Entries with a reserved id start bound; everything else starts
    /// unassigned.
    pub fn new(table: &MethodTable) -> Self {
        let bindings = table
            .entries()
            .iter()
            .map(|decl| {
                (
                    decl.method.clone(),
                    MethodBinding {
                        method: decl.method.clone(),
                        input: decl.input.clone(),
                        output: decl.output.clone(),
                        plugin: decl.plugin.clone(),
                        assigned_id: decl.reserved_id,
                        reserved: decl.reserved_id.is_some(),
                    },
                )
            })
            .collect();
        Self { bindings }
    }

    /// Look up a binding by method name.
    pub fn lookup(&self, method: &str) -> Option<&MethodBinding> {
        self.bindings.get(method)
    }

    /// Check if a method has a resolved wire id.
    pub fn is_bound(&self, method: &str) -> bool {
        self.lookup(method).is_some_and(MethodBinding::is_bound)
    }

    /// Insert or update a binding with a resolved id.
    ///
    /// Rebinding an already-bound method with the same id is a no-op. The
    /// registry never swaps an already-assigned id on a live connection; a
    /// conflicting record is kept out and logged.
    pub fn record(
        &mut self,
        method: &str,
        input: &str,
        output: &str,
        plugin: Option<&str>,
        assigned_id: i16,
    ) -> &MethodBinding {
        let binding = self
            .bindings
            .entry(method.to_string())
            .or_insert_with(|| MethodBinding {
                method: method.to_string(),
                input: input.to_string(),
                output: output.to_string(),
                plugin: plugin.map(str::to_string),
                assigned_id: None,
                reserved: false,
            });

        match binding.assigned_id {
            None => binding.assigned_id = Some(assigned_id),
            Some(current) if current == assigned_id => {}
            Some(current) => {
                tracing::warn!(
                    method,
                    current,
                    offered = assigned_id,
                    "ignoring conflicting id for already-bound method"
                );
            }
        }
        binding
    }

    /// Names of all methods without a resolved id, sorted for determinism.
    pub fn unbound(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .bindings
            .values()
            .filter(|b| !b.is_bound())
            .map(|b| b.method.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Drop all non-reserved id assignments.
    ///
    /// Called when the connection is closed: ids assigned by the server are
    /// only valid for the connection that issued them.
    pub fn reset(&mut self) {
        for binding in self.bindings.values_mut() {
            if !binding.reserved {
                binding.assigned_id = None;
            }
        }
    }

    /// Number of known methods.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
