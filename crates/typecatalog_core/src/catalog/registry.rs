//! Process-scoped type catalog indices.
//!
//! # Responsibility
//! - Keep the by-name and by-namespace indices of registered descriptors.
//! - Serve exact, substring, pattern and namespace-scoped lookups.
//!
//! # Invariants
//! - Exactly one by-name entry exists per key; re-registration replaces it.
//! - A namespace lists each qualified name at most once.
//! - Published descriptors are never mutated; replacement swaps the `Arc`.
//! - Unscoped lookups follow hash iteration order and are not deterministic
//!   across ties.

use crate::catalog::descriptor::{Shape, TypeDescriptor, TypeKind};
use crate::error::{CatalogError, CatalogResult};
use log::debug;
use parking_lot::RwLock;
use regex::Regex;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Indices {
    by_name: HashMap<String, Arc<TypeDescriptor>>,
    by_namespace: HashMap<String, Vec<Arc<TypeDescriptor>>>,
}

impl Indices {
    fn insert(&mut self, key: String, descriptor: Arc<TypeDescriptor>) {
        let members = self
            .by_namespace
            .entry(descriptor.namespace().to_string())
            .or_default();
        match members
            .iter_mut()
            .find(|member| member.qualified_name() == descriptor.qualified_name())
        {
            Some(slot) => *slot = Arc::clone(&descriptor),
            None => members.push(Arc::clone(&descriptor)),
        }
        self.by_name.insert(key, descriptor);
    }
}

/// Read-mostly catalog of type descriptors.
///
/// Writers hold the lock only for the index update, so readers never see a
/// half-registered descriptor.
#[derive(Default)]
pub struct Registry {
    indices: RwLock<Indices>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` under its qualified name.
    pub fn register(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let key = descriptor.qualified_name().to_string();
        self.register_as(key, descriptor)
    }

    /// Registers `descriptor` under an explicit alias key.
    ///
    /// The namespace index still tracks the descriptor by its qualified name.
    pub fn register_as(
        &self,
        key: impl Into<String>,
        descriptor: TypeDescriptor,
    ) -> Arc<TypeDescriptor> {
        let key = key.into();
        let descriptor = Arc::new(descriptor);
        debug!(
            "event=type_registered module=catalog key={} namespace={} kind={}",
            key,
            descriptor.namespace(),
            descriptor.kind().as_str()
        );
        self.indices.write().insert(key, Arc::clone(&descriptor));
        descriptor
    }

    /// Registers both kinds of one declared type.
    pub fn register_pair(
        &self,
        namespace: &str,
        declared_name: &str,
        shape: Arc<Shape>,
    ) -> (Arc<TypeDescriptor>, Arc<TypeDescriptor>) {
        let (value, reference) = TypeDescriptor::pair(namespace, declared_name, shape);
        (self.register(value), self.register(reference))
    }

    /// Exact match on the by-name index.
    pub fn lookup(&self, name: &str) -> CatalogResult<Arc<TypeDescriptor>> {
        self.indices
            .read()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(name))
    }

    /// Every descriptor whose key contains `fragment`. Unordered.
    pub fn lookup_by_substring(&self, fragment: &str) -> Vec<Arc<TypeDescriptor>> {
        self.collect_keys(|key| key.contains(fragment))
    }

    /// First descriptor whose key contains `fragment`.
    ///
    /// Which one wins among several matches is unspecified.
    pub fn lookup_one_by_substring(&self, fragment: &str) -> CatalogResult<Arc<TypeDescriptor>> {
        self.indices
            .read()
            .by_name
            .iter()
            .find(|(key, _)| key.contains(fragment))
            .map(|(_, descriptor)| Arc::clone(descriptor))
            .ok_or_else(|| CatalogError::not_found(fragment))
    }

    /// Every descriptor whose key matches `pattern`. Unordered.
    pub fn lookup_by_pattern(&self, pattern: &Regex) -> Vec<Arc<TypeDescriptor>> {
        self.collect_keys(|key| pattern.is_match(key))
    }

    /// Bare-name lookup scoped to one namespace.
    ///
    /// `name` is `Widget` for the value kind and `*Widget` for the reference
    /// kind.
    pub fn lookup_in_namespace(
        &self,
        namespace: &str,
        name: &str,
    ) -> CatalogResult<Arc<TypeDescriptor>> {
        self.indices
            .read()
            .by_namespace
            .get(namespace)
            .and_then(|members| members.iter().find(|member| member.name() == name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("{namespace}.{name}")))
    }

    /// Descriptors of `namespace` in registration order.
    pub fn all_in_namespace(&self, namespace: &str) -> Vec<Arc<TypeDescriptor>> {
        self.indices
            .read()
            .by_namespace
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    /// Unordered snapshot of every registered descriptor.
    ///
    /// Each qualified name is reported once. The entry registered under its
    /// own qualified name wins over alias keys carrying the same name.
    pub fn all_registered(&self) -> Vec<Arc<TypeDescriptor>> {
        let indices = self.indices.read();
        let (natural, aliases): (Vec<_>, Vec<_>) = indices
            .by_name
            .iter()
            .partition(|(key, descriptor)| key.as_str() == descriptor.qualified_name());
        let mut seen = HashSet::new();
        natural
            .into_iter()
            .chain(aliases)
            .map(|(_, descriptor)| descriptor)
            .filter(|descriptor| seen.insert(descriptor.qualified_name().to_string()))
            .cloned()
            .collect()
    }

    /// Sorted namespace identities.
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> =
            self.indices.read().by_namespace.keys().cloned().collect();
        namespaces.sort();
        namespaces
    }

    /// Value-kind descriptor registered for the static type `T`.
    pub fn lookup_type<T: 'static>(&self) -> CatalogResult<Arc<TypeDescriptor>> {
        self.find_value_kind(TypeId::of::<T>())
            .ok_or_else(|| CatalogError::not_found(std::any::type_name::<T>()))
    }

    /// Value-kind descriptor for the dynamic type of `value`.
    ///
    /// Pass the value itself, not a `Box` holding it.
    pub fn descriptor_of(
        &self,
        value: &(dyn Any + 'static),
    ) -> CatalogResult<Arc<TypeDescriptor>> {
        self.find_value_kind(value.type_id())
            .ok_or_else(|| CatalogError::not_found("<unregistered value type>"))
    }

    /// Number of by-name keys, aliases included.
    pub fn len(&self) -> usize {
        self.indices.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.read().by_name.is_empty()
    }

    fn find_value_kind(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.all_registered().into_iter().find(|descriptor| {
            descriptor.kind() == TypeKind::Value && descriptor.shape().type_key() == type_id
        })
    }

    fn collect_keys(&self, matches: impl Fn(&str) -> bool) -> Vec<Arc<TypeDescriptor>> {
        self.indices
            .read()
            .by_name
            .iter()
            .filter(|(key, _)| matches(key))
            .map(|(_, descriptor)| Arc::clone(descriptor))
            .collect()
    }
}
