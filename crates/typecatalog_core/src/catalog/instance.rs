//! Dynamic instantiation from descriptors.
//!
//! # Responsibility
//! - Build zero values or fresh shared allocations from a descriptor alone.
//! - Expose built instances through their concrete type or a capability.
//!
//! # Invariants
//! - Reference instances never share an allocation unless `share` is used.
//! - Value instances equal their type's `Default` value when built.
//! - Capability access honours the witness receiver of the instance kind.

use crate::catalog::capability::Capability;
use crate::catalog::descriptor::{BoxedValue, Shape, TypeDescriptor, TypeKind};
use crate::catalog::registry::Registry;
use crate::error::{CatalogError, CatalogResult};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

enum Slot {
    Owned(BoxedValue),
    Shared(Arc<RwLock<BoxedValue>>),
}

/// Type-erased instance produced by the catalog.
pub struct Instance {
    shape: Arc<Shape>,
    kind: TypeKind,
    slot: Slot,
}

impl Instance {
    fn new(shape: Arc<Shape>, kind: TypeKind, value: BoxedValue) -> Self {
        let slot = match kind {
            TypeKind::Value => Slot::Owned(value),
            TypeKind::Reference => Slot::Shared(Arc::new(RwLock::new(value))),
        };
        Self { shape, kind, slot }
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.shape.is::<T>()
    }

    /// Runs `f` against the concrete value when it is a `T`.
    pub fn read<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        match &self.slot {
            Slot::Owned(value) => (**value).downcast_ref::<T>().map(f),
            Slot::Shared(cell) => {
                let guard = cell.read();
                (**guard).downcast_ref::<T>().map(f)
            }
        }
    }

    /// Runs `f` against the concrete value mutably when it is a `T`.
    ///
    /// Writes through a reference instance are visible to every handle
    /// obtained from `share`.
    pub fn write<T: 'static, R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        match &mut self.slot {
            Slot::Owned(value) => (**value).downcast_mut::<T>().map(f),
            Slot::Shared(cell) => {
                let mut guard = cell.write();
                (**guard).downcast_mut::<T>().map(f)
            }
        }
    }

    /// Runs `f` against the instance viewed as contract `C`.
    ///
    /// Returns `None` when the instance kind does not satisfy `C`.
    pub fn with_capability<C: ?Sized + 'static, R>(
        &self,
        f: impl FnOnce(&C) -> R,
    ) -> Option<R> {
        let caster = self.shape.caster::<C>(self.kind)?;
        match &self.slot {
            Slot::Owned(value) => (caster.by_ref)(as_any(value)).map(f),
            Slot::Shared(cell) => {
                let guard = cell.read();
                (caster.by_ref)(as_any(&guard)).map(f)
            }
        }
    }

    pub fn with_capability_mut<C: ?Sized + 'static, R>(
        &mut self,
        f: impl FnOnce(&mut C) -> R,
    ) -> Option<R> {
        let caster = self.shape.caster::<C>(self.kind)?;
        match &mut self.slot {
            Slot::Owned(value) => (caster.by_mut)(as_any_mut(value)).map(f),
            Slot::Shared(cell) => {
                let mut guard = cell.write();
                (caster.by_mut)(as_any_mut(&mut guard)).map(f)
            }
        }
    }

    pub fn satisfies(&self, capability: Capability) -> bool {
        self.shape.satisfies(capability, self.kind)
    }

    /// Another handle to the same allocation; `None` for value instances.
    pub fn share(&self) -> Option<Instance> {
        match &self.slot {
            Slot::Owned(_) => None,
            Slot::Shared(cell) => Some(Self {
                shape: Arc::clone(&self.shape),
                kind: self.kind,
                slot: Slot::Shared(Arc::clone(cell)),
            }),
        }
    }

    /// Whether both handles point at the same reference allocation.
    pub fn same_allocation(&self, other: &Instance) -> bool {
        match (&self.slot, &other.slot) {
            (Slot::Shared(left), Slot::Shared(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }

    /// Extracts the concrete value.
    ///
    /// Fails, handing the instance back, when the type does not match or a
    /// shared allocation still has other handles.
    pub fn into_value<T: 'static>(self) -> Result<T, Instance> {
        if !self.is::<T>() {
            return Err(self);
        }
        let Instance { shape, kind, slot } = self;
        let value = match slot {
            Slot::Owned(value) => value,
            Slot::Shared(cell) => match Arc::try_unwrap(cell) {
                Ok(lock) => lock.into_inner(),
                Err(cell) => {
                    return Err(Instance {
                        shape,
                        kind,
                        slot: Slot::Shared(cell),
                    })
                }
            },
        };
        match value.downcast::<T>() {
            Ok(typed) => Ok(*typed),
            Err(value) => Err(Instance {
                shape,
                kind,
                slot: Slot::Owned(value),
            }),
        }
    }
}

fn as_any(value: &BoxedValue) -> &(dyn Any + 'static) {
    &**value
}

fn as_any_mut(value: &mut BoxedValue) -> &mut (dyn Any + 'static) {
    &mut **value
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.shape.type_name())
            .field("kind", &self.kind)
            .finish()
    }
}

impl TypeDescriptor {
    /// Builds an instance preserving the descriptor kind.
    ///
    /// Reference descriptors yield a fresh allocation per call; value
    /// descriptors yield the type's zero value.
    pub fn instantiate(&self) -> CatalogResult<Instance> {
        self.instantiate_as(self.kind())
    }

    /// Builds an instance of an explicit kind over this descriptor's shape.
    pub fn instantiate_as(&self, kind: TypeKind) -> CatalogResult<Instance> {
        let value = self
            .shape()
            .zero_value()
            .map_err(|reason| CatalogError::InvalidDescriptor {
                name: self.qualified_name().to_string(),
                reason,
            })?;
        Ok(Instance::new(Arc::clone(self.shape()), kind, value))
    }
}

impl Registry {
    /// Looks up `name` and instantiates it with its own kind.
    pub fn new_instance(&self, name: &str) -> CatalogResult<Instance> {
        self.lookup(name)?.instantiate()
    }

    /// Instantiates `name` only when it satisfies `capability`.
    pub fn new_instance_if_capable(
        &self,
        name: &str,
        capability: Capability,
    ) -> CatalogResult<Instance> {
        self.lookup_if_capable(name, capability)?.instantiate()
    }

    pub fn new_instance_if_capable_of<C: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> CatalogResult<Instance> {
        self.new_instance_if_capable(name, Capability::of::<C>())
    }

    /// Namespace-scoped counterpart of `new_instance`.
    pub fn new_instance_in_namespace(
        &self,
        namespace: &str,
        name: &str,
    ) -> CatalogResult<Instance> {
        self.lookup_in_namespace(namespace, name)?.instantiate()
    }

    /// Instantiates the value-kind descriptor registered for the static type
    /// `T`.
    pub fn new_instance_of<T: 'static>(&self) -> CatalogResult<Instance> {
        self.lookup_type::<T>()?.instantiate()
    }

    /// Instantiates `name` as a reference instance whatever its declared kind.
    ///
    /// Unlike `new_instance`, a value-kind descriptor also yields a shared,
    /// mutable allocation. The instance then follows reference-kind
    /// capability rules.
    pub fn new_reference_instance(&self, name: &str) -> CatalogResult<Instance> {
        self.lookup(name)?.instantiate_as(TypeKind::Reference)
    }
}
