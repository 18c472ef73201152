//! Capability contracts and contract-based filtering.
//!
//! # Responsibility
//! - Identify a contract (a `dyn Trait` type) at run time.
//! - Filter descriptor sets down to the types that satisfy a contract.
//!
//! # Invariants
//! - Satisfaction is decided per descriptor kind at query time.
//! - Witnesses for unrelated contracts never change membership.
//! - A missing name and a failed capability test produce the same `NotFound`.

use crate::catalog::descriptor::TypeDescriptor;
use crate::catalog::registry::Registry;
use crate::error::{CatalogError, CatalogResult};
use std::any::{Any, TypeId};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Run-time handle for one capability contract.
///
/// Built from the contract's trait object type, e.g.
/// `Capability::of::<dyn Drawable>()`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Compiler-provided contract name, e.g. `dyn my_crate::Drawable`.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Debug for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Capability({})", self.name)
    }
}

/// Which descriptor kinds a witness covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Satisfied by both the value and the reference descriptor.
    Value,
    /// Satisfied only by the reference descriptor.
    Reference,
}

pub type CastRef<C> = for<'a> fn(&'a (dyn Any + 'static)) -> Option<&'a C>;
pub type CastMut<C> = for<'a> fn(&'a mut (dyn Any + 'static)) -> Option<&'a mut C>;

/// Conversions from an erased value to the contract's trait object.
///
/// Usually produced by [`caster!`](crate::caster). `target` is the concrete
/// type the conversions downcast to; a shape only accepts casters whose
/// target is its own type.
pub struct Caster<C: ?Sized + 'static> {
    pub target: TypeId,
    pub by_ref: CastRef<C>,
    pub by_mut: CastMut<C>,
}

/// Builds a [`Caster`] for `Type => dyn Contract`.
#[macro_export]
macro_rules! caster {
    ($ty:ty => $cap:ty) => {
        $crate::Caster::<$cap> {
            target: ::std::any::TypeId::of::<$ty>(),
            by_ref: |value| match value.downcast_ref::<$ty>() {
                Some(typed) => Some(typed),
                None => None,
            },
            by_mut: |value| match value.downcast_mut::<$ty>() {
                Some(typed) => Some(typed),
                None => None,
            },
        }
    };
}

/// Returns every candidate whose shape satisfies `capability` for its kind.
pub fn filter_by_capability<I>(capability: Capability, candidates: I) -> Vec<Arc<TypeDescriptor>>
where
    I: IntoIterator<Item = Arc<TypeDescriptor>>,
{
    candidates
        .into_iter()
        .filter(|descriptor| descriptor.satisfies(capability))
        .collect()
}

impl Registry {
    /// Every registered descriptor satisfying `capability`.
    pub fn implementing(&self, capability: Capability) -> Vec<Arc<TypeDescriptor>> {
        filter_by_capability(capability, self.all_registered())
    }

    pub fn implementing_of<C: ?Sized + 'static>(&self) -> Vec<Arc<TypeDescriptor>> {
        self.implementing(Capability::of::<C>())
    }

    /// Exact lookup that only succeeds when the named type satisfies
    /// `capability`.
    pub fn lookup_if_capable(
        &self,
        name: &str,
        capability: Capability,
    ) -> CatalogResult<Arc<TypeDescriptor>> {
        match self.lookup(name) {
            Ok(descriptor) if descriptor.satisfies(capability) => Ok(descriptor),
            _ => Err(CatalogError::not_found(name)),
        }
    }

    pub fn lookup_if_capable_of<C: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> CatalogResult<Arc<TypeDescriptor>> {
        self.lookup_if_capable(name, Capability::of::<C>())
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_by_capability, Capability, Receiver};
    use crate::catalog::descriptor::{Shape, TypeDescriptor, TypeKind};
    use crate::catalog::registry::Registry;
    use std::sync::Arc;

    trait Drawable {
        fn draw(&self) -> String;
    }

    trait Resizable {
        fn resize(&mut self, factor: u32);
    }

    #[derive(Default)]
    struct Widget {
        size: u32,
    }

    impl Drawable for Widget {
        fn draw(&self) -> String {
            format!("widget:{}", self.size)
        }
    }

    impl Resizable for Widget {
        fn resize(&mut self, factor: u32) {
            self.size *= factor;
        }
    }

    #[derive(Default)]
    struct Sprocket;

    #[test]
    fn capability_handles_compare_by_contract_type() {
        assert_eq!(
            Capability::of::<dyn Drawable>(),
            Capability::of::<dyn Drawable>()
        );
        assert_ne!(
            Capability::of::<dyn Drawable>(),
            Capability::of::<dyn Resizable>()
        );
        assert!(Capability::of::<dyn Drawable>().name().contains("Drawable"));
    }

    #[test]
    fn reference_receiver_excludes_value_kind() {
        let shape = Shape::of::<Widget>()
            .reference_capability(crate::caster!(Widget => dyn Resizable))
            .build();
        let (value, reference) = TypeDescriptor::pair("shapes", "Widget", shape);
        let resizable = Capability::of::<dyn Resizable>();

        assert!(!value.satisfies(resizable));
        assert!(reference.satisfies(resizable));
        assert_eq!(
            reference.shape().receiver(resizable),
            Some(Receiver::Reference)
        );
    }

    #[test]
    fn filter_keeps_only_capable_candidates() {
        let widget = Arc::new(TypeDescriptor::new(
            "shapes",
            "Widget",
            TypeKind::Reference,
            Shape::of::<Widget>()
                .capability(crate::caster!(Widget => dyn Drawable))
                .build(),
        ));
        let sprocket = Arc::new(TypeDescriptor::new(
            "shapes",
            "Sprocket",
            TypeKind::Reference,
            Shape::of::<Sprocket>().build(),
        ));

        let matches = filter_by_capability(
            Capability::of::<dyn Drawable>(),
            vec![Arc::clone(&widget), sprocket],
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].qualified_name(), "shapes.*Widget");
    }

    #[test]
    fn lookup_if_capable_collapses_both_failures() {
        let registry = Registry::new();
        registry.register(TypeDescriptor::new(
            "shapes",
            "Sprocket",
            TypeKind::Value,
            Shape::of::<Sprocket>().build(),
        ));

        let absent = registry
            .lookup_if_capable_of::<dyn Drawable>("shapes.Missing")
            .expect_err("absent name must fail");
        let incapable = registry
            .lookup_if_capable_of::<dyn Drawable>("shapes.Sprocket")
            .expect_err("incapable type must fail");
        assert!(absent.is_not_found());
        assert!(incapable.is_not_found());
    }
}
