//! Self-registration and the process-wide catalog.
//!
//! # Responsibility
//! - Collect `register_type!` declarations linked into the program.
//! - Apply them to a registry, once for the process-wide catalog.
//!
//! # Invariants
//! - `catalog()` bootstraps exactly once, on first use.
//! - Applying the declarations again replaces entries with equivalent ones.
//! - Every declaration registers both the value and the reference kind.

use crate::catalog::descriptor::Shape;
use crate::catalog::registry::Registry;
use log::info;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// One linked-in type declaration.
pub struct TypeRegistration {
    namespace: &'static str,
    name: &'static str,
    shape: fn() -> Arc<Shape>,
}

impl TypeRegistration {
    pub const fn new(
        namespace: &'static str,
        name: &'static str,
        shape: fn() -> Arc<Shape>,
    ) -> Self {
        Self {
            namespace,
            name,
            shape,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

inventory::collect!(TypeRegistration);

/// Declares a type discoverable by the process-wide catalog.
///
/// ```ignore
/// register_type!(Widget in "shapes", capabilities: [dyn Drawable]);
/// register_type!(Gear, reference_capabilities: [dyn Request]);
/// ```
///
/// The namespace defaults to the invoking module path. The type must be a
/// plain identifier implementing `Default + Send + Sync + 'static`.
#[macro_export]
macro_rules! register_type {
    (@namespace) => {
        module_path!()
    };
    (@namespace $ns:expr) => {
        $ns
    };
    (
        $ty:ident $(in $ns:expr)?
        $(, capabilities: [$($cap:ty),* $(,)?])?
        $(, reference_capabilities: [$($rcap:ty),* $(,)?])?
        $(,)?
    ) => {
        const _: () = {
            fn shape() -> ::std::sync::Arc<$crate::Shape> {
                $crate::Shape::of::<$ty>()
                    $($(.capability($crate::caster!($ty => $cap)))*)?
                    $($(.reference_capability($crate::caster!($ty => $rcap)))*)?
                    .build()
            }

            $crate::inventory::submit! {
                $crate::TypeRegistration::new(
                    $crate::register_type!(@namespace $($ns)?),
                    stringify!($ty),
                    shape,
                )
            }
        };
    };
}

static CATALOG: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    bootstrap(&registry);
    registry
});

/// Process-wide catalog, bootstrapped from every linked declaration on
/// first use.
///
/// Later `register*` calls on it are allowed for dynamically loaded types.
pub fn catalog() -> &'static Registry {
    &CATALOG
}

/// Applies every linked declaration to `registry`.
///
/// Returns the number of declarations applied.
pub fn bootstrap(registry: &Registry) -> usize {
    let mut applied = 0;
    for registration in inventory::iter::<TypeRegistration> {
        registry.register_pair(
            registration.namespace,
            registration.name,
            (registration.shape)(),
        );
        applied += 1;
    }
    info!(
        "event=catalog_bootstrap module=catalog status=ok declarations={} entries={}",
        applied,
        registry.len()
    );
    applied
}

#[cfg(test)]
mod tests {
    use super::{bootstrap, catalog};
    use crate::catalog::registry::Registry;

    #[derive(Default)]
    struct Probe;

    crate::register_type!(Probe in "bootstrap.tests");

    #[test]
    fn bootstrap_registers_both_kinds() {
        let registry = Registry::new();
        assert!(bootstrap(&registry) >= 1);

        assert!(registry.lookup("bootstrap.tests.Probe").is_ok());
        assert!(registry.lookup("bootstrap.tests.*Probe").is_ok());
        assert_eq!(registry.all_in_namespace("bootstrap.tests").len(), 2);
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let registry = Registry::new();
        bootstrap(&registry);
        let entries = registry.len();
        bootstrap(&registry);
        assert_eq!(registry.len(), entries);
    }

    #[test]
    fn process_catalog_is_shared() {
        assert!(std::ptr::eq(catalog(), catalog()));
        assert!(catalog().lookup("bootstrap.tests.*Probe").is_ok());
    }
}
