//! Type descriptors and the shapes behind them.
//!
//! # Responsibility
//! - Name one discoverable type: qualified name, bare name, namespace, kind.
//! - Carry a shape able to build zero values and answer capability checks.
//!
//! # Invariants
//! - A `Shape` is never mutated after `ShapeBuilder::build`.
//! - The value and reference descriptors of one declared type share a shape.
//! - Reference names carry a `*` prefix: `shapes.*Widget` / `*Widget`.

use crate::catalog::capability::{Capability, Caster, Receiver};
use log::warn;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Owned, type-erased value stored in instances.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// Zero-value constructor for one shape.
pub type ZeroFn = fn() -> BoxedValue;

/// Instantiation semantics of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Instantiation yields a self-contained zero value.
    Value,
    /// Instantiation yields a fresh shared, mutable allocation.
    Reference,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Reference => "reference",
        }
    }
}

struct Witness {
    capability: Capability,
    receiver: Receiver,
    caster: Box<dyn Any + Send + Sync>,
}

/// Type identity, zero constructor and capability witnesses of one type.
pub struct Shape {
    type_id: TypeId,
    type_name: &'static str,
    zero: ZeroFn,
    witnesses: HashMap<TypeId, Witness>,
}

fn zero_of<T: Default + Send + Sync + 'static>() -> BoxedValue {
    Box::new(T::default())
}

impl Shape {
    /// Starts a shape for `T`, whose zero value is `T::default()`.
    pub fn of<T: Default + Send + Sync + 'static>() -> ShapeBuilder {
        Self::from_parts(TypeId::of::<T>(), std::any::type_name::<T>(), zero_of::<T>)
    }

    /// Starts a shape from raw parts.
    ///
    /// Used by loaders that cannot name the type statically. The zero
    /// constructor is only checked against `type_id` at instantiation time.
    pub fn from_parts(type_id: TypeId, type_name: &'static str, zero: ZeroFn) -> ShapeBuilder {
        ShapeBuilder {
            shape: Shape {
                type_id,
                type_name,
                zero,
                witnesses: HashMap::new(),
            },
        }
    }

    /// `TypeId` of the described type.
    pub fn type_key(&self) -> TypeId {
        self.type_id
    }

    /// Rust type path as reported by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Builds a zero value, verifying it really is this shape's type.
    pub(crate) fn zero_value(&self) -> Result<BoxedValue, String> {
        let value = (self.zero)();
        let produced = (*value).type_id();
        if produced != self.type_id {
            return Err(format!(
                "zero constructor does not produce `{}`",
                self.type_name
            ));
        }
        Ok(value)
    }

    /// Receiver recorded for `capability`, if any witness exists.
    pub fn receiver(&self, capability: Capability) -> Option<Receiver> {
        self.witnesses
            .get(&capability.id())
            .map(|witness| witness.receiver)
    }

    /// Whether a descriptor of `kind` built on this shape satisfies
    /// `capability`.
    pub fn satisfies(&self, capability: Capability, kind: TypeKind) -> bool {
        match self.receiver(capability) {
            Some(Receiver::Value) => true,
            Some(Receiver::Reference) => kind == TypeKind::Reference,
            None => false,
        }
    }

    /// Contracts witnessed for `kind`, sorted by name.
    pub fn capabilities(&self, kind: TypeKind) -> Vec<Capability> {
        let mut capabilities: Vec<Capability> = self
            .witnesses
            .values()
            .map(|witness| witness.capability)
            .filter(|capability| self.satisfies(*capability, kind))
            .collect();
        capabilities.sort_by_key(|capability| capability.name());
        capabilities
    }

    pub(crate) fn caster<C: ?Sized + 'static>(&self, kind: TypeKind) -> Option<&Caster<C>> {
        let capability = Capability::of::<C>();
        if !self.satisfies(capability, kind) {
            return None;
        }
        self.witnesses
            .get(&capability.id())?
            .caster
            .downcast_ref::<Caster<C>>()
    }
}

impl Debug for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut contracts: Vec<&str> = self
            .witnesses
            .values()
            .map(|witness| witness.capability.name())
            .collect();
        contracts.sort_unstable();
        f.debug_struct("Shape")
            .field("type_name", &self.type_name)
            .field("capabilities", &contracts)
            .finish()
    }
}

/// Collects capability witnesses before a shape is frozen.
pub struct ShapeBuilder {
    shape: Shape,
}

impl ShapeBuilder {
    /// Records a contract satisfied by both value and reference kinds.
    pub fn capability<C: ?Sized + 'static>(self, caster: Caster<C>) -> Self {
        self.witness(Receiver::Value, caster)
    }

    /// Records a contract satisfied only by the reference kind.
    pub fn reference_capability<C: ?Sized + 'static>(self, caster: Caster<C>) -> Self {
        self.witness(Receiver::Reference, caster)
    }

    /// Casters built for another type are dropped, so the shape never
    /// claims a contract its instances cannot be viewed through.
    fn witness<C: ?Sized + 'static>(mut self, receiver: Receiver, caster: Caster<C>) -> Self {
        let capability = Capability::of::<C>();
        if caster.target != self.shape.type_id {
            warn!(
                "event=witness_rejected module=catalog status=error type={} capability={}",
                self.shape.type_name,
                capability.name()
            );
            return self;
        }
        self.shape.witnesses.insert(
            capability.id(),
            Witness {
                capability,
                receiver,
                caster: Box::new(caster),
            },
        );
        self
    }

    pub fn build(self) -> Arc<Shape> {
        Arc::new(self.shape)
    }
}

/// Catalog entry for one discoverable type.
#[derive(Clone)]
pub struct TypeDescriptor {
    qualified_name: String,
    name: String,
    namespace: String,
    kind: TypeKind,
    shape: Arc<Shape>,
}

impl TypeDescriptor {
    /// Describes `declared_name` in `namespace`; the reference kind gets the
    /// `*` marker in both its bare and qualified names.
    pub fn new(
        namespace: impl Into<String>,
        declared_name: &str,
        kind: TypeKind,
        shape: Arc<Shape>,
    ) -> Self {
        let namespace = namespace.into();
        let name = match kind {
            TypeKind::Value => declared_name.to_string(),
            TypeKind::Reference => format!("*{declared_name}"),
        };
        let qualified_name = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{namespace}.{name}")
        };
        Self {
            qualified_name,
            name,
            namespace,
            kind,
            shape,
        }
    }

    /// Value and reference descriptors of one declared type.
    pub fn pair(namespace: &str, declared_name: &str, shape: Arc<Shape>) -> (Self, Self) {
        let value = Self::new(namespace, declared_name, TypeKind::Value, Arc::clone(&shape));
        let reference = Self::new(namespace, declared_name, TypeKind::Reference, shape);
        (value, reference)
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bare name without the reference marker.
    pub fn declared_name(&self) -> &str {
        self.name.trim_start_matches('*')
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_reference(&self) -> bool {
        self.kind == TypeKind::Reference
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn satisfies(&self, capability: Capability) -> bool {
        self.shape.satisfies(capability, self.kind)
    }

    pub fn satisfies_contract<C: ?Sized + 'static>(&self) -> bool {
        self.satisfies(Capability::of::<C>())
    }

    /// Serializable snapshot for listings.
    pub fn info(&self) -> DescriptorInfo {
        DescriptorInfo {
            qualified_name: self.qualified_name.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            kind: self.kind,
            rust_type: self.shape.type_name().to_string(),
            capabilities: self
                .shape
                .capabilities(self.kind)
                .into_iter()
                .map(|capability| capability.name().to_string())
                .collect(),
        }
    }
}

/// Descriptors are equal when they name the same kind of the same type.
impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
            && self.namespace == other.namespace
            && self.kind == other.kind
            && self.shape.type_id == other.shape.type_id
    }
}

impl Eq for TypeDescriptor {}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("qualified_name", &self.qualified_name)
            .field("namespace", &self.namespace)
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .finish()
    }
}

/// Wire form of a descriptor used by listings and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorInfo {
    pub qualified_name: String,
    pub name: String,
    pub namespace: String,
    pub kind: TypeKind,
    pub rust_type: String,
    /// Contracts satisfied by this kind, sorted.
    pub capabilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{Shape, TypeDescriptor, TypeKind};
    use crate::catalog::capability::Capability;
    use std::any::TypeId;

    #[derive(Default)]
    struct Widget;

    #[test]
    fn type_key_is_the_described_type() {
        let shape = Shape::of::<Widget>().build();
        assert_eq!(shape.type_key(), TypeId::of::<Widget>());
        assert!(shape.is::<Widget>());
    }

    #[test]
    fn pair_marks_reference_names() {
        let (value, reference) =
            TypeDescriptor::pair("shapes", "Widget", Shape::of::<Widget>().build());

        assert_eq!(value.qualified_name(), "shapes.Widget");
        assert_eq!(value.name(), "Widget");
        assert_eq!(reference.qualified_name(), "shapes.*Widget");
        assert_eq!(reference.name(), "*Widget");
        assert_eq!(reference.declared_name(), "Widget");
        assert_eq!(value.namespace(), reference.namespace());
        assert_ne!(value, reference);
    }

    #[test]
    fn empty_namespace_uses_bare_name() {
        let descriptor =
            TypeDescriptor::new("", "Widget", TypeKind::Value, Shape::of::<Widget>().build());
        assert_eq!(descriptor.qualified_name(), "Widget");
    }

    #[test]
    fn zero_value_rejects_mismatched_constructor() {
        fn wrong_zero() -> super::BoxedValue {
            Box::new(0_u8)
        }
        let shape = Shape::from_parts(TypeId::of::<Widget>(), "Widget", wrong_zero).build();
        let err = shape.zero_value().expect_err("mismatched zero must fail");
        assert!(err.contains("Widget"));
    }

    #[test]
    fn casters_for_other_types_are_not_witnesses() {
        trait Labelled {
            fn label(&self) -> &str;
        }

        #[derive(Default)]
        struct Sprocket;

        impl Labelled for Sprocket {
            fn label(&self) -> &str {
                "sprocket"
            }
        }

        let labelled = Capability::of::<dyn Labelled>();
        let shape = Shape::of::<Widget>()
            .capability(crate::caster!(Sprocket => dyn Labelled))
            .build();
        assert!(!shape.satisfies(labelled, TypeKind::Value));
        assert!(shape.receiver(labelled).is_none());
        assert!(shape.caster::<dyn Labelled>(TypeKind::Reference).is_none());

        let own = Shape::of::<Sprocket>()
            .capability(crate::caster!(Sprocket => dyn Labelled))
            .build();
        assert!(own.satisfies(labelled, TypeKind::Value));
    }

    #[test]
    fn info_reports_kind_and_rust_type() {
        let descriptor = TypeDescriptor::new(
            "shapes",
            "Widget",
            TypeKind::Reference,
            Shape::of::<Widget>().build(),
        );
        let info = descriptor.info();
        assert_eq!(info.kind, TypeKind::Reference);
        assert!(info.rust_type.ends_with("Widget"));
        assert!(info.capabilities.is_empty());
    }
}
