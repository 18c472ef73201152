//! Runtime type catalog.
//! Discoverable types register once; callers look them up by name, namespace
//! or capability and instantiate them without naming the concrete type.

pub mod catalog;
pub mod config;
pub mod contracts;
pub mod error;
pub mod logging;

#[doc(hidden)]
pub use inventory;

pub use catalog::bootstrap::{bootstrap, catalog, TypeRegistration};
pub use catalog::capability::{filter_by_capability, Capability, Caster, Receiver};
pub use catalog::descriptor::{
    BoxedValue, DescriptorInfo, Shape, ShapeBuilder, TypeDescriptor, TypeKind,
};
pub use catalog::instance::Instance;
pub use catalog::registry::Registry;
pub use config::LoggingConfig;
pub use contracts::{
    notification_capability, request_capability, BaseNotification, BaseRequest, Notification,
    Request,
};
pub use error::{CatalogError, CatalogResult};
pub use logging::{default_log_level, init_logging, logging_status};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
