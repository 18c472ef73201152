//! Marker contracts consumed by dispatch layers.
//!
//! `Request` and `Notification` carry no logic; they tag payload types so a
//! dispatcher can filter the catalog. The base types are only discoverable
//! as contracts through their reference kind.

use crate::catalog::capability::Capability;

/// Namespace of the built-in contract base types.
pub const CONTRACTS_NAMESPACE: &str = "contracts";

pub trait Request {
    fn is_request(&self) -> bool;
}

pub trait Notification {
    fn is_notification(&self) -> bool;
}

/// Minimal request payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BaseRequest;

impl Request for BaseRequest {
    fn is_request(&self) -> bool {
        true
    }
}

/// Minimal notification payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BaseNotification;

impl Notification for BaseNotification {
    fn is_notification(&self) -> bool {
        true
    }
}

crate::register_type!(BaseRequest in CONTRACTS_NAMESPACE, reference_capabilities: [dyn Request]);
crate::register_type!(
    BaseNotification in CONTRACTS_NAMESPACE,
    reference_capabilities: [dyn Notification],
);

pub fn request_capability() -> Capability {
    Capability::of::<dyn Request>()
}

pub fn notification_capability() -> Capability {
    Capability::of::<dyn Notification>()
}
