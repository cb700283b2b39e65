//! Domain layer for the order service.
//!
//! This crate provides:
//! - Catalog seed values and name resolution for line items
//! - The order aggregate and its archive guard
//! - The order repository with optimistic, fingerprint-guarded writes
//! - Fingerprints and validators for conditional requests

pub mod catalog;
pub mod clock;
pub mod conditional;
pub mod error;
pub mod order;

pub use catalog::{ConsumeLocation, EspressoShot, Milk, Product, Size, seed_catalog, seed_entries};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use conditional::{EntityTag, Fingerprint, ReadDecision, Validator, precondition_holds};
pub use error::DomainError;
pub use order::{
    ArchiveOrder, ArchiveOutcome, CreateOrder, LineItem, LineItemRequest, LineItemResolver, Money,
    MAX_QUANTITY, Order, OrderError, OrderRepository, OrderStatus, PriceList, ResolvedItem,
    ResolvedOrder, UpdateOrder, can_archive,
};
