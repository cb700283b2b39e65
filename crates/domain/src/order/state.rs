//! Order lifecycle.

use serde::{Deserialize, Serialize};

use super::Order;

/// The status of an order in its lifecycle.
///
/// Any status can be written by a whole-order update. Only archiving is
/// guarded:
/// ```text
/// Pending ──┬──► Cancelled
/// Paid ─────┘
///
/// Served, Collected, Cancelled ──✗ (archive conflicts)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order has been placed.
    #[default]
    Pending,

    /// Order has been paid for.
    Paid,

    /// Drinks have been handed over the counter.
    Served,

    /// Customer has collected the order.
    Collected,

    /// Order was archived.
    Cancelled,
}

impl OrderStatus {
    /// Every status the catalog is seeded with.
    pub const ALL: &'static [OrderStatus] = &[
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Served,
        OrderStatus::Collected,
        OrderStatus::Cancelled,
    ];

    /// Returns the catalog name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Served => "served",
            OrderStatus::Collected => "collected",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a catalog name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.as_str() == name)
    }

    /// Returns true if the order can be archived from this status.
    pub fn is_archivable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Archive guard over a catalog status name.
///
/// Names outside the fixed enumeration (a catalog may carry more) are
/// archivable; only served, collected and cancelled block it.
pub fn can_archive(status_name: &str) -> bool {
    OrderStatus::parse(status_name).is_none_or(|status| status.is_archivable())
}

/// Result of archiving an order.
///
/// Keeps "not found" apart from "found but not archivable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The order is now cancelled.
    Archived(Order),
    /// The order exists but its status blocks archiving.
    Conflict { status: String },
    /// No order with that id.
    NotFound,
}

impl ArchiveOutcome {
    pub fn is_archived(&self) -> bool {
        matches!(self, ArchiveOutcome::Archived(_))
    }
}
