/// Offset/limit window over the order collection.
///
/// Orders are paged in creation order, ties broken by ID, so a page
/// boundary never moves when existing orders are updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    /// Number of orders to skip.
    pub offset: usize,

    /// Maximum number of orders to return. `None` returns everything.
    pub limit: Option<usize>,
}

impl Page {
    /// Creates a page window.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// The whole collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// The first `limit` orders.
    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    /// Applies the window to an iterator already in page order.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => skipped.take(limit).collect(),
            None => skipped.collect(),
        }
    }
}
