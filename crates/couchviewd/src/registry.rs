//! Session-scoped store of map function sources.

/// Ordered list of map function sources added with `add_fun`.
///
/// Sources are kept in registration order because `map_doc` replies with one
/// entry per function in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionRegistry {
    sources: Vec<String>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Appends a source. Duplicates are kept.
    pub fn add(&mut self, source: String) {
        self.sources.push(source);
    }

    /// Removes every stored source.
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Returns the stored sources in registration order.
    #[must_use]
    pub const fn sources(&self) -> &[String] {
        self.sources.as_slice()
    }

    /// Returns the number of stored sources.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true when no sources are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
