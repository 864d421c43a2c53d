/// Default log filter expression used by the server.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default number of compiled user functions kept by the evaluator.
pub const DEFAULT_FUNCTION_CACHE_CAPACITY: usize = 128;

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the server.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default capacity of the compiled function cache.
#[must_use]
pub const fn default_function_cache_capacity() -> usize {
    DEFAULT_FUNCTION_CACHE_CAPACITY
}
