//! Limits shared by the serializer and the configuration loader.

/// Maximum array/object nesting accepted in a decision payload when none is
/// configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;
