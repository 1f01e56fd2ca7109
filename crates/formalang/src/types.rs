//! Utility types.

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion-ordered map. Iteration order is part of the contract: rule
/// enumeration and table layouts must be reproducible across runs.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

/// Insertion-ordered set.
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
