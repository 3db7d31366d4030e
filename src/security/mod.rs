//! Path containment for untrusted settings locations.

pub mod path_resolver;

pub use path_resolver::{MAX_CACHE_KEY_LEN, SecurePathResolver, normalize_lexically};
