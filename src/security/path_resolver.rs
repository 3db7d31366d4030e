//! Settings path resolution with containment checks.
//!
//! Environment settings paths come from rule set files and are therefore
//! untrusted. [`SecurePathResolver`] resolves them against the rule set's
//! directory and refuses anything that lands outside of it, including paths
//! that only escape through a symbolic link.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::config::loader::SecurityLimits;
use crate::error::{Result, SGuardError};

/// Cache keys longer than this are not cached.
pub const MAX_CACHE_KEY_LEN: usize = 4096;

/// Share of entries removed by one eviction pass, in percent.
const EVICTION_PERCENT: usize = 30;

#[derive(Debug)]
struct CacheEntry {
    resolved: PathBuf,
    base_dir: PathBuf,
    last_access: AtomicU64,
}

/// Resolves settings paths relative to a base file and caches the results.
///
/// The cache is owned by the resolver. Lookups, inserts and evictions are
/// safe to run from many threads at once without external locking.
#[derive(Debug)]
pub struct SecurePathResolver {
    cache: DashMap<String, CacheEntry>,
    max_entries: usize,
    eviction_threshold_percent: usize,
    clock: AtomicU64,
}

impl SecurePathResolver {
    /// Creates a resolver whose cache holds at most `max_entries` entries
    /// once an eviction pass has run. Eviction starts when the cache grows
    /// past `max_entries * eviction_threshold_percent / 100`.
    #[must_use]
    pub fn new(max_entries: usize, eviction_threshold_percent: usize) -> Self {
        Self {
            cache: DashMap::new(),
            max_entries,
            eviction_threshold_percent: eviction_threshold_percent.max(1),
            clock: AtomicU64::new(0),
        }
    }

    /// Creates a resolver sized from the security limits.
    #[must_use]
    pub fn from_limits(limits: &SecurityLimits) -> Self {
        Self::new(
            limits.max_path_cache_size,
            limits.path_cache_eviction_threshold_percent,
        )
    }

    /// Resolves `path` against the directory containing `base_path`.
    ///
    /// An empty `path` is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SGuardError::UnauthorizedAccess`] if the resolved path, or
    /// the target of a symbolic link at that path, lies outside the base
    /// directory.
    pub fn resolve(&self, path: &str, base_path: &Path) -> Result<PathBuf> {
        if path.is_empty() {
            return Ok(PathBuf::new());
        }

        let key = cache_key(path, base_path);
        if let Some(key) = &key {
            if let Some(entry) = self.cache.get(key) {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                trace!(path, resolved = %entry.resolved.display(), "path cache hit");
                verify_link_containment(&entry.resolved, &entry.base_dir)?;
                return Ok(entry.resolved.clone());
            }
        }

        let (resolved, base_dir) = resolve_contained(path, base_path)?;
        verify_link_containment(&resolved, &base_dir)?;

        if let Some(key) = key {
            if self.max_entries > 0 {
                self.cache.insert(
                    key,
                    CacheEntry {
                        resolved: resolved.clone(),
                        base_dir,
                        last_access: AtomicU64::new(self.tick()),
                    },
                );
                self.evict_if_needed();
            }
        }

        debug!(path, resolved = %resolved.display(), "resolved settings path");
        Ok(resolved)
    }

    /// Number of cached resolutions.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Removes the least recently used entries once the threshold is passed.
    ///
    /// Works on a snapshot: entries inserted while the sweep runs survive it
    /// and are handled by the next pass.
    fn evict_if_needed(&self) {
        let threshold = self
            .max_entries
            .saturating_mul(self.eviction_threshold_percent)
            / 100;
        if self.cache.len() <= threshold {
            return;
        }

        let mut snapshot: Vec<(String, u64)> = self
            .cache
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().last_access.load(Ordering::Relaxed),
                )
            })
            .collect();
        snapshot.sort_unstable_by_key(|(_, last_access)| *last_access);

        let len = snapshot.len();
        let to_remove = (len * EVICTION_PERCENT)
            .div_ceil(100)
            .max(len.saturating_sub(self.max_entries))
            .min(len);

        for (key, _) in snapshot.into_iter().take(to_remove) {
            self.cache.remove(&key);
        }
        debug!(
            removed = to_remove,
            remaining = self.cache.len(),
            "evicted path cache entries"
        );
    }
}

impl Default for SecurePathResolver {
    fn default() -> Self {
        Self::from_limits(&SecurityLimits::default())
    }
}

/// Resolves `path` lexically and checks it stays under `base_path`'s
/// directory. Returns the resolved path and that directory.
fn resolve_contained(path: &str, base_path: &Path) -> Result<(PathBuf, PathBuf)> {
    let base_file = normalize_lexically(base_path)?;
    let base_dir = base_file
        .parent()
        .map_or_else(|| base_file.clone(), Path::to_path_buf);

    let candidate = Path::new(path);
    let resolved = if candidate.is_absolute() {
        normalize_lexically(candidate)?
    } else {
        normalize_lexically(&base_dir.join(candidate))?
    };

    if !resolved.starts_with(&base_dir) {
        warn!(
            path,
            resolved = %resolved.display(),
            base = %base_dir.display(),
            "rejected settings path outside of base directory"
        );
        return Err(SGuardError::UnauthorizedAccess {
            path: resolved,
            base: base_dir,
        });
    }

    Ok((resolved, base_dir))
}

/// Re-checks containment through the filesystem when `resolved` exists, so
/// a symbolic link pointing outside `base_dir` is rejected.
fn verify_link_containment(resolved: &Path, base_dir: &Path) -> Result<()> {
    let Ok(metadata) = fs::symlink_metadata(resolved) else {
        return Ok(());
    };

    let real = match fs::canonicalize(resolved) {
        Ok(real) => real,
        Err(_) if metadata.file_type().is_symlink() => {
            // Dangling link: judge it by where it points.
            let target = fs::read_link(resolved).map_err(|e| SGuardError::io(resolved, e))?;
            let parent = resolved.parent().unwrap_or(base_dir);
            normalize_lexically(&parent.join(target))?
        }
        Err(e) => return Err(SGuardError::io(resolved, e)),
    };
    let real_base = fs::canonicalize(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());

    if !real.starts_with(&real_base) {
        warn!(
            resolved = %resolved.display(),
            target = %real.display(),
            base = %real_base.display(),
            "rejected symbolic link escaping base directory"
        );
        return Err(SGuardError::UnauthorizedAccess {
            path: real,
            base: real_base,
        });
    }
    Ok(())
}

/// Makes `path` absolute and collapses `.` and `..` without touching the
/// filesystem. `..` never climbs above the root.
///
/// # Errors
///
/// Returns an I/O error if `path` is relative and the working directory
/// cannot be determined.
pub fn normalize_lexically(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SGuardError::io(path, e))?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    Ok(normalized)
}

/// Builds the cache key for a `(path, base)` pair.
///
/// Control characters and backslashes are escaped so distinct inputs never
/// share a key; the path length prefix keeps the pair unambiguous. Returns
/// `None` when the key would exceed [`MAX_CACHE_KEY_LEN`].
fn cache_key(path: &str, base_path: &Path) -> Option<String> {
    let path = sanitize(path);
    let base = sanitize(&base_path.to_string_lossy());
    let key = format!("{}:{path}|{base}", path.len());
    (key.len() <= MAX_CACHE_KEY_LEN).then_some(key)
}

fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c == '\\' {
            out.push_str("\\\\");
        } else if c.is_control() {
            out.extend(c.escape_unicode());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_resolves_under_base_dir() {
        let resolver = SecurePathResolver::new(10, 100);
        let resolved = resolver
            .resolve("sub/x.json", Path::new("/a/b/base.json"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/a/b/sub/x.json"));
    }

    #[test]
    fn test_empty_path_is_returned_unchanged() {
        let resolver = SecurePathResolver::new(10, 100);
        let resolved = resolver.resolve("", Path::new("/a/b/base.json")).unwrap();
        assert_eq!(resolved, PathBuf::new());
        assert_eq!(resolver.cache_len(), 0);
    }

    #[test]
    fn test_traversal_is_rejected() {
        let resolver = SecurePathResolver::new(10, 100);
        let err = resolver
            .resolve("../../../etc/passwd", Path::new("/a/b/base.json"))
            .unwrap_err();
        assert!(matches!(err, SGuardError::UnauthorizedAccess { .. }));
    }

    #[test]
    fn test_absolute_path_outside_base_is_rejected() {
        let resolver = SecurePathResolver::new(10, 100);
        let err = resolver
            .resolve("/etc/passwd", Path::new("/a/b/base.json"))
            .unwrap_err();
        assert!(matches!(err, SGuardError::UnauthorizedAccess { .. }));
    }

    #[test]
    fn test_absolute_path_inside_base_is_accepted() {
        let resolver = SecurePathResolver::new(10, 100);
        let resolved = resolver
            .resolve("/a/b/./c/../settings.json", Path::new("/a/b/base.json"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/a/b/settings.json"));
    }

    #[test]
    fn test_sibling_prefix_is_not_containment() {
        let resolver = SecurePathResolver::new(10, 100);
        let err = resolver
            .resolve("/a/bc/x.json", Path::new("/a/b/base.json"))
            .unwrap_err();
        assert!(matches!(err, SGuardError::UnauthorizedAccess { .. }));
    }

    #[test]
    fn test_resolution_is_idempotent_and_cached() {
        let resolver = SecurePathResolver::new(10, 100);
        let first = resolver.resolve("x.json", Path::new("/a/b/base.json")).unwrap();
        let second = resolver.resolve("x.json", Path::new("/a/b/base.json")).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.cache_len(), 1);
    }

    #[test]
    fn test_cache_never_exceeds_capacity() {
        let resolver = SecurePathResolver::new(8, 100);
        for i in 0..50 {
            resolver
                .resolve(&format!("file{i}.json"), Path::new("/a/b/base.json"))
                .unwrap();
            assert!(resolver.cache_len() <= 8);
        }
    }

    #[test]
    fn test_recently_used_entries_survive_eviction() {
        let resolver = SecurePathResolver::new(4, 100);
        let base = Path::new("/a/b/base.json");
        for i in 0..4 {
            resolver.resolve(&format!("f{i}.json"), base).unwrap();
        }
        // Touch f0 so it becomes most recently used.
        resolver.resolve("f0.json", base).unwrap();
        resolver.resolve("f4.json", base).unwrap();

        let key = cache_key("f0.json", base).unwrap();
        assert!(resolver.cache.contains_key(&key));
        let evicted = cache_key("f1.json", base).unwrap();
        assert!(!resolver.cache.contains_key(&evicted));
    }

    #[test]
    fn test_cache_key_escapes_control_characters() {
        let plain = cache_key("ab", Path::new("/x")).unwrap();
        let control = cache_key("a\u{1}b", Path::new("/x")).unwrap();
        assert_ne!(plain, control);
        assert!(!control.chars().any(char::is_control));
    }

    #[test]
    fn test_oversized_key_bypasses_cache() {
        let resolver = SecurePathResolver::new(10, 100);
        let long = "d/".repeat(MAX_CACHE_KEY_LEN) + "x.json";
        resolver.resolve(&long, Path::new("/a/b/base.json")).unwrap();
        assert_eq!(resolver.cache_len(), 0);
    }

    #[test]
    fn test_normalize_lexically_does_not_climb_past_root() {
        let normalized = normalize_lexically(Path::new("/../../etc")).unwrap();
        assert_eq!(normalized, PathBuf::from("/etc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.json");
        fs::write(&secret, "{}").unwrap();

        let base_dir = tempfile::tempdir().unwrap();
        let link = base_dir.path().join("settings.json");
        std::os::unix::fs::symlink(&secret, &link).unwrap();

        let resolver = SecurePathResolver::new(10, 100);
        let err = resolver
            .resolve("settings.json", &base_dir.path().join("rules.json"))
            .unwrap_err();
        assert!(matches!(err, SGuardError::UnauthorizedAccess { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_base_is_accepted() {
        let base_dir = tempfile::tempdir().unwrap();
        let real = base_dir.path().join("real.json");
        fs::write(&real, "{}").unwrap();
        let link = base_dir.path().join("settings.json");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let resolver = SecurePathResolver::new(10, 100);
        let resolved = resolver
            .resolve("settings.json", &base_dir.path().join("rules.json"))
            .unwrap();
        assert!(resolved.ends_with("settings.json"));
    }
}
