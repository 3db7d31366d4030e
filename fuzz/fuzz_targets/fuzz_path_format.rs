#![no_main]

use libfuzzer_sys::fuzz_target;
use sguard::config::validate_path_format;
use sguard::security::SecurePathResolver;

fuzz_target!(|data: &[u8]| {
    if let Ok(path) = std::str::from_utf8(data) {
        let _ = validate_path_format(path, 1024);
        let base = std::env::temp_dir().join("sguard-fuzz").join("rules.json");
        if let Ok(resolved) = SecurePathResolver::new(64, 100).resolve(path, &base) {
            assert!(path.is_empty() || resolved.starts_with(base.parent().unwrap_or(&base)));
        }
    }
});
