#![no_main]

use libfuzzer_sys::fuzz_target;
use sguard::config::{ConfigLoader, DocumentLoader, YamlLoader};
use sguard::LoaderOptions;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Loading may fail; it must not panic.
        let _ = ConfigLoader::with_defaults().load_rule_set_from_str(text);
        let _ = YamlLoader::new(LoaderOptions::default()).load_rule_set_from_str(text);
    }
});
