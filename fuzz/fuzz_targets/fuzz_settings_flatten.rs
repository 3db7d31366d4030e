#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use sguard::config::KEY_SEPARATOR;
use sguard::config::flatten::{flatten_json_reader, flatten_value};

// A literal `a:b` key and a nested `a.b` share one flat key, so the two paths
// may disagree on which write came last.
fn has_separator_key(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(key, child)| key.contains(KEY_SEPARATOR) || has_separator_key(child)),
        _ => false,
    }
}

fuzz_target!(|data: &[u8]| {
    let streamed = flatten_json_reader(data);
    let parsed = serde_json::from_slice::<Value>(data);
    if let (Ok(streamed), Ok(parsed)) = (streamed, parsed) {
        if !has_separator_key(&parsed) {
            assert_eq!(streamed, flatten_value(&parsed));
        }
    }
});
