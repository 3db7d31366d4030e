mod common;

use proptest::prelude::*;
use serde_json::{Value, json};

use common::{Fixture, standard_rules};
use sguard::config::{ConfigError, DocumentLoader, LoaderOptions, SecurityLimits, YamlLoader};
use sguard::validators::ConfigValue;
use sguard::{ConfigLoader, SGuardError};

#[test]
fn json_and_yaml_rule_sets_are_equivalent() {
    let fixture = Fixture::new();
    let rules = standard_rules();
    let json_path = fixture.write_json("rules.json", &rules);
    let yaml_path = fixture.write("rules.yaml", &serde_yaml::to_string(&rules).unwrap());

    let loader = ConfigLoader::default();
    assert_eq!(
        loader.load_rule_set(&json_path).unwrap(),
        loader.load_rule_set(&yaml_path).unwrap()
    );
}

#[test]
fn settings_keys_are_colon_separated_and_arrays_kept_whole() {
    let fixture = Fixture::new();
    let path = fixture.write_json(
        "appsettings.json",
        &json!({
            "ConnectionStrings": {"Main": "Server=db;Database=app"},
            "AllowedHosts": ["a.example", "b.example"],
            "Features": {"Beta": false, "Ratio": 0.25, "Empty": {}},
            "Nothing": null
        }),
    );

    let settings = ConfigLoader::default().load_settings(&path).unwrap();
    let keys: Vec<&str> = settings.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "ConnectionStrings:Main",
            "AllowedHosts",
            "Features:Beta",
            "Features:Ratio",
            "Nothing"
        ]
    );
    assert_eq!(
        settings.get("AllowedHosts").and_then(ConfigValue::to_text).as_deref(),
        Some(r#"["a.example","b.example"]"#)
    );
    assert_eq!(settings.get("Features.Beta"), Some(&ConfigValue::Bool(false)));
    assert_eq!(settings.get("Nothing"), Some(&ConfigValue::Null));
}

#[test]
fn oversized_settings_are_rejected_before_parsing() {
    let fixture = Fixture::new();
    let path = fixture.write("big.json", &format!("{{\"a\": \"{}\"}}", "x".repeat(2048)));
    let loader = ConfigLoader::new(LoaderOptions {
        limits: SecurityLimits {
            max_file_size_bytes: 1024,
            ..SecurityLimits::default()
        },
        ..LoaderOptions::default()
    });
    let err = loader.load_settings(&path).unwrap_err();
    assert!(matches!(
        err,
        SGuardError::Config(ConfigError::FileTooLarge { limit: 1024, .. })
    ));
    assert!(err.to_string().contains("exceeding the maximum of 1024 bytes"));
}

#[test]
fn trailing_content_is_a_parse_error_when_streaming() {
    let fixture = Fixture::new();
    let path = fixture.write("settings.json", "{\"a\": 1} {\"b\": 2}");
    let loader = ConfigLoader::new(LoaderOptions {
        limits: SecurityLimits {
            streaming_threshold_bytes: 0,
            ..SecurityLimits::default()
        },
        ..LoaderOptions::default()
    });
    assert!(matches!(
        loader.load_settings(&path).unwrap_err(),
        SGuardError::Config(ConfigError::Parse { .. })
    ));
}

#[test]
fn yaml_loader_rejects_blank_settings() {
    let fixture = Fixture::new();
    let path = fixture.write("settings.yaml", "\n\n");
    let err = YamlLoader::new(LoaderOptions::default())
        .load_settings(&path)
        .unwrap_err();
    assert!(matches!(err, SGuardError::Config(ConfigError::Empty { .. })));
}

fn arb_settings() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    let tree = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[A-Za-z][A-Za-z0-9]{0,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    });
    prop::collection::btree_map("[A-Za-z][A-Za-z0-9]{0,6}", tree, 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn json_and_yaml_settings_flatten_identically(document in arb_settings()) {
        let fixture = Fixture::new();
        let json_path = fixture.write_json("settings.json", &document);
        let yaml_path = fixture.write("settings.yaml", &serde_yaml::to_string(&document).unwrap());

        let loader = ConfigLoader::default();
        let from_json = loader.load_settings(&json_path).unwrap();
        let from_yaml = loader.load_settings(&yaml_path).unwrap();
        prop_assert_eq!(from_json, from_yaml);
    }
}
