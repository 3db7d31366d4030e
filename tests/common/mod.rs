//! Shared integration-test fixtures: a temporary directory holding a rule
//! set and the settings files it points at, plus a helper to run the
//! `sguard` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

/// A rule set plus settings files in a temporary directory.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Creates an empty fixture directory.
    #[allow(clippy::missing_panics_doc)]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Root of the fixture directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `content` to `name` (relative to the root), creating parents.
    #[allow(clippy::missing_panics_doc)]
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, content).expect("failed to write fixture file");
        path
    }

    /// Writes `value` as pretty JSON to `name`.
    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &serde_json::to_string_pretty(value).expect("serializable"))
    }
}

/// Standard two-environment rule set: `dev` and `prod`, both checking the
/// log level, `prod` additionally checking the port and TLS flag.
pub fn standard_rules() -> Value {
    json!({
        "version": "1.0",
        "environments": [
            {"id": "dev", "name": "Development", "path": "settings/dev.json"},
            {"id": "prod", "name": "Production", "path": "settings/prod.json",
             "description": "Customer facing"}
        ],
        "rules": [
            {
                "id": "logging",
                "environments": ["dev", "prod"],
                "rule": {"id": "logging", "conditions": [{
                    "key": "Logging:LogLevel:Default",
                    "condition": [
                        {"validator": "required", "message": "Log level is required"},
                        {"validator": "in", "value": ["Debug", "Information", "Warning", "Error"],
                         "message": "Log level is not recognised"}
                    ]
                }]}
            },
            {
                "id": "prod-hardening",
                "environments": ["prod"],
                "rule": {"id": "prod-hardening", "conditions": [
                    {"key": "Server.Port", "condition": [
                        {"validator": "gte", "value": 1024, "message": "Port must be unprivileged"}
                    ]},
                    {"key": "Server:RequireTls", "condition": [
                        {"validator": "eq", "value": true, "message": "TLS must be required"}
                    ]}
                ]}
            }
        ]
    })
}

/// Settings that satisfy [`standard_rules`] for every environment.
pub fn valid_settings() -> Value {
    json!({
        "Logging": {"LogLevel": {"Default": "Warning"}},
        "Server": {"Port": 8443, "RequireTls": true, "Hosts": ["a.example", "b.example"]}
    })
}

/// Fixture with [`standard_rules`] at `rules.json` and valid settings for
/// both environments.
pub fn standard_fixture() -> (Fixture, PathBuf) {
    let fixture = Fixture::new();
    let rules = fixture.write_json("rules.json", &standard_rules());
    fixture.write_json("settings/dev.json", &valid_settings());
    fixture.write_json("settings/prod.json", &valid_settings());
    (fixture, rules)
}

/// Runs the `sguard` binary with `args` and waits for it.
#[allow(clippy::missing_panics_doc)]
pub fn run_sguard(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sguard"))
        .args(args)
        .env_remove("SGUARD_LOG_LEVEL")
        .env_remove("SGUARD_ENV")
        .env_remove("SGUARD_RULES")
        .output()
        .expect("failed to run sguard")
}
