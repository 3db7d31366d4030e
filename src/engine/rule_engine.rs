//! Validation orchestration across environments.
//!
//! Per environment: find it by id, resolve its settings path inside the rule
//! set's directory, load and flatten the settings, select the rules that
//! target it and hand everything to [`FileValidator`].
//!
//! Single-environment runs propagate every error. Batch runs contain
//! ordinary errors to the environment that raised them and report critical
//! errors (see [`SGuardError::is_critical`]) once every environment has been
//! processed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::flatten::FlattenedSettings;
use crate::config::loader::{ConfigLoader, DocumentLoader, LoaderOptions};
use crate::config::schema::{Environment, RuleSet};
use crate::engine::file_validator::FileValidator;
use crate::engine::result::{FileValidationResult, RuleEngineResult};
use crate::error::{Result, SGuardError};
use crate::security::SecurePathResolver;
use crate::validators::ValidatorRegistry;

/// Where an environment's settings come from.
#[derive(Clone, Copy)]
enum SettingsSource<'a> {
    /// Resolve each environment path against this rule set file.
    RuleSetFile(&'a Path),
    /// No settings files exist; every environment sees an empty map.
    Empty,
}

/// Validates environments of a rule set.
///
/// Cheap to clone; clones share the loader, path cache and registry.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    loader: Arc<dyn DocumentLoader>,
    resolver: Arc<SecurePathResolver>,
    validator: FileValidator,
}

impl RuleEngine {
    /// Creates an engine with the built-in validators and a [`ConfigLoader`].
    #[must_use]
    pub fn new(options: LoaderOptions) -> Self {
        let registry = Arc::new(ValidatorRegistry::builtin());
        let resolver = Arc::new(SecurePathResolver::from_limits(&options.limits));
        let loader = ConfigLoader::new(options).with_known_validators(registry.known_names());
        Self::with_components(Arc::new(loader), resolver, registry)
    }

    /// Creates an engine from explicit collaborators.
    #[must_use]
    pub fn with_components(
        loader: Arc<dyn DocumentLoader>,
        resolver: Arc<SecurePathResolver>,
        registry: Arc<ValidatorRegistry>,
    ) -> Self {
        Self {
            loader,
            resolver,
            validator: FileValidator::new(registry),
        }
    }

    /// Path resolver shared by this engine.
    #[must_use]
    pub fn resolver(&self) -> &SecurePathResolver {
        &self.resolver
    }

    // ========================================================================
    // Blocking Entry Points
    // ========================================================================

    /// Validates one environment of the rule set stored at `rule_set_path`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while loading the rule set, resolving or
    /// loading the settings, or validating, including
    /// [`SGuardError::EnvironmentNotFound`] for an unknown `environment_id`.
    pub fn validate_environment(
        &self,
        rule_set_path: &Path,
        environment_id: &str,
    ) -> Result<RuleEngineResult> {
        require_non_empty("environment_id", environment_id)?;
        let rule_set = self.load_rule_set(rule_set_path)?;
        let file = self.validate_one(
            &rule_set,
            environment_id,
            SettingsSource::RuleSetFile(rule_set_path),
        )?;
        Ok(RuleEngineResult::single(file))
    }

    /// Validates every environment of the rule set stored at
    /// `rule_set_path`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule set cannot be loaded, or the critical
    /// error(s) raised while validating environments.
    pub fn validate_all_environments(&self, rule_set_path: &Path) -> Result<RuleEngineResult> {
        let rule_set = self.load_rule_set(rule_set_path)?;
        self.run_batch(&rule_set, SettingsSource::RuleSetFile(rule_set_path), None)
    }

    /// Validates one environment of a rule set given as JSON text. Settings
    /// are empty.
    ///
    /// # Errors
    ///
    /// Same as [`RuleEngine::validate_environment`], minus file errors.
    pub fn validate_environment_from_json(
        &self,
        rule_set_json: &str,
        environment_id: &str,
    ) -> Result<RuleEngineResult> {
        require_non_empty("environment_id", environment_id)?;
        let rule_set = self.loader.load_rule_set_from_str(rule_set_json)?;
        let file = self.validate_one(&rule_set, environment_id, SettingsSource::Empty)?;
        Ok(RuleEngineResult::single(file))
    }

    /// Validates every environment of a rule set given as JSON text.
    /// Settings are empty.
    ///
    /// # Errors
    ///
    /// Same as [`RuleEngine::validate_all_environments`].
    pub fn validate_all_environments_from_json(
        &self,
        rule_set_json: &str,
    ) -> Result<RuleEngineResult> {
        let rule_set = self.loader.load_rule_set_from_str(rule_set_json)?;
        self.run_batch(&rule_set, SettingsSource::Empty, None)
    }

    // ========================================================================
    // Async Entry Points
    // ========================================================================

    /// [`RuleEngine::validate_environment`] on Tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Same as the blocking variant.
    pub async fn validate_environment_async(
        &self,
        rule_set_path: impl Into<PathBuf>,
        environment_id: impl Into<String>,
    ) -> Result<RuleEngineResult> {
        let engine = self.clone();
        let path = rule_set_path.into();
        let environment_id = environment_id.into();
        run_blocking(move || engine.validate_environment(&path, &environment_id)).await
    }

    /// [`RuleEngine::validate_all_environments`] on Tokio's blocking pool.
    ///
    /// `cancel` is checked before each environment.
    ///
    /// # Errors
    ///
    /// Same as the blocking variant, plus [`SGuardError::Cancelled`].
    pub async fn validate_all_environments_async(
        &self,
        rule_set_path: impl Into<PathBuf>,
        cancel: Option<CancellationToken>,
    ) -> Result<RuleEngineResult> {
        let engine = self.clone();
        let path = rule_set_path.into();
        run_blocking(move || {
            let rule_set = engine.load_rule_set(&path)?;
            engine.run_batch(&rule_set, SettingsSource::RuleSetFile(&path), cancel.as_ref())
        })
        .await
    }

    /// [`RuleEngine::validate_environment_from_json`] on Tokio's blocking
    /// pool.
    ///
    /// # Errors
    ///
    /// Same as the blocking variant.
    pub async fn validate_environment_from_json_async(
        &self,
        rule_set_json: impl Into<String>,
        environment_id: impl Into<String>,
    ) -> Result<RuleEngineResult> {
        let engine = self.clone();
        let json = rule_set_json.into();
        let environment_id = environment_id.into();
        run_blocking(move || engine.validate_environment_from_json(&json, &environment_id)).await
    }

    /// [`RuleEngine::validate_all_environments_from_json`] on Tokio's
    /// blocking pool.
    ///
    /// # Errors
    ///
    /// Same as the blocking variant, plus [`SGuardError::Cancelled`].
    pub async fn validate_all_environments_from_json_async(
        &self,
        rule_set_json: impl Into<String>,
        cancel: Option<CancellationToken>,
    ) -> Result<RuleEngineResult> {
        let engine = self.clone();
        let json = rule_set_json.into();
        run_blocking(move || {
            let rule_set = engine.loader.load_rule_set_from_str(&json)?;
            engine.run_batch(&rule_set, SettingsSource::Empty, cancel.as_ref())
        })
        .await
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    fn load_rule_set(&self, rule_set_path: &Path) -> Result<RuleSet> {
        if rule_set_path.as_os_str().is_empty() {
            return Err(SGuardError::invalid_argument(
                "rule_set_path",
                "rule set path must not be empty",
            ));
        }
        self.loader.load_rule_set(rule_set_path)
    }

    fn validate_one(
        &self,
        rule_set: &RuleSet,
        environment_id: &str,
        source: SettingsSource<'_>,
    ) -> Result<FileValidationResult> {
        let environment =
            rule_set
                .environment(environment_id)
                .ok_or_else(|| SGuardError::EnvironmentNotFound {
                    id: environment_id.to_string(),
                    available: rule_set.environment_ids(),
                })?;
        self.validate_entry(rule_set, environment, source)
    }

    /// Validates `environment`, an entry of `rule_set`, without looking it
    /// up again by id.
    fn validate_entry(
        &self,
        rule_set: &RuleSet,
        environment: &Environment,
        source: SettingsSource<'_>,
    ) -> Result<FileValidationResult> {
        let (file_id, settings) = match source {
            SettingsSource::RuleSetFile(rule_set_path) => {
                if environment.path.trim().is_empty() {
                    return Err(SGuardError::invalid_argument(
                        "environment.path",
                        format!("environment '{}' has no settings path", environment.id),
                    ));
                }
                let resolved = self.resolver.resolve(&environment.path, rule_set_path)?;
                let settings = self.loader.load_settings(&resolved)?;
                (resolved.display().to_string(), settings)
            }
            SettingsSource::Empty => (environment.path.clone(), FlattenedSettings::new()),
        };
        let file_id = if file_id.trim().is_empty() {
            environment.id.clone()
        } else {
            file_id
        };

        let rules = rule_set.rules_for(&environment.id);
        debug!(
            environment = %environment.id,
            rules = rules.len(),
            keys = settings.len(),
            "validating environment"
        );
        let mut file = self.validator.validate_file(&file_id, &rules, &settings)?;
        file.environment = Some(environment.id.clone());
        Ok(file)
    }

    fn run_batch(
        &self,
        rule_set: &RuleSet,
        source: SettingsSource<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RuleEngineResult> {
        let total = rule_set.environments.len();
        let mut files = Vec::with_capacity(total);
        let mut errors = Vec::new();
        let mut critical = Vec::new();

        for (completed, environment) in rule_set.environments.iter().enumerate() {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                warn!(completed, total, "batch validation cancelled");
                return Err(SGuardError::Cancelled { completed, total });
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.validate_entry(rule_set, environment, source)
            }))
            .unwrap_or_else(|payload| {
                Err(SGuardError::Panicked {
                    environment: environment.id.clone(),
                    message: panic_message(payload.as_ref()),
                })
            });

            match outcome {
                Ok(file) => files.push(file),
                Err(err) if err.is_critical() => {
                    error!(environment = %environment.id, error = %err, "critical error");
                    critical.push(err);
                }
                Err(err) => {
                    warn!(environment = %environment.id, error = %err, "environment failed");
                    errors.push(format!("{}: {err}", environment.id));
                    files.push(FileValidationResult::environment_failure(
                        &environment.id,
                        &err.to_string(),
                    ));
                }
            }
        }

        match critical.len() {
            0 => {}
            1 => return Err(critical.remove(0)),
            _ => return Err(SGuardError::Aggregate(critical)),
        }

        let result = RuleEngineResult::batch(files, &errors);
        info!(
            environments = total,
            failures = result.failure_count(),
            success = result.success,
            "batch validation finished"
        );
        Ok(result)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

fn require_non_empty(argument: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SGuardError::invalid_argument(
            argument,
            "value must not be empty",
        ));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(join_error) if join_error.is_panic() => Err(SGuardError::Panicked {
            environment: String::new(),
            message: panic_message(join_error.into_panic().as_ref()),
        }),
        Err(join_error) => Err(SGuardError::ResourceExhausted {
            context: "running validation on the blocking pool".to_string(),
            message: join_error.to_string(),
        }),
    }
}
