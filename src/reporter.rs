//! Session-scoped test reporter: maps runner results and appends them
//! durably to the worker's metadata file.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::{env_flag_enabled, Config};
use crate::error::{Error, Result};
use crate::events::{TestCase, TestRunRecord, TestStatus, TestStep};
use crate::mapper::map_test;
use crate::metadata::{append_record, init_metadata_file, metadata_file_path};

/// Identity of the runner plugin driving this reporter.
#[derive(Debug, Clone)]
pub struct RunnerInfo {
    /// Runner name (e.g. `playwright`), also the metadata-path tag.
    pub name: String,
    /// Runner version.
    pub version: String,
    /// Version of the reporter plugin itself.
    pub plugin_version: String,
}

/// Recognized reporter options, validated at the boundary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporterOptions {
    /// Whether to embed the test's source file in metadata.
    #[serde(default)]
    pub capture_test_file: Option<bool>,
    /// Extra metadata merged into every appended record.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Orchestrates one test-suite session for one worker process.
///
/// Calls arrive in order: [`Reporter::begin`] once, then
/// [`Reporter::test_begin`]/[`Reporter::test_end`] per test. Workers
/// run as separate processes, each appending to its own metadata file,
/// so no cross-process locking is needed.
pub struct Reporter {
    runner: RunnerInfo,
    config: Config,
    capture_test_file: bool,
    session_metadata: Map<String, Value>,
    initialized: HashSet<u32>,
    current_path: Option<PathBuf>,
}

impl Reporter {
    /// Creates a reporter for the given runner and process configuration.
    #[must_use]
    pub fn new(runner: RunnerInfo, config: &Config) -> Self {
        Self {
            runner,
            config: config.clone(),
            capture_test_file: true,
            session_metadata: Map::new(),
            initialized: HashSet::new(),
            current_path: None,
        }
    }

    /// The env var toggling source capture for this runner.
    fn capture_env_name(&self) -> String {
        format!("{}_REPLAY_CAPTURE_TEST_FILE", self.runner.name.to_uppercase())
    }

    /// The env var carrying session metadata for this runner.
    fn metadata_env_name(&self) -> String {
        format!("{}_REPLAY_METADATA", self.runner.name.to_uppercase())
    }

    /// Begins the session, resolving reporter options.
    ///
    /// `reporter_config` is the runner's duck-typed configuration value:
    /// an object is validated into [`ReporterOptions`], `null` means no
    /// options, and any other shape is a configuration warning — logged,
    /// replaced by defaults, never fatal.
    pub fn begin(&mut self, reporter_config: &Value) {
        let options = parse_options(&self.runner.name, reporter_config);

        self.capture_test_file = env_flag_enabled(&self.capture_env_name());
        // An explicit `false` in the reporter options always wins.
        if options.capture_test_file == Some(false) {
            self.capture_test_file = false;
        }

        self.session_metadata.insert(
            "x-replay-test".to_string(),
            serde_json::json!({
                "runner": {
                    "name": self.runner.name,
                    "version": self.runner.version,
                    "plugin": self.runner.plugin_version,
                },
            }),
        );
        if let Some(metadata) = options.metadata {
            crate::registry::deep_merge(&mut self.session_metadata, &metadata);
        }
        if let Some(env_metadata) = self.env_metadata() {
            crate::registry::deep_merge(&mut self.session_metadata, &env_metadata);
        }
    }

    /// Session metadata supplied through the environment, if any.
    fn env_metadata(&self) -> Option<Map<String, Value>> {
        let name = self.metadata_env_name();
        let raw = std::env::var(&name).ok()?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!(env = %name, "expected a JSON object for session metadata");
                None
            }
            Err(e) => {
                warn!(env = %name, error = %e, "ignoring malformed session metadata");
                None
            }
        }
    }

    /// Establishes the metadata file for the worker about to run a test.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryIo`] when the metadata file cannot be
    /// created.
    pub fn test_begin(&mut self, worker_index: u32) -> Result<()> {
        let path = metadata_file_path(&self.config, &self.runner.name, worker_index);
        if self.initialized.insert(worker_index) {
            init_metadata_file(&path)?;
        }
        self.current_path = Some(path);
        Ok(())
    }

    /// Records one finished test.
    ///
    /// Skipped tests are not recorded at all. For everything else the
    /// steps are mapped into a canonical result record, the test source
    /// is optionally embedded (best-effort), and the record is durably
    /// appended to the worker's metadata file before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when called before
    /// [`Reporter::test_begin`], or [`Error::RegistryIo`] when the
    /// append fails.
    pub fn test_end(&mut self, test: &TestCase, steps: &[TestStep]) -> Result<()> {
        if test.status == TestStatus::Skipped {
            return Ok(());
        }
        let path = self.current_path.clone().ok_or_else(|| Error::InvalidArgument {
            message: "test_end called before test_begin".to_string(),
        })?;

        let Some(record) = map_test(test, steps) else {
            return Ok(());
        };

        let spec_file = test.spec_relative_path();
        let mut extra_metadata = self.session_metadata.clone();
        if self.capture_test_file {
            match fs::read_to_string(&test.file) {
                Ok(source) => {
                    let key = format!("x-replay-{}", self.runner.name);
                    let mut sources = Map::new();
                    sources.insert(spec_file.clone(), Value::String(source));
                    let mut wrapper = Map::new();
                    wrapper.insert("sources".to_string(), Value::Object(sources));
                    extra_metadata.insert(key, Value::Object(wrapper));
                }
                Err(e) => {
                    // Best-effort: omit the field and keep going.
                    warn!(
                        file = %test.file.display(),
                        error = %e,
                        "failed to read test source for embedding"
                    );
                }
            }
        }

        let run_record = TestRunRecord {
            tests: vec![record],
            spec_file,
            replay_title: test.title.clone(),
            extra_metadata: if extra_metadata.is_empty() { None } else { Some(extra_metadata) },
        };
        append_record(&path, &run_record)
    }
}

/// Validates the duck-typed reporter configuration value.
fn parse_options(runner: &str, value: &Value) -> ReporterOptions {
    match value {
        Value::Null => ReporterOptions::default(),
        Value::Object(_) => match serde_json::from_value(value.clone()) {
            Ok(options) => options,
            Err(e) => {
                warn!(runner, error = %e, "invalid reporter configuration; using defaults");
                ReporterOptions::default()
            }
        },
        other => {
            warn!(
                runner,
                "expected an object for reporter configuration but received {}",
                json_type_name(other)
            );
            ReporterOptions::default()
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
