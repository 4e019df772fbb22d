//! Declarative filter configuration.
//!
//! This module provides:
//! - [`FilterConfig`] / [`FilterOption`] — One sink definition as produced
//!   by an external configuration loader
//! - [`Logger::apply_config`] — Validates every definition, then replaces
//!   the logger's whole filter set atomically
//!
//! Validation is collect-all-errors-then-fail: a configuration with any
//! invalid definition activates nothing, and every problem is reported in
//! one pass. Disabled definitions are validated but not installed.

use serde::{Deserialize, Serialize};

use crate::console::ConsoleSink;
use crate::error::{ConfigErrors, ConfigIssue, LogError};
use crate::file::{FileSink, default_filename};
use crate::logger::Logger;
use crate::options::OptionValue;
use crate::record::Level;
use crate::sink::Sink;
use crate::socket::{SocketSink, StructuredSocketSink};

/// One option name/value pair inside a filter definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option name, e.g. `"filename"`.
    pub name: String,
    /// Option value.
    pub value: OptionValue,
}

/// One declarative sink definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Whether the filter is installed; disabled filters are validated
    /// for syntax and correctness only.
    pub enabled: bool,
    /// Unique filter name in the dispatch table.
    pub name: String,
    /// Severity threshold name (`"FINEST"` .. `"CRITICAL"`).
    pub level: String,
    /// Sink kind: `console`, `file`, `socket`, `xml`, or `json`.
    pub kind: String,
    /// Options applied to the sink before first use.
    #[serde(default)]
    pub options: Vec<FilterOption>,
}

fn build_sink(kind: &str) -> Result<Box<dyn Sink>, LogError> {
    match kind {
        "console" => Ok(Box::new(ConsoleSink::new())),
        "file" => Ok(Box::new(FileSink::new(default_filename(), 0))),
        "socket" => Ok(Box::new(SocketSink::default())),
        "xml" => Ok(Box::new(FileSink::xml(default_filename(), 0))),
        "json" => Ok(Box::new(StructuredSocketSink::default())),
        other => Err(LogError::UnknownSinkKind(other.to_string())),
    }
}

impl Logger {
    /// Applies a declarative filter configuration.
    ///
    /// Every definition is validated and built first; any error anywhere
    /// means nothing is activated and all problems come back together in
    /// [`ConfigErrors`]. On success the previous filter set is closed and
    /// fully replaced by the enabled definitions.
    pub fn apply_config(&self, configs: &[FilterConfig]) -> Result<(), ConfigErrors> {
        let mut issues = Vec::new();
        let mut ready: Vec<(String, Level, Box<dyn Sink>)> = Vec::new();

        for config in configs {
            let mut good = true;

            if config.name.is_empty() {
                issues.push(ConfigIssue {
                    filter: "<unnamed>".to_string(),
                    error: LogError::bad_value("name", "empty filter name"),
                });
                good = false;
            }

            let level = match config.level.parse::<Level>() {
                Ok(level) => level,
                Err(error) => {
                    issues.push(ConfigIssue {
                        filter: config.name.clone(),
                        error,
                    });
                    good = false;
                    Level::Info
                }
            };

            match build_sink(&config.kind) {
                Ok(mut sink) => {
                    for option in &config.options {
                        if let Err(error) = sink.set_option(&option.name, &option.value) {
                            issues.push(ConfigIssue {
                                filter: config.name.clone(),
                                error,
                            });
                            good = false;
                        }
                    }
                    if good && config.enabled {
                        ready.push((config.name.clone(), level, sink));
                    } else {
                        // Validated only (disabled or rejected): release
                        // whatever the option pass may have opened.
                        sink.close();
                    }
                }
                Err(error) => {
                    issues.push(ConfigIssue {
                        filter: config.name.clone(),
                        error,
                    });
                }
            }
        }

        if !issues.is_empty() {
            for (_, _, mut sink) in ready {
                sink.close();
            }
            return Err(ConfigErrors { issues });
        }

        self.replace_filters(ready);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str, value: impl Into<OptionValue>) -> FilterOption {
        FilterOption {
            name: name.to_string(),
            value: value.into(),
        }
    }

    fn console_config(name: &str, level: &str) -> FilterConfig {
        FilterConfig {
            enabled: true,
            name: name.to_string(),
            level: level.to_string(),
            kind: "console".to_string(),
            options: vec![option("format", "[%L] %M")],
        }
    }

    #[test]
    fn valid_config_replaces_the_filter_set() {
        let logger = Logger::with_console(Level::Finest);
        assert_eq!(logger.len(), 1);

        let configs = vec![
            console_config("term", "INFO"),
            console_config("errors", "ERROR"),
        ];
        let applied = logger.apply_config(&configs);
        assert!(applied.is_ok());

        assert_eq!(logger.len(), 2);
        assert!(logger.is_enabled(Level::Info));
        // The old FINEST console filter is gone.
        assert!(!logger.is_enabled(Level::Finest));
    }

    #[test]
    fn disabled_definition_is_validated_but_not_installed() {
        let logger = Logger::new();
        let mut config = console_config("later", "INFO");
        config.enabled = false;

        let applied = logger.apply_config(&[config]);
        assert!(applied.is_ok());
        assert!(logger.is_empty());
    }

    #[test]
    fn disabled_definition_with_errors_still_fails_the_load() {
        let logger = Logger::new();
        let mut config = console_config("later", "INFO");
        config.enabled = false;
        config.options = vec![option("rotate", 5)];

        let applied = logger.apply_config(&[config]);
        assert!(applied.is_err());
    }

    #[test]
    fn all_errors_are_collected_and_nothing_activates() {
        let logger = Logger::with_console(Level::Info);

        let configs = vec![
            FilterConfig {
                enabled: true,
                name: "bad-level".to_string(),
                level: "LOUD".to_string(),
                kind: "console".to_string(),
                options: Vec::new(),
            },
            console_config("fine", "INFO"),
            FilterConfig {
                enabled: true,
                name: "bad-kind".to_string(),
                level: "INFO".to_string(),
                kind: "syslog".to_string(),
                options: Vec::new(),
            },
            FilterConfig {
                enabled: true,
                name: "bad-option".to_string(),
                level: "INFO".to_string(),
                kind: "socket".to_string(),
                options: vec![option("rotate", 3)],
            },
        ];

        let applied = logger.apply_config(&configs);
        assert!(applied.is_err(), "expected a failed load");
        let Err(errors) = applied else { return };
        assert_eq!(errors.issues.len(), 3);
        assert_eq!(errors.issues[0].filter, "bad-level");
        assert_eq!(errors.issues[1].filter, "bad-kind");
        assert_eq!(errors.issues[2].filter, "bad-option");

        // Previous filter set untouched.
        assert_eq!(logger.len(), 1);
        assert!(logger.is_enabled(Level::Info));
    }

    #[test]
    fn empty_filter_name_is_rejected() {
        let logger = Logger::new();
        let config = FilterConfig {
            enabled: true,
            name: String::new(),
            level: "INFO".to_string(),
            kind: "console".to_string(),
            options: Vec::new(),
        };
        let applied = logger.apply_config(&[config]);
        assert!(applied.is_err());
    }

    #[test]
    fn bad_option_value_is_reported_per_filter() {
        let logger = Logger::new();
        let config = FilterConfig {
            enabled: true,
            name: "term".to_string(),
            level: "INFO".to_string(),
            kind: "console".to_string(),
            options: vec![option("format", 42i64)],
        };

        let applied = logger.apply_config(&[config]);
        assert!(applied.is_err(), "expected a failed load");
        let Err(errors) = applied else { return };
        assert_eq!(errors.issues.len(), 1);
        assert!(matches!(errors.issues[0].error, LogError::BadValue { .. }));
    }

    #[test]
    fn file_kind_honors_filename_option() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("declared.log");
        let logger = Logger::new();

        let configs = vec![FilterConfig {
            enabled: true,
            name: "file".to_string(),
            level: "DEBUG".to_string(),
            kind: "file".to_string(),
            options: vec![
                option("filename", path.to_string_lossy().into_owned()),
                option("format", "%M"),
            ],
        }];
        logger.apply_config(&configs).expect("valid config");

        logger.log(Level::Info, "s", "declared delivery");
        logger.close();

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "declared delivery\n");
    }

    #[test]
    fn definitions_deserialize_from_json() {
        let raw = r#"[
            {
                "enabled": true,
                "name": "file",
                "level": "WARNING",
                "kind": "file",
                "options": [
                    {"name": "filename", "value": "app.log"},
                    {"name": "maxsize", "value": "10M"},
                    {"name": "rotate", "value": 5}
                ]
            },
            {"enabled": false, "name": "net", "level": "INFO", "kind": "json"}
        ]"#;

        let configs: Vec<FilterConfig> = serde_json::from_str(raw).expect("parse");
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].kind, "file");
        assert_eq!(configs[0].options[1].value, OptionValue::from("10M"));
        assert_eq!(configs[0].options[2].value, OptionValue::Int(5));
        assert!(!configs[1].enabled);
        assert!(configs[1].options.is_empty());
    }

    #[test]
    fn every_kind_builds() {
        for kind in ["console", "file", "socket", "xml", "json"] {
            let mut sink = build_sink(kind).expect("known kind");
            sink.close();
        }
        assert!(build_sink("syslog").is_err());
    }
}
