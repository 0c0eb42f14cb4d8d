// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::collections::BTreeMap;
use std::path::Path;

use ini::{Ini, ParseOption};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::literal::Literal;
use crate::config::schema::{Task, TaskConfig};
use crate::constant;
use crate::error::ClutterError;

// Stands in for the newline of a joined continuation line while the INI is parsed
const CONTINUATION: char = '\u{1f}';

/// A task selection plus its literal-typed section values
///
/// `values` holds exactly the keys of the selected task's section (and any
/// `[DEFAULT]` keys the section does not override). Keys are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub task: Task,
    pub values: BTreeMap<String, Literal>,
    pub verbose: bool,
}

impl Config {
    /// Read a configuration from an INI file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to an INI file with a `[GENERAL]` section
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use clutter_core::config::Config;
    /// let config = Config::open("config.ini").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Config, ClutterError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ClutterError::NoFileError(path.display().to_string()));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|err| ClutterError::ConfigReadError(format!("{}: {}", path.display(), err)))?;

        Self::parse(&text)
    }

    /// Parse a configuration from INI text
    ///
    /// # Examples
    ///
    /// ```
    /// use clutter_core::config::{Config, Literal, Task};
    ///
    /// let text = "[GENERAL]\ntask = 'augment'\n\n[AUGMENT]\nimg_dir = 'in'\nout_dir = 'out'\nnum_imgs = 5\n";
    /// let config = Config::parse(text).unwrap();
    ///
    /// assert_eq!(config.task, Task::Augment);
    /// assert_eq!(config.get("num_imgs"), Some(&Literal::Int(5)));
    /// ```
    pub fn parse(text: &str) -> Result<Config, ClutterError> {
        // Values are evaluated as literals, so quotes and escapes must survive
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };

        let ini = Ini::load_from_str_opt(&join_continuations(text), options)
            .map_err(|err| ClutterError::ConfigReadError(err.to_string()))?;

        let general = section_values(&ini, constant::GENERAL_SECTION)?;

        let raw_task = general.get(constant::TASK_KEY).ok_or_else(|| {
            ClutterError::ConfigKeyError(
                constant::GENERAL_SECTION.to_string(),
                constant::TASK_KEY.to_string(),
            )
        })?;

        let task = parse_task(raw_task)?;

        let verbose = match general.get(constant::VERBOSE_KEY) {
            Some(raw) => match evaluate(constant::VERBOSE_KEY, raw)? {
                Literal::Bool(verbose) => verbose,
                other => {
                    return Err(ClutterError::SchemaError(format!(
                        "{} must be True or False, found {}",
                        constant::VERBOSE_KEY,
                        other.type_name()
                    )));
                }
            },
            None => true,
        };

        let mut raw = section_values(&ini, task.section())?;

        if ini.section(Some(constant::DEFAULT_SECTION)).is_some() {
            for (key, value) in section_values(&ini, constant::DEFAULT_SECTION)? {
                raw.entry(key).or_insert(value);
            }
        }

        let values = raw
            .iter()
            .map(|(key, value)| evaluate(key, value).map(|literal| (key.clone(), literal)))
            .collect::<Result<BTreeMap<String, Literal>, ClutterError>>()?;

        Ok(Config {
            task,
            values,
            verbose,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.values.get(key)
    }

    /// Section values as a JSON object
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();

        Value::Object(map)
    }

    /// Deserialize the section values into a typed schema
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ClutterError> {
        serde_json::from_value(self.to_json())
            .map_err(|err| ClutterError::SchemaError(format!("[{}] {}", self.task, err)))
    }

    /// Validate the section values against the schema of the selected task
    pub fn task_config(&self) -> Result<TaskConfig, ClutterError> {
        Ok(match self.task {
            Task::Augment => TaskConfig::Augment(self.deserialize()?),
            Task::Train => TaskConfig::Train(self.deserialize()?),
            Task::Benchmark => TaskConfig::Benchmark(self.deserialize()?),
        })
    }
}

/// Resolve a raw `task` value: uppercase it, then evaluate it as a literal
///
/// # Examples
///
/// ```
/// use clutter_core::config::{parse_task, Task};
///
/// assert_eq!(parse_task("'train'").unwrap(), Task::Train);
/// assert!(parse_task("train").is_err());
/// ```
pub fn parse_task(raw: &str) -> Result<Task, ClutterError> {
    match evaluate(constant::TASK_KEY, &raw.to_uppercase())? {
        Literal::Str(name) => name.parse(),
        other => Err(ClutterError::UnknownTaskError(other.to_string())),
    }
}

fn evaluate(key: &str, raw: &str) -> Result<Literal, ClutterError> {
    Literal::parse(raw).map_err(|message| {
        ClutterError::LiteralError(key.to_string(), format!("{} (value: {})", message, raw))
    })
}

fn section_values(ini: &Ini, section: &str) -> Result<BTreeMap<String, String>, ClutterError> {
    let properties = ini
        .section(Some(section))
        .ok_or_else(|| ClutterError::ConfigSectionError(section.to_string()))?;

    Ok(properties
        .iter()
        .map(|(key, value)| {
            let value = value.trim().replace(CONTINUATION, "\n");
            (key.trim().to_lowercase(), value)
        })
        .collect())
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';')
}

/// Fold indented lines that follow a key into that key's value
///
/// Each continuation is stripped and joined with a newline marker, so a
/// wrapped list reads as a single value once the INI is parsed.
fn join_continuations(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    // Index of the key line that indented lines currently continue
    let mut value_line: Option<usize> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            value_line = None;
        } else if is_comment(trimmed) {
            // Comments neither start nor end a value
        } else if let Some(idx) = value_line.filter(|_| line.starts_with(char::is_whitespace)) {
            lines[idx].push(CONTINUATION);
            lines[idx].push_str(trimmed);
            continue;
        } else if !trimmed.starts_with('[') && trimmed.contains(['=', ':']) {
            value_line = Some(lines.len());
        } else {
            value_line = None;
        }

        lines.push(line.to_string());
    }

    lines.join("\n")
}
