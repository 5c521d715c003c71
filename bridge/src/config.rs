//! Application environment and configuration handed to modules.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// The mode the host application runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  Dev,
  #[default]
  Test,
  Prod,
}

/// Where and how the host application runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
  root_path: PathBuf,
  mode: Mode,
}

impl Environment {
  pub fn new(root_path: impl Into<PathBuf>, mode: Mode) -> Self {
    Self {
      root_path: root_path.into(),
      mode,
    }
  }

  /// Test mode rooted at the current directory.
  pub fn simple() -> Self {
    Self::new(".", Mode::Test)
  }

  pub fn root_path(&self) -> &Path {
    &self.root_path
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  /// Resolves `relative` against the root path.
  pub fn file(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.root_path.join(relative)
  }
}

impl Default for Environment {
  fn default() -> Self {
    Self::simple()
  }
}

/// A tree of configuration values addressed with dotted paths
/// (`db.default.url`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Configuration {
  root: Mapping,
}

impl Configuration {
  pub fn empty() -> Self {
    Self::default()
  }

  /// Parses YAML text. The document must be a mapping (or empty).
  pub fn from_yaml_str(text: &str) -> Result<Self> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))?;
    match value {
      Value::Mapping(root) => Ok(Self { root }),
      Value::Null => Ok(Self::empty()),
      other => Err(Error::ConfigParse(format!(
        "top level must be a mapping, found {}",
        kind_of(&other)
      ))),
    }
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Self::from_yaml_str(&text)
  }

  pub fn is_empty(&self) -> bool {
    self.root.is_empty()
  }

  /// Deserializes the value at `path`.
  pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    self.get_optional(path)?.ok_or_else(|| Error::MissingConfigValue {
      path: path.to_string(),
    })
  }

  /// Like [`get`](Self::get), but a missing path is `Ok(None)`.
  pub fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
    match self.lookup(path) {
      None => Ok(None),
      Some(value) => serde_yaml::from_value(value.clone())
        .map(Some)
        .map_err(|e| Error::InvalidConfigValue {
          path: path.to_string(),
          message: e.to_string(),
        }),
    }
  }

  pub fn get_string(&self, path: &str) -> Result<String> {
    self.get(path)
  }

  /// The sub-tree at `path`.
  pub fn get_config(&self, path: &str) -> Result<Configuration> {
    match self.lookup(path) {
      Some(Value::Mapping(root)) => Ok(Self { root: root.clone() }),
      Some(other) => Err(Error::InvalidConfigValue {
        path: path.to_string(),
        message: format!("expected a mapping, found {}", kind_of(other)),
      }),
      None => Err(Error::MissingConfigValue {
        path: path.to_string(),
      }),
    }
  }

  /// Every leaf value with its dotted key, in document order.
  pub fn entries(&self) -> Vec<(String, Value)> {
    let mut entries = Vec::new();
    flatten(&self.root, None, &mut entries);
    entries
  }

  /// Sets the value at `path`, creating intermediate mappings. Anything that
  /// is in the way of the path is replaced.
  pub fn set(&mut self, path: &str, value: impl Into<Value>) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = match segments.pop() {
      Some(last) => last,
      None => return,
    };

    let mut node = &mut self.root;
    for segment in segments {
      let key = Value::String(segment.to_string());
      let child = node
        .entry(key)
        .or_insert_with(|| Value::Mapping(Mapping::new()));
      if !child.is_mapping() {
        *child = Value::Mapping(Mapping::new());
      }
      node = match child {
        Value::Mapping(mapping) => mapping,
        _ => unreachable!("replaced with a mapping above"),
      };
    }
    node.insert(Value::String(last.to_string()), value.into());
  }

  /// Merges `fallback` underneath this configuration: keys present here win,
  /// nested mappings are merged recursively.
  pub fn with_fallback(mut self, fallback: &Configuration) -> Self {
    merge(&mut self.root, &fallback.root);
    self
  }

  fn lookup(&self, path: &str) -> Option<&Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut value = self.root.get(first)?;
    for segment in segments {
      value = value.as_mapping()?.get(segment)?;
    }
    Some(value)
  }
}

fn flatten(mapping: &Mapping, prefix: Option<&str>, out: &mut Vec<(String, Value)>) {
  for (key, value) in mapping {
    let Some(key) = key_to_string(key) else {
      continue;
    };
    let key = match prefix {
      Some(prefix) => format!("{prefix}.{key}"),
      None => key,
    };
    match value {
      Value::Mapping(nested) => flatten(nested, Some(&key), out),
      leaf => out.push((key, leaf.clone())),
    }
  }
}

fn merge(target: &mut Mapping, fallback: &Mapping) {
  for (key, fallback_value) in fallback {
    match target.get_mut(key) {
      Some(Value::Mapping(existing)) => {
        if let Value::Mapping(nested) = fallback_value {
          merge(existing, nested);
        }
      }
      Some(_) => {}
      None => {
        target.insert(key.clone(), fallback_value.clone());
      }
    }
  }
}

fn key_to_string(key: &Value) -> Option<String> {
  match key {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Sequence(_) => "a sequence",
    Value::Mapping(_) => "a mapping",
    Value::Tagged(_) => "a tagged value",
  }
}
