use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::language::LanguageProfile;

/// Keys a response may be wrapped under by proxies in front of the sandbox.
const ENVELOPE_KEYS: [&str; 3] = ["data", "result", "response"];
const MAX_ENVELOPE_DEPTH: usize = 4;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

/// Body of an execution request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub stdin: String,
}

impl ExecuteRequest {
    pub fn new(language: &LanguageProfile, code: &str, stdin: &str) -> Self {
        Self {
            language: language.runtime.clone(),
            version: language.version.clone(),
            files: vec![SourceFile {
                name: language.file_name.clone(),
                content: code.to_string(),
            }],
            stdin: stdin.to_string(),
        }
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Output of one phase (compile or run).
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Stage {
    #[serde(default, deserialize_with = "string_or_null")]
    pub stdout: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub stderr: String,
    #[serde(default, alias = "exitCode", alias = "exit_code")]
    pub code: Option<i64>,
    /// Set when the process was killed, e.g. `SIGKILL` on timeout
    #[serde(default)]
    pub signal: Option<String>,
}

impl Stage {
    pub fn failed(&self) -> bool {
        self.code.is_some_and(|c| c != 0) || self.signal.is_some()
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub compile: Option<Stage>,
    #[serde(default)]
    pub run: Option<Stage>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Strips wrapper objects such as `{"data": {...}}` until the stages are
/// reachable.
pub fn unwrap_envelope(mut value: Value) -> Value {
    for _ in 0..MAX_ENVELOPE_DEPTH {
        let Some(object) = value.as_object() else {
            break;
        };
        if object.contains_key("run") || object.contains_key("compile") {
            break;
        }
        let Some(key) = ENVELOPE_KEYS
            .iter()
            .find(|k| object.get(**k).is_some_and(Value::is_object))
        else {
            break;
        };
        value = value[*key].take();
    }
    value
}
