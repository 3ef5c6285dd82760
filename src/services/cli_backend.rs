//! Backend that shells out to a CMS command line tool.
//!
//! The configured command is run as `<command> <operation> [args...]`. Request
//! bodies go to the child's stdin as JSON and the child answers on stdout with
//! an envelope: `{"ok": true, "data": ...}` or `{"ok": false, "error": "..."}`.

use super::backend::CmsBackend;
use crate::model::{Collection, ContentEntry, Field};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("static regex"))
}

/// Expand `${VAR}` from the environment. Values containing whitespace are
/// quoted so they stay a single argument after shlex splitting.
pub(crate) fn expand_cmdline_env(cmdline: &str, vars: &HashMap<String, String>) -> String {
    env_var_re()
        .replace_all(cmdline, |caps: &regex::Captures| {
            let v = vars.get(&caps[1]).cloned().unwrap_or_default();
            if v.chars().any(char::is_whitespace) {
                format!("\"{}\"", v.replace('"', "\\\""))
            } else {
                v
            }
        })
        .to_string()
}

/// Decode a response envelope into its `data` payload.
pub(crate) fn parse_envelope(text: &str) -> Result<JsonValue> {
    let v: JsonValue = serde_json::from_str(text.trim()).context("parsing command JSON")?;
    let ok = v.get("ok").and_then(|b| b.as_bool()).unwrap_or(false);
    if ok {
        return Ok(v.get("data").cloned().unwrap_or(JsonValue::Null));
    }
    let msg = v
        .get("error")
        .and_then(|e| {
            e.as_str()
                .map(str::to_string)
                .or_else(|| e.get("message").and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| "backend reported an error".to_string());
    Err(anyhow!(msg))
}

pub struct CliBackend {
    program: String,
    base_args: Vec<String>,
    label: String,
}

impl CliBackend {
    pub fn new(cmdline: String) -> Result<Self> {
        let vars: HashMap<String, String> = env::vars().collect();
        let expanded = expand_cmdline_env(&cmdline, &vars);
        let mut parts =
            shlex::split(&expanded).ok_or_else(|| anyhow!("Failed to parse command line"))?;
        if parts.is_empty() {
            return Err(anyhow!("Empty backend command"));
        }
        let program = parts.remove(0);
        let label = std::path::Path::new(&program)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| program.clone());
        Ok(Self {
            program,
            base_args: parts,
            label,
        })
    }

    fn call(&self, op: &str, args: &[&str], body: Option<&JsonValue>) -> Result<JsonValue> {
        tracing::debug!(program = %self.program, op, ?args, "cli backend call");
        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .arg(op)
            .args(args)
            .env("CMS_TUI_JSON", "1")
            .stdin(if body.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning {} {op}", self.program))?;
        if let (Some(body), Some(mut stdin)) = (body, child.stdin.take()) {
            let bytes = serde_json::to_vec(body)?;
            stdin.write_all(&bytes).context("writing request body")?;
        }
        let output = child.wait_with_output().context("waiting for backend command")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            let err = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{op} failed: {}", err.trim()));
        }
        // an error envelope is more useful than the exit status
        let data = parse_envelope(&stdout).with_context(|| format!("{op} failed"))?;
        if !output.status.success() {
            tracing::warn!(op, status = ?output.status, "backend exited non-zero with ok envelope");
        }
        Ok(data)
    }

    fn call_as<T: DeserializeOwned>(
        &self,
        op: &str,
        args: &[&str],
        body: Option<&JsonValue>,
    ) -> Result<T> {
        let data = self.call(op, args, body)?;
        serde_json::from_value(data).with_context(|| format!("decoding {op} response"))
    }
}

impl CmsBackend for CliBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch_collections(&self) -> Result<Vec<Collection>> {
        self.call_as("collections", &[], None)
    }

    fn get_fields_for_collection(&self, collection_id: &str) -> Result<Vec<Field>> {
        self.call_as("fields", &[collection_id], None)
    }

    fn create_field(&self, collection_id: &str, field: &JsonValue) -> Result<Field> {
        self.call_as("create-field", &[collection_id], Some(field))
    }

    fn update_field(
        &self,
        collection_id: &str,
        field_id: &str,
        patch: &JsonValue,
    ) -> Result<Field> {
        self.call_as("update-field", &[collection_id, field_id], Some(patch))
    }

    fn delete_field(&self, collection_id: &str, field_id: &str) -> Result<()> {
        self.call("delete-field", &[collection_id, field_id], None).map(|_| ())
    }

    fn get_content_items(&self, collection_id: &str) -> Result<Vec<ContentEntry>> {
        self.call_as("content", &[collection_id], None)
    }
}
