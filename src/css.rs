//! Custom CSS for the field preview: a tolerant declaration-list parser and
//! the snippet catalogue (built-ins plus user snippets kept in the local store).

use crate::store::KvStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Property name -> value, kebab-case CSS property names.
pub type StyleMap = BTreeMap<String, String>;

pub const SNIPPETS_KEY: &str = "cssSnippets";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssParseError {
    #[error("declaration {index} has no ':' separator: '{text}'")]
    MissingColon { index: usize, text: String },
    #[error("declaration {index} has an empty property name")]
    EmptyProperty { index: usize },
    #[error("invalid property name '{0}'")]
    InvalidProperty(String),
    #[error("declaration '{0}' has an empty value")]
    EmptyValue(String),
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("unterminated comment")]
    UnterminatedComment,
}

fn strip_comments(css: &str) -> Result<String, CssParseError> {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("*/") {
            Some(end) => rest = &after[end + 2..],
            None => return Err(CssParseError::UnterminatedComment),
        }
    }
    out.push_str(rest);
    Ok(out)
}

// Accepts either a bare declaration list or a single `selector { ... }` block.
fn declaration_body(css: &str) -> Result<&str, CssParseError> {
    let opens = css.matches('{').count();
    let closes = css.matches('}').count();
    if opens != closes || opens > 1 {
        return Err(CssParseError::UnbalancedBraces);
    }
    match (css.find('{'), css.rfind('}')) {
        (Some(o), Some(c)) if o < c => Ok(&css[o + 1..c]),
        (None, None) => Ok(css),
        _ => Err(CssParseError::UnbalancedBraces),
    }
}

fn valid_property(name: &str) -> bool {
    let body = name.strip_prefix("--").unwrap_or(name);
    !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !body.starts_with(|c: char| c.is_ascii_digit())
}

/// Parse a CSS declaration list (`color: red; border-radius: 4px`) into a
/// style map. Later declarations override earlier ones. Property names are
/// lowercased; camelCase names are converted to kebab-case.
pub fn parse_custom_css(css: &str) -> Result<StyleMap, CssParseError> {
    let cleaned = strip_comments(css)?;
    let body = declaration_body(&cleaned)?;
    let mut map = StyleMap::new();
    for (index, decl) in body.split(';').enumerate() {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let (prop, value) = decl.split_once(':').ok_or_else(|| CssParseError::MissingColon {
            index,
            text: decl.to_string(),
        })?;
        let prop = prop.trim();
        if prop.is_empty() {
            return Err(CssParseError::EmptyProperty { index });
        }
        let prop = camel_to_kebab(prop);
        if !valid_property(&prop) {
            return Err(CssParseError::InvalidProperty(prop));
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(CssParseError::EmptyValue(prop));
        }
        map.insert(prop, value.to_string());
    }
    Ok(map)
}

fn camel_to_kebab(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn style_to_inline(style: &StyleMap) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append a snippet to existing CSS; never replaces what is already there.
pub fn append_snippet(css: &str, snippet: &str) -> String {
    let snippet = snippet.trim();
    if snippet.is_empty() {
        return css.to_string();
    }
    let base = css.trim_end();
    if base.is_empty() {
        snippet.to_string()
    } else {
        format!("{base}\n{snippet}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssSnippet {
    pub id: String,
    pub name: String,
    pub value: String,
}

pub fn builtin_snippets() -> Vec<CssSnippet> {
    [
        ("builtin-rounded", "Rounded corners", "border-radius: 12px;"),
        (
            "builtin-shadow",
            "Soft shadow",
            "box-shadow: 0 2px 8px rgba(0, 0, 0, 0.12);",
        ),
        ("builtin-thick", "Thick border", "border-width: 2px;"),
        ("builtin-upper", "Uppercase text", "text-transform: uppercase;"),
        ("builtin-mono", "Monospace", "font-family: ui-monospace, monospace;"),
        ("builtin-roomy", "Roomy padding", "padding: 12px 16px;"),
    ]
    .into_iter()
    .map(|(id, name, value)| CssSnippet {
        id: id.to_string(),
        name: name.to_string(),
        value: value.to_string(),
    })
    .collect()
}

/// Built-in plus user-saved snippets. User snippets persist under `cssSnippets`.
pub struct SnippetLibrary {
    user: Vec<CssSnippet>,
}

impl SnippetLibrary {
    pub fn load(store: &mut dyn KvStore) -> Self {
        let user = match store.get(SNIPPETS_KEY) {
            Some(text) => match serde_json::from_str::<Vec<CssSnippet>>(&text) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "discarding corrupt cssSnippets entry");
                    if let Err(e) = store.remove(SNIPPETS_KEY) {
                        tracing::warn!(error = %e, "could not clear cssSnippets");
                    }
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Self { user }
    }

    pub fn all(&self) -> Vec<CssSnippet> {
        let mut out = builtin_snippets();
        out.extend(self.user.iter().cloned());
        out
    }

    pub fn user_snippets(&self) -> &[CssSnippet] {
        &self.user
    }

    pub fn save(&mut self, store: &mut dyn KvStore, name: &str, value: &str) -> Result<CssSnippet> {
        let snippet = CssSnippet {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        };
        let mut next = self.user.clone();
        next.push(snippet.clone());
        persist(store, &next)?;
        self.user = next;
        Ok(snippet)
    }

    pub fn delete(&mut self, store: &mut dyn KvStore, id: &str) -> Result<bool> {
        let before = self.user.len();
        let next: Vec<CssSnippet> = self.user.iter().filter(|s| s.id != id).cloned().collect();
        if next.len() == before {
            return Ok(false);
        }
        persist(store, &next)?;
        self.user = next;
        Ok(true)
    }
}

fn persist(store: &mut dyn KvStore, snippets: &[CssSnippet]) -> Result<()> {
    let text = serde_json::to_string(snippets).context("serializing css snippets")?;
    store.set(SNIPPETS_KEY, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn parses_declarations_with_comments_and_trailing_semicolon() {
        let m = parse_custom_css("/* brand */ color: #333; borderRadius: 8px;\n padding: 4px 8px;")
            .unwrap();
        assert_eq!(m.get("color").map(String::as_str), Some("#333"));
        assert_eq!(m.get("border-radius").map(String::as_str), Some("8px"));
        assert_eq!(m.get("padding").map(String::as_str), Some("4px 8px"));
    }

    #[test]
    fn parses_single_rule_block_and_urls_with_colons() {
        let m = parse_custom_css(".field { background: url(https://x.test/a.png) }").unwrap();
        assert_eq!(
            m.get("background").map(String::as_str),
            Some("url(https://x.test/a.png)")
        );
    }

    #[test]
    fn later_declarations_win() {
        let m = parse_custom_css("color: red; color: blue").unwrap();
        assert_eq!(m.get("color").map(String::as_str), Some("blue"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_custom_css("color red"),
            Err(CssParseError::MissingColon { .. })
        ));
        assert!(matches!(
            parse_custom_css(": red"),
            Err(CssParseError::EmptyProperty { .. })
        ));
        assert!(matches!(
            parse_custom_css("color:"),
            Err(CssParseError::EmptyValue(_))
        ));
        assert_eq!(
            parse_custom_css("a { color: red"),
            Err(CssParseError::UnbalancedBraces)
        );
        assert_eq!(
            parse_custom_css("/* open"),
            Err(CssParseError::UnterminatedComment)
        );
        assert!(matches!(
            parse_custom_css("co lor: red"),
            Err(CssParseError::InvalidProperty(_))
        ));
    }

    #[test]
    fn empty_css_is_an_empty_map() {
        assert!(parse_custom_css("  ").unwrap().is_empty());
    }

    #[test]
    fn append_snippet_keeps_existing_css() {
        assert_eq!(append_snippet("", "color: red;"), "color: red;");
        assert_eq!(
            append_snippet("color: red;\n", "padding: 2px;"),
            "color: red;\npadding: 2px;"
        );
        assert_eq!(append_snippet("color: red;", "   "), "color: red;");
    }

    #[test]
    fn user_snippets_persist_and_corrupt_entries_are_dropped() {
        let mut store = MemoryStore::default();
        let mut lib = SnippetLibrary::load(&mut store);
        assert!(lib.user_snippets().is_empty());
        let s = lib.save(&mut store, "Danger", "color: #c00;").unwrap();
        let reloaded = SnippetLibrary::load(&mut store);
        assert_eq!(reloaded.user_snippets(), &[s.clone()]);
        assert_eq!(reloaded.all().len(), builtin_snippets().len() + 1);

        assert!(lib.delete(&mut store, &s.id).unwrap());
        assert!(!lib.delete(&mut store, &s.id).unwrap());

        store.set(SNIPPETS_KEY, "{not json").unwrap();
        let lib = SnippetLibrary::load(&mut store);
        assert!(lib.user_snippets().is_empty());
        assert!(store.get(SNIPPETS_KEY).is_none());
    }
}
