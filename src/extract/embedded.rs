//! Structured data embedded in a page
//!
//! Pages carry two kinds of machine-readable data next to the markup:
//! JSON-LD blocks (`<script type="application/ld+json">`) and a serialized
//! client-side state (`window.__APOLLO_STATE__ = {...}` or a
//! `<script type="application/json">` blob). Both are collected here so the
//! field projections can search them without re-parsing the document.

use scraper::{Html, Selector};
use serde_json::Value;

/// Script prefixes that assign serialized client state
const STATE_ASSIGNMENTS: &[&str] = &[
    "window.__APOLLO_STATE__",
    "window.__PRELOADED_STATE__",
    "window.__INITIAL_STATE__",
];

/// JSON-LD types describing an article
const ARTICLE_TYPES: &[&str] = &["Article", "NewsArticle", "BlogPosting", "SocialMediaPosting"];

#[derive(Debug, Clone, Default)]
pub struct EmbeddedData {
    /// Flattened JSON-LD objects (arrays and `@graph` unwrapped)
    pub linked_data: Vec<Value>,

    /// Client-state payloads
    pub app_state: Vec<Value>,
}

impl EmbeddedData {
    pub fn from_document(document: &Html) -> Self {
        let mut data = Self::default();

        if let Ok(selector) = Selector::parse("script[type='application/ld+json']") {
            for script in document.select(&selector) {
                let text = script.text().collect::<String>();
                if let Ok(json) = serde_json::from_str::<Value>(text.trim()) {
                    flatten_linked_data(json, &mut data.linked_data);
                }
            }
        }

        if let Ok(selector) = Selector::parse("script[type='application/json']") {
            for script in document.select(&selector) {
                let text = script.text().collect::<String>();
                if let Ok(json) = serde_json::from_str::<Value>(text.trim()) {
                    data.app_state.push(json);
                }
            }
        }

        if let Ok(selector) = Selector::parse("script:not([src])") {
            for script in document.select(&selector) {
                let text = script.text().collect::<String>();
                if let Some(json) = parse_state_assignment(&text) {
                    data.app_state.push(json);
                }
            }
        }

        data
    }

    pub fn is_empty(&self) -> bool {
        self.linked_data.is_empty() && self.app_state.is_empty()
    }

    /// The first JSON-LD object describing an article
    pub fn article_object(&self) -> Option<&Value> {
        self.linked_data
            .iter()
            .find(|value| has_type(value, ARTICLE_TYPES))
    }

    /// JSON-LD objects whose `@type` is one of `types`
    pub fn linked_data_of_type<'a>(
        &'a self,
        types: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.linked_data
            .iter()
            .filter(move |value| has_type(value, types))
    }

    /// Every value stored under `key` anywhere in the client state
    pub fn find_values(&self, key: &str) -> Vec<&Value> {
        let mut found = Vec::new();
        for root in &self.app_state {
            find_values(root, key, &mut found);
        }
        found
    }

    /// The client-state object stored under `key`, e.g. `Post:1a2b3c4d5e6f`
    pub fn state_entry(&self, key: &str) -> Option<&Value> {
        self.find_values(key).into_iter().find(|value| value.is_object())
    }

    /// Same as [`find_values`](Self::find_values), but across JSON-LD as well
    pub fn find_values_everywhere(&self, key: &str) -> Vec<&Value> {
        let mut found = self.find_values(key);
        for root in &self.linked_data {
            find_values(root, key, &mut found);
        }
        found
    }
}

/// Collects every value stored under `key`, depth first
pub fn find_values<'a>(root: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match root {
        Value::Object(map) => {
            for (name, value) in map {
                if name == key {
                    found.push(value);
                }
                find_values(value, key, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                find_values(item, key, found);
            }
        }
        _ => {}
    }
}

/// Returns true if a JSON-LD object's `@type` (string or list) is in `types`
pub fn has_type(value: &Value, types: &[&str]) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => types.contains(&kind.as_str()),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| types.contains(&kind)),
        _ => false,
    }
}

fn flatten_linked_data(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_linked_data(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_linked_data(graph, out);
            }
            if !map.is_empty() {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

fn parse_state_assignment(script: &str) -> Option<Value> {
    let trimmed = script.trim();
    let rest = STATE_ASSIGNMENTS
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))?;

    let json = rest.trim_start().strip_prefix('=')?.trim();
    let json = json.strip_suffix(';').unwrap_or(json).trim_end();
    serde_json::from_str(json).ok()
}
