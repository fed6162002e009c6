//! Shared test helpers: an in-memory data source and exposition parsing.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use vsa_exporter::collectors::{Collector, CommonLabels};
use vsa_exporter::metrics::MetricsRegistry;
use vsa_exporter::vsa::DataSource;

/// Data source answering from a path → document map; unknown paths are absent
#[derive(Default)]
pub struct FakeSource {
    documents: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(path: &str, document: Value) -> Self {
        let source = Self::new();
        source.set(path, document);
        source
    }

    pub fn set(&self, path: &str, document: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_string(), document);
    }

    pub fn remove(&self, path: &str) {
        self.documents.lock().unwrap().remove(path);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn get(&self, path: &str) -> Option<Value> {
        self.requests.lock().unwrap().push(path.to_string());
        self.documents.lock().unwrap().get(path).cloned()
    }
}

/// Create a registry and define `collector` on it with the default common labels
pub fn defined<C: Collector>(mut collector: C) -> (C, MetricsRegistry) {
    let metrics = MetricsRegistry::new().expect("Failed to create metrics");
    collector
        .define(&CommonLabels::default(), &metrics)
        .expect("Failed to define metrics");
    (collector, metrics)
}

/// One parsed sample line of the text exposition
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub value: f64,
}

/// Parse the sample lines of a text exposition (label values must not contain `,` or `"`)
pub fn samples(rendered: &str) -> Vec<Sample> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
        .map(|line| {
            let (series, value) = line.rsplit_once(' ').expect("sample without value");
            let (name, labels) = match series.split_once('{') {
                Some((name, rest)) => (name, rest.trim_end_matches('}')),
                None => (series, ""),
            };
            let labels = labels
                .split(',')
                .filter(|pair| !pair.is_empty())
                .map(|pair| {
                    let (k, v) = pair.split_once('=').expect("label without value");
                    (k.to_string(), v.trim_matches('"').to_string())
                })
                .collect();
            Sample {
                name: name.to_string(),
                labels,
                value: value.parse().expect("non-numeric sample value"),
            }
        })
        .collect()
}

/// Samples of metric `name` carrying every label in `labels`
pub fn find(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Vec<Sample> {
    samples(rendered)
        .into_iter()
        .filter(|s| s.name == name)
        .filter(|s| {
            labels
                .iter()
                .all(|(k, v)| s.labels.get(*k).map(String::as_str) == Some(*v))
        })
        .collect()
}

/// Value of the single sample of `name` matching `labels`
pub fn value(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let found = find(rendered, name, labels);
    assert!(
        found.len() <= 1,
        "expected at most one {} sample for {:?}, found {}",
        name,
        labels,
        found.len()
    );
    found.first().map(|s| s.value)
}
