//! Annotation extraction from `test_ended` metrics.
//!
//! The on-device annotation producer reports the annotations of each finished
//! test as the Java rendering of a list of annotation objects:
//!
//! ```text
//! [@org.junit.Test(timeout=0), @com.example.Smoke(level="a, b")]
//! ```

use std::collections::BTreeMap;

use crate::domain::models::{Annotation, TestEvent};

/// Device-side listener that reports test annotations. Its class name is
/// also the prefix of the metrics keys it reports under.
pub const TEST_ANNOTATION_PRODUCER: &str =
    "com.malinskiy.adam.junit4.android.listener.TestAnnotationProducer";

/// Stateless annotation parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationExtractor;

impl AnnotationExtractor {
    pub const fn new() -> Self {
        Self
    }

    /// Annotations reported for a finished test. Any other event, or a
    /// `test_ended` without producer metrics, yields nothing.
    pub fn extract(&self, event: &TestEvent) -> Vec<Annotation> {
        match event {
            TestEvent::TestEnded { metrics, .. } => self.extract_from_metrics(metrics),
            _ => Vec::new(),
        }
    }

    pub fn extract_from_metrics(&self, metrics: &BTreeMap<String, String>) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        for (_, raw) in metrics
            .iter()
            .filter(|(key, _)| key.starts_with(TEST_ANNOTATION_PRODUCER))
        {
            for entry in split_top_level(strip_brackets(raw.trim())) {
                if let Some(annotation) = parse_annotation(entry) {
                    if !annotations.contains(&annotation) {
                        annotations.push(annotation);
                    }
                }
            }
        }
        annotations
    }
}

fn strip_brackets(raw: &str) -> &str {
    raw.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw)
}

/// Split on commas that are not nested in parentheses, brackets or quotes.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

fn parse_annotation(entry: &str) -> Option<Annotation> {
    let entry = entry.strip_prefix('@').unwrap_or(entry).trim();
    let (name, body) = match entry.find('(') {
        Some(open) => {
            let body = entry[open + 1..].strip_suffix(')')?;
            (entry[..open].trim(), Some(body))
        }
        None => (entry, None),
    };
    if !is_qualified_name(name) {
        return None;
    }

    let mut annotation = Annotation::new(name);
    for pair in body.map(split_top_level).unwrap_or_default() {
        // Single-element annotations render as `@Name(value)`
        let (key, value) = pair.split_once('=').unwrap_or(("value", pair));
        annotation
            .values
            .insert(key.trim().to_string(), unquote(value.trim()));
    }
    Some(annotation)
}

fn is_qualified_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map_or_else(|| value.to_string(), |v| v.replace("\\\"", "\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TestIdentifier;

    fn ended_with(value: &str) -> TestEvent {
        let mut metrics = BTreeMap::new();
        metrics.insert(format!("{TEST_ANNOTATION_PRODUCER}.v2"), value.to_string());
        TestEvent::TestEnded {
            id: TestIdentifier::new("com.example.LoginTest", "logsIn"),
            metrics,
        }
    }

    #[test]
    fn test_no_metrics_yields_nothing() {
        let extractor = AnnotationExtractor::new();
        assert!(extractor.extract(&TestEvent::ended("a.B", "m")).is_empty());
    }

    #[test]
    fn test_other_events_yield_nothing() {
        let extractor = AnnotationExtractor::new();
        assert!(extractor.extract(&TestEvent::TestRunEnded).is_empty());
    }

    #[test]
    fn test_extracts_names_and_values() {
        let extractor = AnnotationExtractor::new();
        let annotations = extractor.extract(&ended_with(
            r#"[@org.junit.Test(timeout=0, expected=class org.junit.Test$None), @com.example.Smoke(level="a, b")]"#,
        ));

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].name, "org.junit.Test");
        assert_eq!(annotations[0].values.get("timeout").map(String::as_str), Some("0"));
        assert_eq!(annotations[1].name, "com.example.Smoke");
        assert_eq!(annotations[1].values.get("level").map(String::as_str), Some("a, b"));
    }

    #[test]
    fn test_bare_names_and_single_values() {
        let extractor = AnnotationExtractor::new();
        let annotations =
            extractor.extract(&ended_with("[com.example.Flaky, @com.example.Owner(\"qa\")]"));

        assert_eq!(annotations[0], Annotation::new("com.example.Flaky"));
        assert_eq!(
            annotations[1],
            Annotation::new("com.example.Owner").with_value("value", "qa")
        );
    }

    #[test]
    fn test_skips_malformed_entries() {
        let extractor = AnnotationExtractor::new();
        let annotations = extractor.extract(&ended_with("[@, @com.example.Ok, @bad name(x=1]"));
        assert_eq!(annotations, vec![Annotation::new("com.example.Ok")]);
    }

    #[test]
    fn test_reads_every_producer_key() {
        let mut metrics = BTreeMap::new();
        metrics.insert(TEST_ANNOTATION_PRODUCER.to_string(), "[@com.example.Smoke]".to_string());
        metrics.insert(format!("{TEST_ANNOTATION_PRODUCER}.v2"), "[@com.example.Smoke, @com.example.Slow]".to_string());

        let annotations = AnnotationExtractor::new().extract_from_metrics(&metrics);
        assert_eq!(
            annotations,
            vec![Annotation::new("com.example.Smoke"), Annotation::new("com.example.Slow")]
        );
    }

    #[test]
    fn test_ignores_unrelated_metrics() {
        let mut metrics = BTreeMap::new();
        metrics.insert("stream".to_string(), "[@com.example.Smoke]".to_string());
        assert!(AnnotationExtractor::new().extract_from_metrics(&metrics).is_empty());
    }
}
