//! Workflow shape detection.
//!
//! Pure text scan: sequencing phrases imply a sequential chain,
//! concurrency phrases a parallel batch, iteration phrases a loop. A
//! request with list markers but no phrase match defaults to sequential.
//! No match at all means direct single-worker dispatch.

use crate::domain::models::WorkflowKind;

const SEQUENTIAL_PHRASES: &[&str] = &["then", "after", "followed by", "step by step"];
const PARALLEL_PHRASES: &[&str] = &["simultaneously", "at the same time", "in parallel"];
const LOOP_PHRASES: &[&str] = &["for each", "iterate", "repeat", "until"];

/// Detector over the phrase tables above.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkflowClassifier;

impl WorkflowClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Detect the workflow shape a request implies, if any.
    pub fn detect(&self, request: &str) -> Option<WorkflowKind> {
        let lower = request.to_lowercase();

        if contains_any_word(&lower, SEQUENTIAL_PHRASES) {
            return Some(WorkflowKind::Sequential);
        }
        if contains_any_word(&lower, PARALLEL_PHRASES) {
            return Some(WorkflowKind::Parallel);
        }
        if contains_any_word(&lower, LOOP_PHRASES) {
            return Some(WorkflowKind::Loop);
        }
        if has_list_markers(request) {
            return Some(WorkflowKind::Sequential);
        }
        None
    }

    /// Split a request into step instructions for a detected chain.
    ///
    /// List items become one step each; otherwise the text is split on
    /// sequencing phrases. A request that refuses to split cleanly becomes
    /// a single step.
    pub fn split_steps(&self, request: &str) -> Vec<String> {
        let items = list_items(request);
        if items.len() > 1 {
            return items;
        }

        let mut parts = vec![request.to_string()];
        for phrase in &["then", "after that", "followed by"] {
            parts = parts
                .into_iter()
                .flat_map(|part| split_on_phrase(&part, phrase))
                .collect();
        }
        parts
            .into_iter()
            .map(|p| p.trim().trim_matches(',').trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Split a request into independent instructions for a parallel batch.
    pub fn split_branches(&self, request: &str) -> Vec<String> {
        let items = list_items(request);
        if items.len() > 1 {
            return items;
        }

        let (lower, offsets) = lowercase_with_offsets(request);
        for phrase in PARALLEL_PHRASES {
            if let Some(idx) = lower.find(phrase) {
                // "A, B and C in parallel" -> branch on the prefix.
                let prefix = &request[..offsets[idx]];
                let branches: Vec<String> = prefix
                    .split([',', ';'])
                    .flat_map(|s| s.split(" and "))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if branches.len() > 1 {
                    return branches;
                }
            }
        }
        vec![request.to_string()]
    }
}

/// Word-boundary-aware search for any of the phrases.
fn contains_any_word(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| {
        lower.match_indices(phrase).any(|(idx, _)| {
            let before_ok = idx == 0
                || !lower[..idx]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_alphanumeric);
            let end = idx + phrase.len();
            let after_ok = end == lower.len()
                || !lower[end..].chars().next().is_some_and(char::is_alphanumeric);
            before_ok && after_ok
        })
    })
}

fn split_on_phrase(text: &str, phrase: &str) -> Vec<String> {
    let (lower, offsets) = lowercase_with_offsets(text);
    let needle = format!(" {phrase} ");
    let mut parts = Vec::new();
    let mut rest_start = 0;
    let mut search_from = 0;
    while let Some(rel) = lower[search_from..].find(&needle) {
        let idx = search_from + rel;
        parts.push(text[rest_start..offsets[idx]].to_string());
        rest_start = offsets[idx + needle.len()];
        search_from = idx + needle.len();
    }
    parts.push(text[rest_start..].to_string());
    parts
}

/// Lowercase `text` and record, for every byte of the lowered copy, the
/// offset of the original character it came from. Lowercasing can change
/// byte length ('İ' lowers to a two-character sequence), so an offset found
/// in the copy must be mapped back before slicing the original.
fn lowercase_with_offsets(text: &str) -> (String, Vec<usize>) {
    let mut lower = String::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (idx, ch) in text.char_indices() {
        for low in ch.to_lowercase() {
            lower.push(low);
            while offsets.len() < lower.len() {
                offsets.push(idx);
            }
        }
    }
    offsets.push(text.len());
    (lower, offsets)
}

/// Lines that look like numbered items or bullets.
fn list_items(request: &str) -> Vec<String> {
    request
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = strip_list_marker(trimmed)?;
            let rest = rest.trim();
            if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            }
        })
        .collect()
}

fn strip_list_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some(rest);
    }
    let digits: usize = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let after = &line[digits..];
    after.strip_prefix('.').or_else(|| after.strip_prefix(')'))
}

fn has_list_markers(request: &str) -> bool {
    list_items(request).len() > 1
}
