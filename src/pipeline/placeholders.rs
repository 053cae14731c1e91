// src/pipeline/placeholders.rs

//! Substitution of captured output into later step arguments.

use std::collections::BTreeMap;

/// Placeholder token -> captured text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `captured` for `token`, minus trailing line breaks.
    ///
    /// Empty tokens are ignored.
    pub fn set(&mut self, token: &str, captured: &str) {
        if token.is_empty() {
            return;
        }
        let value = captured.trim_end_matches(['\n', '\r']);
        self.values.insert(token.to_string(), value.to_string());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every known token in `arg`.
    ///
    /// Single left-to-right pass: substituted text is never rescanned, and
    /// when two tokens match at the same position the longer one wins.
    pub fn substitute(&self, arg: &str) -> String {
        if self.values.is_empty() {
            return arg.to_string();
        }

        let mut out = String::with_capacity(arg.len());
        let mut rest = arg;

        while !rest.is_empty() {
            let next = self
                .values
                .iter()
                .filter_map(|(token, value)| rest.find(token.as_str()).map(|pos| (pos, token, value)))
                .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())));

            match next {
                Some((pos, token, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + token.len()..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        }

        out
    }

    pub fn substitute_all(&self, args: &[String]) -> Vec<String> {
        args.iter().map(|arg| self.substitute(arg)).collect()
    }
}
