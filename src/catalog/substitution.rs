//! `$name` placeholder substitution in catalog text

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

lazy_static! {
    /// `$name` placeholder, as used in catalog audit commands
    static ref PLACEHOLDER: Regex = Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();
}

/// Catalog text after substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub text: String,
    /// Names of the placeholders that were replaced
    pub applied: BTreeSet<String>,
}

impl Substituted {
    /// Values of applied placeholders whose name ends in `bin`
    pub fn binaries<'a>(&'a self, values: &'a BTreeMap<String, String>) -> Vec<&'a str> {
        self.applied
            .iter()
            .filter(|name| name.ends_with("bin"))
            .filter_map(|name| values.get(name).map(String::as_str))
            .collect()
    }
}

/// Replace every `$name` whose name is a key of `values`.
///
/// Unknown placeholders, including shell variables like `$HOME` or
/// `$(...)` command substitutions, are left as written.
pub fn substitute(text: &str, values: &BTreeMap<String, String>) -> Substituted {
    let mut applied = BTreeSet::new();
    let mut unknown = BTreeSet::new();

    let replaced = PLACEHOLDER.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        match values.get(name) {
            Some(value) => {
                applied.insert(name.to_string());
                value.clone()
            }
            None => {
                unknown.insert(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !unknown.is_empty() {
        debug!(?unknown, "Placeholders without a substitution value");
    }

    Substituted {
        text: replaced.into_owned(),
        applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> BTreeMap<String, String> {
        [
            ("kubeletbin", "kubelet"),
            ("kubeletconf", "/var/lib/kubelet/config.yaml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_substitutes_known_names() {
        let out = substitute(
            "ps -ef | grep $kubeletbin | grep -v grep; cat $kubeletconf",
            &values(),
        );
        assert_eq!(
            out.text,
            "ps -ef | grep kubelet | grep -v grep; cat /var/lib/kubelet/config.yaml"
        );
        assert_eq!(out.applied.len(), 2);
    }

    #[test]
    fn test_leaves_unknown_names() {
        let out = substitute("echo $HOME $(id -u) $kubeletbin", &values());
        assert_eq!(out.text, "echo $HOME $(id -u) kubelet");
        assert!(out.applied.contains("kubeletbin"));
        assert!(!out.applied.contains("HOME"));
    }

    #[test]
    fn test_binaries_only_lists_applied_bin_names() {
        let vals = values();
        let out = substitute("grep $kubeletbin", &vals);
        assert_eq!(out.binaries(&vals), vec!["kubelet"]);

        let out = substitute("cat $kubeletconf", &vals);
        assert!(out.binaries(&vals).is_empty());
    }
}
