//! Terminal and CI environment detection.

use std::ffi::OsString;
use std::io::IsTerminal;

/// Variables set by common CI providers
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TRAVIS",
    "CIRCLECI",
    "TF_BUILD",
];

/// Whether we're running under a CI provider.
pub fn is_ci() -> bool {
    ci_from(|key| std::env::var_os(key))
}

fn ci_from(lookup: impl Fn(&str) -> Option<OsString>) -> bool {
    CI_VARS.iter().any(|key| {
        lookup(key).is_some_and(|value| !value.is_empty() && value != "false" && value != "0")
    })
}

/// Prompts are skipped with `--yes`, under CI, or when stdin is not a TTY.
pub fn is_silent(yes: bool) -> bool {
    yes || is_ci() || !std::io::stdin().is_terminal()
}

/// Whether a full-screen menu can be drawn (both ends are terminals).
pub fn supports_menu() -> bool {
    std::io::stdin().is_terminal() && console::Term::stderr().is_term() && console::user_attended()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_ci_detected_from_any_provider() {
        assert!(ci_from(lookup(&[("GITHUB_ACTIONS", "true")])));
        assert!(ci_from(lookup(&[("JENKINS_URL", "https://ci.example.com")])));
        assert!(ci_from(lookup(&[("CI", "1")])));
    }

    #[test]
    fn test_ci_ignores_empty_and_false() {
        assert!(!ci_from(lookup(&[])));
        assert!(!ci_from(lookup(&[("CI", "")])));
        assert!(!ci_from(lookup(&[("CI", "false")])));
        assert!(!ci_from(lookup(&[("CI", "0"), ("HOME", "/root")])));
    }

    #[test]
    fn test_yes_forces_silent() {
        assert!(is_silent(true));
    }
}
