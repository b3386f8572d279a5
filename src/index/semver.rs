use semver::{Version, VersionReq};

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros,
/// and strips a leading 'v'.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "v1.2" -> Version(1, 2, 0)
/// - "1.2.3-rc.1" -> Version(1, 2, 3, pre: rc.1)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// A version range expression.
///
/// Accepts comma- or whitespace-separated comparators (`>=1.2.0 <2.0.0`,
/// `>=1.2.0, <2.0.0`), caret/tilde/wildcard requirements, and `||` between
/// alternative ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    alternatives: Vec<VersionReq>,
}

impl Constraint {
    pub fn parse(expr: &str) -> Option<Self> {
        let alternatives = expr
            .split("||")
            .map(|alternative| VersionReq::parse(&join_comparators(alternative)).ok())
            .collect::<Option<Vec<_>>>()?;

        Some(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Rewrite whitespace-separated comparators into the comma-separated form
/// `VersionReq` expects, keeping a bare operator attached to its version
/// (`>= 1.2.0` stays one comparator).
///
/// A version without an operator is an exact pin (`1.2.1` means `=1.2.1`),
/// unlike Cargo's default caret reading.
fn join_comparators(alternative: &str) -> String {
    let mut comparators: Vec<String> = Vec::new();
    for token in alternative.split_whitespace() {
        let token = token.trim_matches(',');
        if token.is_empty() {
            continue;
        }
        match comparators.last_mut() {
            Some(last) if is_bare_operator(last) => last.push_str(token),
            _ => comparators.push(token.to_string()),
        }
    }
    comparators
        .iter()
        .map(|comparator| {
            if is_exact_pin(comparator) {
                format!("={}", comparator)
            } else {
                comparator.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_bare_operator(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^'))
}

/// Operator-less version with no wildcard component
fn is_exact_pin(comparator: &str) -> bool {
    comparator.starts_with(|c: char| c.is_ascii_digit())
        && !comparator
            .split(['.', '-', '+'])
            .take(3)
            .any(|part| matches!(part, "x" | "X" | "*"))
}
