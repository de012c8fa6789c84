//! Semantic version types and constraint ranges.
//!
//! `VersionReq` parses npm/cargo style requirement expressions (`^1.2`, `~3.1.0`,
//! `>=16 <20`, `18.x`, `1.0.0 - 2.0.0`). Every requirement collapses into a single
//! contiguous [`VersionRange`], which makes intersection and emptiness checks cheap.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use crate::error::SproutError;

/// Semantic version (major.minor.patch-prerelease+build)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// Version requirement: all comparators must hold
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionReq {
    pub comparators: Vec<Comparator>,
}

/// Individual version comparator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub version: PartialVersion,
}

/// Comparison operator for version requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exact,     // =1.0.0, 1.x
    Greater,   // >1.0.0
    GreaterEq, // >=1.0.0
    Less,      // <1.0.0
    LessEq,    // <=1.0.0
    Tilde,     // ~1.0.0
    Caret,     // ^1.0.0
    Wildcard,  // *
}

/// Partial version for comparisons (may have missing components)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialVersion {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub prerelease: Option<String>,
}

/// Contiguous interval of versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: Bound<Version>,
    pub upper: Bound<Version>,
}

const OPERATORS: [&str; 7] = [">=", "<=", ">", "<", "=", "^", "~"];

fn invalid(input: &str, reason: impl Into<String>) -> SproutError {
    SproutError::InvalidVersion {
        input: input.to_string(),
        reason: reason.into(),
    }
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "*" | "x" | "X")
}

fn parse_component(part: &str, input: &str) -> Result<u64, SproutError> {
    part.parse()
        .map_err(|_| invalid(input, format!("'{}' is not a number", part)))
}

fn valid_identifiers(text: &str) -> bool {
    text.split('.').all(|ident| {
        !ident.is_empty() && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Check if this version satisfies a version requirement
    pub fn satisfies(&self, req: &VersionReq) -> bool {
        req.matches(self)
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// The lowest possible prerelease of this version, `X.Y.Z-0`
    ///
    /// Used as an exclusive upper bound so that `<2.0.0` and `^1` stay clear
    /// of `2.0.0-alpha.1`.
    pub fn prerelease_floor(&self) -> Self {
        Self {
            prerelease: Some("0".to_string()),
            build: None,
            ..Self::new(self.major, self.minor, self.patch)
        }
    }

    /// The smallest release strictly greater than this one
    pub fn next_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch.saturating_add(1))
    }

    /// SemVer precedence, which ignores build metadata
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        match (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less, // prerelease < normal
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            },
            other => other,
        }
    }
}

/// Identifier-wise prerelease ordering: numeric identifiers sort numerically
/// and below alphanumeric ones, shorter sets sort first.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl FromStr for Version {
    type Err = SproutError;

    /// Parses `1.2.3`, `v1.2.3`, `1.2.3-rc.1+build.5`. Missing minor/patch
    /// components (`3.11`, `18`) are filled with zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let trimmed = input.strip_prefix('v').unwrap_or(input);

        // Split on '+' for build metadata
        let (version_part, build) = match trimmed.split_once('+') {
            Some((v, b)) => (v, Some(b.to_string())),
            None => (trimmed, None),
        };

        // Split on '-' for prerelease
        let (core_part, prerelease) = match version_part.split_once('-') {
            Some((c, p)) => (c, Some(p.to_string())),
            None => (version_part, None),
        };

        if prerelease.as_deref().is_some_and(|p| !valid_identifiers(p)) {
            return Err(invalid(input, "malformed prerelease identifier"));
        }
        if build.as_deref().is_some_and(|b| !valid_identifiers(b)) {
            return Err(invalid(input, "malformed build metadata"));
        }

        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid(input, "expected at most three numeric components"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = parse_component(part, input)?;
        }

        Ok(Version {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            prerelease,
            build,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = SproutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::from_str(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // build metadata only breaks ties so that Ord agrees with Eq
        self.cmp_precedence(other)
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl VersionReq {
    /// Requirement matched by every version
    pub fn any() -> Self {
        Self {
            comparators: Vec::new(),
        }
    }

    /// Requirement matched only by `version`
    pub fn exact(version: &Version) -> Self {
        Self {
            comparators: vec![Comparator {
                op: Op::Exact,
                version: PartialVersion::from_version(version),
            }],
        }
    }

    /// Parse a version requirement string
    pub fn parse(input: &str) -> Result<Self, SproutError> {
        let normalized = input
            .trim()
            .replace('≥', ">=")
            .replace('≤', "<=")
            .replace(',', " ");
        if normalized.contains("||") {
            return Err(invalid(
                input,
                "disjunctions ('||') are not supported; declare a single range",
            ));
        }
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        // Hyphen range: "1.0.0 - 2.0.0"
        if tokens.len() == 3 && tokens[1] == "-" {
            return Ok(Self {
                comparators: vec![
                    Comparator::new(Op::GreaterEq, PartialVersion::from_str(tokens[0])?),
                    Comparator::new(Op::LessEq, PartialVersion::from_str(tokens[2])?),
                ],
            });
        }

        let mut comparators = Vec::new();
        let mut pending_op: Option<&str> = None;
        for token in tokens {
            if OPERATORS.contains(&token) {
                if let Some(op) = pending_op {
                    return Err(invalid(input, format!("operator '{}' has no version", op)));
                }
                pending_op = Some(token);
                continue;
            }

            let text = match pending_op.take() {
                Some(op) => format!("{op}{token}"),
                None => token.to_string(),
            };
            let comparator = Comparator::parse(&text)?;
            if comparator.op != Op::Wildcard {
                comparators.push(comparator);
            }
        }

        if let Some(op) = pending_op {
            return Err(invalid(input, format!("operator '{}' has no version", op)));
        }

        Ok(Self { comparators })
    }

    /// Check if a version matches this requirement
    pub fn matches(&self, version: &Version) -> bool {
        self.range().contains(version)
    }

    /// Whether this requirement places no restriction at all
    pub fn is_any(&self) -> bool {
        self.comparators.is_empty()
    }

    /// The interval of versions accepted by this requirement
    pub fn range(&self) -> VersionRange {
        self.comparators
            .iter()
            .fold(VersionRange::full(), |acc, comp| acc.intersect(&comp.range()))
    }

    /// Whether any version at all can satisfy this requirement
    pub fn is_satisfiable(&self) -> bool {
        !self.range().is_empty()
    }

    /// Combine two requirements; the result matches versions accepted by both
    pub fn and(&self, other: &VersionReq) -> VersionReq {
        let mut comparators = self.comparators.clone();
        for comp in &other.comparators {
            if !comparators.contains(comp) {
                comparators.push(comp.clone());
            }
        }
        VersionReq { comparators }
    }
}

impl FromStr for VersionReq {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionReq::parse(s)
    }
}

impl TryFrom<String> for VersionReq {
    type Error = SproutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VersionReq::parse(&value)
    }
}

impl From<VersionReq> for String {
    fn from(req: VersionReq) -> Self {
        req.to_string()
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comparators.is_empty() {
            return write!(f, "*");
        }
        let parts: Vec<String> = self.comparators.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl Comparator {
    /// Create a comparator from its parts
    pub fn new(op: Op, version: PartialVersion) -> Self {
        Self { op, version }
    }

    fn parse(text: &str) -> Result<Self, SproutError> {
        let (op, rest) = if let Some(stripped) = text.strip_prefix(">=") {
            (Op::GreaterEq, stripped)
        } else if let Some(stripped) = text.strip_prefix("<=") {
            (Op::LessEq, stripped)
        } else if let Some(stripped) = text.strip_prefix('>') {
            (Op::Greater, stripped)
        } else if let Some(stripped) = text.strip_prefix('<') {
            (Op::Less, stripped)
        } else if let Some(stripped) = text.strip_prefix('=') {
            (Op::Exact, stripped)
        } else if let Some(stripped) = text.strip_prefix('^') {
            (Op::Caret, stripped)
        } else if let Some(stripped) = text.strip_prefix('~') {
            (Op::Tilde, stripped)
        } else {
            (Op::Exact, text)
        };

        if is_wildcard(rest.trim()) {
            return Ok(Self::new(Op::Wildcard, PartialVersion::zero()));
        }

        Ok(Self::new(op, PartialVersion::from_str(rest)?))
    }

    /// Check if a version matches this comparator
    pub fn matches(&self, version: &Version) -> bool {
        self.range().contains(version)
    }

    /// The interval of versions accepted by this comparator
    pub fn range(&self) -> VersionRange {
        use Bound::{Excluded, Included, Unbounded};

        let floor = self.version.floor();
        let full = self.version.is_full();
        match self.op {
            Op::Wildcard => VersionRange::full(),
            Op::Exact if full => VersionRange::exact(floor),
            Op::Exact => VersionRange::new(Included(floor), Excluded(self.version.next_boundary().prerelease_floor())),
            Op::GreaterEq => VersionRange::new(Included(floor), Unbounded),
            // >1 means >=2.0.0, >1.2 means >=1.3.0
            Op::Greater if full => VersionRange::new(Excluded(floor), Unbounded),
            Op::Greater => VersionRange::new(Included(self.version.next_boundary()), Unbounded),
            Op::Less if floor.is_prerelease() => VersionRange::new(Unbounded, Excluded(floor)),
            Op::Less => VersionRange::new(Unbounded, Excluded(floor.prerelease_floor())),
            Op::LessEq if full => VersionRange::new(Unbounded, Included(floor)),
            Op::LessEq => VersionRange::new(Unbounded, Excluded(self.version.next_boundary().prerelease_floor())),
            Op::Tilde => {
                let upper = match self.version.minor {
                    Some(minor) => Version::new(self.version.major, minor.saturating_add(1), 0),
                    None => Version::new(self.version.major.saturating_add(1), 0, 0),
                };
                VersionRange::new(Included(floor), Excluded(upper.prerelease_floor()))
            }
            Op::Caret => VersionRange::new(Included(floor), Excluded(self.version.caret_upper().prerelease_floor())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.op {
            Op::Wildcard => return write!(f, "*"),
            Op::Exact if !self.version.is_full() => return write!(f, "{}.x", self.version),
            Op::Exact => "=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Tilde => "~",
            Op::Caret => "^",
        };
        write!(f, "{}{}", symbol, self.version)
    }
}

impl PartialVersion {
    fn zero() -> Self {
        Self {
            major: 0,
            minor: None,
            patch: None,
            prerelease: None,
        }
    }

    /// Lift a complete version into a partial one
    pub fn from_version(version: &Version) -> Self {
        Self {
            major: version.major,
            minor: Some(version.minor),
            patch: Some(version.patch),
            prerelease: version.prerelease.clone(),
        }
    }

    /// Whether all three numeric components are present
    pub fn is_full(&self) -> bool {
        self.minor.is_some() && self.patch.is_some()
    }

    /// Convert to a full version (filling missing parts with 0)
    pub fn floor(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            prerelease: self.prerelease.clone(),
            build: None,
        }
    }

    /// First version past everything this partial version covers
    fn next_boundary(&self) -> Version {
        match (self.minor, self.patch) {
            (Some(minor), Some(patch)) => Version::new(self.major, minor, patch.saturating_add(1)),
            (Some(minor), None) => Version::new(self.major, minor.saturating_add(1), 0),
            (None, _) => Version::new(self.major.saturating_add(1), 0, 0),
        }
    }

    fn caret_upper(&self) -> Version {
        match (self.major, self.minor, self.patch) {
            (0, Some(0), Some(patch)) => Version::new(0, 0, patch.saturating_add(1)),
            (0, Some(minor), _) => Version::new(0, minor.saturating_add(1), 0),
            (major, _, _) => Version::new(major.saturating_add(1), 0, 0),
        }
    }
}

impl FromStr for PartialVersion {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let trimmed = input.strip_prefix('v').unwrap_or(input);
        let core_and_pre = trimmed.split_once('+').map_or(trimmed, |(v, _)| v);
        let (core, prerelease) = match core_and_pre.split_once('-') {
            Some((c, p)) => (c, Some(p.to_string())),
            None => (core_and_pre, None),
        };

        let mut components = core.split('.');
        let major_text = components.next().unwrap_or_default();
        if is_wildcard(major_text) {
            return Err(invalid(input, "a wildcard major version must be written as '*'"));
        }
        let major = parse_component(major_text, input)?;

        let minor = match components.next() {
            None => None,
            Some(part) if is_wildcard(part) => None,
            Some(part) => Some(parse_component(part, input)?),
        };
        let patch = match components.next() {
            None => None,
            Some(part) if is_wildcard(part) => None,
            Some(part) if minor.is_none() => {
                return Err(invalid(input, format!("patch '{}' follows a wildcard minor", part)));
            }
            Some(part) => Some(parse_component(part, input)?),
        };
        if components.next().is_some() {
            return Err(invalid(input, "expected at most three numeric components"));
        }
        if prerelease.is_some() && patch.is_none() {
            return Err(invalid(input, "prerelease tags require a full version"));
        }
        if prerelease.as_deref().is_some_and(|p| !valid_identifiers(p)) {
            return Err(invalid(input, "malformed prerelease identifier"));
        }

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

impl fmt::Display for PartialVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
            if let Some(patch) = self.patch {
                write!(f, ".{}", patch)?;
            }
        }
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl VersionRange {
    /// Create a range from explicit bounds
    pub fn new(lower: Bound<Version>, upper: Bound<Version>) -> Self {
        Self { lower, upper }
    }

    /// Range covering every version
    pub fn full() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// Range covering exactly one version
    pub fn exact(version: Version) -> Self {
        Self::new(Bound::Included(version.clone()), Bound::Included(version))
    }

    /// Check whether `version` lies inside the range
    ///
    /// Bounds compare by precedence, so `=1.0.0` contains `1.0.0+linux`.
    pub fn contains(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lower) => version.cmp_precedence(lower) != Ordering::Less,
            Bound::Excluded(lower) => version.cmp_precedence(lower) == Ordering::Greater,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(upper) => version.cmp_precedence(upper) != Ordering::Greater,
            Bound::Excluded(upper) => version.cmp_precedence(upper) == Ordering::Less,
        };
        above && below
    }

    /// Whether no version can lie inside the range
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(lower), Bound::Included(upper)) => lower.cmp_precedence(upper) == Ordering::Greater,
            (Bound::Included(lower), Bound::Excluded(upper))
            | (Bound::Excluded(lower), Bound::Included(upper))
            | (Bound::Excluded(lower), Bound::Excluded(upper)) => lower.cmp_precedence(upper) != Ordering::Less,
        }
    }

    /// Intersection of two ranges
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        VersionRange {
            lower: tighter_lower(&self.lower, &other.lower),
            upper: tighter_upper(&self.upper, &other.upper),
        }
    }

    /// The smallest release version inside the range, if any
    pub fn lowest_version(&self) -> Option<Version> {
        let candidate = match &self.lower {
            Bound::Unbounded => Version::new(0, 0, 0),
            Bound::Included(lower) => lower.clone(),
            Bound::Excluded(lower) => lower.next_patch(),
        };
        self.contains(&candidate).then_some(candidate)
    }
}

fn later<'a>(x: &'a Version, y: &'a Version) -> &'a Version {
    if y.cmp_precedence(x) == Ordering::Greater {
        y
    } else {
        x
    }
}

fn earlier<'a>(x: &'a Version, y: &'a Version) -> &'a Version {
    if y.cmp_precedence(x) == Ordering::Less {
        y
    } else {
        x
    }
}

fn tighter_lower(a: &Bound<Version>, b: &Bound<Version>) -> Bound<Version> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(later(x, y).clone()),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(later(x, y).clone()),
        (Bound::Included(inc), Bound::Excluded(exc)) | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc.cmp_precedence(exc) == Ordering::Greater {
                Bound::Included(inc.clone())
            } else {
                Bound::Excluded(exc.clone())
            }
        }
    }
}

fn tighter_upper(a: &Bound<Version>, b: &Bound<Version>) -> Bound<Version> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(earlier(x, y).clone()),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(earlier(x, y).clone()),
        (Bound::Included(inc), Bound::Excluded(exc)) | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc.cmp_precedence(exc) == Ordering::Less {
                Bound::Included(inc.clone())
            } else {
                Bound::Excluded(exc.clone())
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Bound::Included(lower), Bound::Included(upper)) = (&self.lower, &self.upper) {
            if lower == upper {
                return write!(f, "={}", lower);
            }
        }

        let lower = match &self.lower {
            Bound::Unbounded => None,
            Bound::Included(v) => Some(format!(">={}", v)),
            Bound::Excluded(v) => Some(format!(">{}", v)),
        };
        let upper = match &self.upper {
            Bound::Unbounded => None,
            Bound::Included(v) => Some(format!("<={}", v)),
            Bound::Excluded(v) => Some(format!("<{}", v)),
        };
        match (lower, upper) {
            (None, None) => write!(f, "*"),
            (Some(l), None) => write!(f, "{}", l),
            (None, Some(u)) => write!(f, "{}", u),
            (Some(l), Some(u)) => write!(f, "{} {}", l, u),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn version_round_trip(
            major in 0u64..1000,
            minor in 0u64..1000,
            patch in 0u64..1000,
            prerelease in prop::option::of("[a-z0-9]{1,8}(\\.[a-z0-9]{1,8}){0,2}"),
            build in prop::option::of("[a-z0-9]{1,8}")
        ) {
            let original = Version { major, minor, patch, prerelease, build };
            let parsed = Version::from_str(&original.to_string()).unwrap();
            prop_assert_eq!(parsed, original);
        }
    }

    proptest! {
        #[test]
        fn version_comparison_transitivity(
            a in (0u64..20, 0u64..20, 0u64..20),
            b in (0u64..20, 0u64..20, 0u64..20),
            c in (0u64..20, 0u64..20, 0u64..20),
        ) {
            let a = Version::new(a.0, a.1, a.2);
            let b = Version::new(b.0, b.1, b.2);
            let c = Version::new(c.0, c.1, c.2);

            if a < b && b < c {
                prop_assert!(a < c, "Transitivity violated: {} < {} < {}", a, b, c);
            }
        }
    }

    // Intersection agrees with matching both requirements
    proptest! {
        #[test]
        fn intersection_matches_conjunction(
            lo in 0u64..10,
            hi in 0u64..10,
            probe in (0u64..12, 0u64..3, 0u64..3),
        ) {
            let left = VersionReq::parse(&format!(">={}", lo)).unwrap();
            let right = VersionReq::parse(&format!("<{}", hi)).unwrap();
            let version = Version::new(probe.0, probe.1, probe.2);

            let range = left.range().intersect(&right.range());
            prop_assert_eq!(
                range.contains(&version),
                left.matches(&version) && right.matches(&version)
            );
            if range.is_empty() {
                prop_assert!(!left.and(&right).matches(&version));
            }
        }
    }
}
