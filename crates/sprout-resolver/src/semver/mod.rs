//! Version selection and constraint satisfaction
//!
//! Provides the version operations the detector and resolver share:
//! intersecting competing constraints, gathering candidate versions and
//! choosing a compromise when the constraints cannot all be met.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use sprout_core::types::{Version, VersionRange, VersionReq};

use crate::graph::ToolNode;

/// Competing constraints on one tool, keyed by the tool that requires them
#[derive(Debug, Clone, Default)]
pub struct ConstraintSolver {
    constraints: Vec<(String, VersionReq)>,
}

/// Version chosen to satisfy as many requirers as possible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compromise {
    pub version: Version,
    /// Requirers whose constraint the version meets, by ascending id
    pub satisfied: Vec<String>,
    /// Requirers whose constraint the version misses, by ascending id
    pub unsatisfied: Vec<String>,
}

impl ConstraintSolver {
    /// Create new constraint solver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the constraint `requirer` places on the tool
    pub fn add_constraint(&mut self, requirer: impl Into<String>, constraint: VersionReq) {
        self.constraints.push((requirer.into(), constraint));
    }

    pub fn constraints(&self) -> &[(String, VersionReq)] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Intersection of every constraint range
    pub fn intersection(&self) -> VersionRange {
        self.intersection_without(None)
    }

    /// Intersection of every constraint except the one from `skipped`
    pub fn intersection_without(&self, skipped: Option<&str>) -> VersionRange {
        self.constraints
            .iter()
            .filter(|(requirer, _)| Some(requirer.as_str()) != skipped)
            .fold(VersionRange::full(), |range, (_, req)| range.intersect(&req.range()))
    }

    /// Check if some version can meet every constraint
    pub fn is_satisfiable(&self) -> bool {
        !self.intersection().is_empty()
    }

    /// Choose a compromise among `candidates`
    ///
    /// The winner satisfies the largest number of constraints. Ties go to the
    /// highest version when `prefer_latest` is set, otherwise to the lowest.
    /// When no candidate satisfies anything, the newest candidate is returned.
    pub fn compromise(&self, candidates: &[Version], prefer_latest: bool) -> Option<Compromise> {
        let scored: Vec<(usize, &Version)> = candidates
            .iter()
            .map(|version| (self.satisfied_by(version).count(), version))
            .collect();

        let best_score = scored.iter().map(|(score, _)| *score).max()?;

        let version = if best_score == 0 {
            candidates.iter().max()?
        } else {
            let tied = scored
                .iter()
                .filter(|(score, _)| *score == best_score)
                .map(|(_, version)| *version);
            if prefer_latest {
                tied.max()?
            } else {
                tied.min()?
            }
        };

        let mut satisfied: Vec<String> = self.satisfied_by(version).map(str::to_string).collect();
        let mut unsatisfied: Vec<String> = self
            .constraints
            .iter()
            .filter(|(_, req)| !req.matches(version))
            .map(|(requirer, _)| requirer.clone())
            .collect();
        satisfied.sort();
        unsatisfied.sort();

        Some(Compromise {
            version: version.clone(),
            satisfied,
            unsatisfied,
        })
    }

    fn satisfied_by<'a>(&'a self, version: &'a Version) -> impl Iterator<Item = &'a str> + 'a {
        self.constraints
            .iter()
            .filter(move |(_, req)| req.matches(version))
            .map(|(requirer, _)| requirer.as_str())
    }
}

/// Candidate versions for a compromise on `node`
///
/// Known releases (plus the installed version) when the descriptor lists any,
/// otherwise the lowest version of each constraint range together with the
/// bounds declared by the installation methods.
pub fn candidate_versions(node: &ToolNode, solver: &ConstraintSolver) -> Vec<Version> {
    let mut candidates = BTreeSet::new();

    if !node.descriptor.versions.is_empty() {
        candidates.extend(node.descriptor.versions.iter().cloned());
        if node.installation_status.installed {
            candidates.extend(node.installation_status.version.clone());
        }
    } else {
        for (_, req) in solver.constraints() {
            candidates.extend(req.range().lowest_version());
        }
        for method in &node.descriptor.installation_methods {
            candidates.extend(method.min_version.clone());
            candidates.extend(method.max_version.clone());
        }
    }

    candidates.into_iter().collect()
}
