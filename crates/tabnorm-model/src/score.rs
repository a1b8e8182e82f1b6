//! Additive score accounting shared by row and column detection.
//!
//! Detectors return a [`ScorePatch`]. The patch is normalized at the call
//! boundary into target -> delta pairs and folded into a [`ScoreTable`] whose
//! keys are fixed up front. Deltas that cannot be applied are handed back as
//! [`RejectedDelta`] so the caller can report them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A detector's additive contribution to one or more score targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScorePatch {
    /// Shorthand for a delta on the detector's default target.
    Delta(f64),
    /// Explicit target -> delta map.
    Targets(BTreeMap<String, f64>),
}

impl ScorePatch {
    /// A patch that changes nothing.
    pub fn none() -> Self {
        Self::Targets(BTreeMap::new())
    }

    /// A single-target patch.
    pub fn target(name: impl Into<String>, delta: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.into(), delta);
        Self::Targets(map)
    }

    /// Adds a target delta. A shorthand patch is discarded in favor of the
    /// map form since its default target is unknown here.
    #[must_use]
    pub fn and(self, name: impl Into<String>, delta: f64) -> Self {
        let mut map = match self {
            Self::Targets(map) => map,
            Self::Delta(_) => BTreeMap::new(),
        };
        *map.entry(name.into()).or_insert(0.0) += delta;
        Self::Targets(map)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Targets(map) if map.is_empty())
    }

    /// Expands the patch into `(target, delta)` pairs.
    ///
    /// A shorthand delta without a default target yields `(None, delta)`.
    pub fn into_pairs(self, default_target: Option<&str>) -> Vec<(Option<String>, f64)> {
        match self {
            Self::Delta(delta) => vec![(default_target.map(str::to_string), delta)],
            Self::Targets(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        }
    }
}

impl From<f64> for ScorePatch {
    fn from(delta: f64) -> Self {
        Self::Delta(delta)
    }
}

impl From<BTreeMap<String, f64>> for ScorePatch {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self::Targets(map)
    }
}

impl<const N: usize> From<[(&str, f64); N]> for ScorePatch {
    fn from(entries: [(&str, f64); N]) -> Self {
        Self::Targets(
            entries
                .into_iter()
                .map(|(name, delta)| (name.to_string(), delta))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NonFinite,
    UnknownTarget,
    NoDefaultTarget,
}

impl RejectReason {
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NonFinite => "non-finite delta",
            Self::UnknownTarget => "unknown score target",
            Self::NoDefaultTarget => "shorthand delta without a default target",
        }
    }
}

/// A delta that was dropped instead of applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedDelta {
    pub target: Option<String>,
    pub delta: f64,
    pub reason: RejectReason,
}

/// Running score totals over a fixed set of targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    scores: BTreeMap<String, f64>,
}

impl ScoreTable {
    /// Creates a table with every target initialized to zero.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scores: targets.into_iter().map(|t| (t.into(), 0.0)).collect(),
        }
    }

    /// Folds a patch into the totals and returns whatever could not be applied.
    pub fn apply(&mut self, patch: ScorePatch, default_target: Option<&str>) -> Vec<RejectedDelta> {
        let mut rejected = Vec::new();
        for (target, delta) in patch.into_pairs(default_target) {
            let Some(target) = target else {
                rejected.push(RejectedDelta {
                    target: None,
                    delta,
                    reason: RejectReason::NoDefaultTarget,
                });
                continue;
            };
            if !delta.is_finite() {
                rejected.push(RejectedDelta {
                    target: Some(target),
                    delta,
                    reason: RejectReason::NonFinite,
                });
                continue;
            }
            match self.scores.get_mut(&target) {
                Some(total) => *total += delta,
                None => rejected.push(RejectedDelta {
                    target: Some(target),
                    delta,
                    reason: RejectReason::UnknownTarget,
                }),
            }
        }
        rejected
    }

    pub fn get(&self, target: &str) -> f64 {
        self.scores.get(target).copied().unwrap_or(0.0)
    }

    /// Highest-scoring target; ties go to the first target in key order.
    pub fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (target, score) in &self.scores {
            match best {
                Some((_, top)) if *score <= top => {}
                _ => best = Some((target.as_str(), *score)),
            }
        }
        best
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }

    pub fn into_map(self) -> BTreeMap<String, f64> {
        self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
