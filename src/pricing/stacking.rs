//! Stacking Policies

use std::fmt;

use serde::Deserialize;

use crate::discounts::CandidateDiscount;

/// Decides whether a candidate may join the discounts already applied.
pub trait StackingPolicy: fmt::Debug + Send + Sync {
    /// Whether `candidate` may be applied on top of `applied`.
    fn admits(&self, candidate: &CandidateDiscount, applied: &[CandidateDiscount]) -> bool;
}

/// Default policy: no two applied discounts share a kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameKindExclusion;

impl StackingPolicy for SameKindExclusion {
    fn admits(&self, candidate: &CandidateDiscount, applied: &[CandidateDiscount]) -> bool {
        applied.iter().all(|other| other.kind != candidate.kind)
    }
}

/// Same-kind exclusion plus the per-rule allow-lists, checked in both directions.
///
/// A candidate joins only if its own allow-list admits every applied kind and every applied
/// discount's allow-list admits the candidate's kind. Discounts without an allow-list admit
/// everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowListStacking;

impl StackingPolicy for AllowListStacking {
    fn admits(&self, candidate: &CandidateDiscount, applied: &[CandidateDiscount]) -> bool {
        SameKindExclusion.admits(candidate, applied)
            && applied.iter().all(|other| {
                let forward = candidate
                    .stacking
                    .as_ref()
                    .is_none_or(|rules| rules.permits(&other.kind));

                let backward = other
                    .stacking
                    .as_ref()
                    .is_none_or(|rules| rules.permits(&candidate.kind));

                forward && backward
            })
    }
}

/// Configurable choice of stacking policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingMode {
    /// [`SameKindExclusion`]
    #[default]
    SameKind,

    /// [`AllowListStacking`]
    AllowList,
}

impl StackingMode {
    /// The policy this mode selects.
    pub fn policy(self) -> &'static dyn StackingPolicy {
        match self {
            StackingMode::SameKind => &SameKindExclusion,
            StackingMode::AllowList => &AllowListStacking,
        }
    }
}
