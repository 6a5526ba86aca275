//! Rank Assigner: standard competition ranking ("1224") over composite
//! scores.
//!
//! This is the only place rank numbers are computed. Locked entries take part
//! in the ordering with their frozen score, but their own rank fields are
//! never written here.

use std::collections::HashMap;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::entry::{RankingEntry, Ranks};

/// The scope a rank is computed within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RankDimension {
  /// Same sport and graduation year.
  Overall,
  /// Overall cohort narrowed to the same position.
  Position,
  /// Overall cohort narrowed to the same state.
  State,
  /// Same sport, any graduation year.
  National,
}

type GroupKey<'a> = (&'a str, Option<i32>, Option<&'a str>);

impl RankDimension {
  /// The group `entry` is ranked within, or `None` if the entry lacks the
  /// data this dimension needs.
  fn group_key(self, entry: &RankingEntry) -> Option<GroupKey<'_>> {
    let sport = entry.sport.as_str();
    match self {
      Self::Overall => Some((sport, entry.graduation_year, None)),
      Self::Position => {
        entry.position.as_deref().map(|p| (sport, entry.graduation_year, Some(p)))
      }
      Self::State => entry.state.as_deref().map(|s| (sport, entry.graduation_year, Some(s))),
      Self::National => Some((sport, None, None)),
    }
  }

  pub fn get(self, ranks: &Ranks) -> Option<u32> {
    match self {
      Self::Overall => ranks.overall,
      Self::Position => ranks.position,
      Self::State => ranks.state,
      Self::National => ranks.national,
    }
  }

  fn set(self, ranks: &mut Ranks, value: Option<u32>) {
    match self {
      Self::Overall => ranks.overall = value,
      Self::Position => ranks.position = value,
      Self::State => ranks.state = value,
      Self::National => ranks.national = value,
    }
  }
}

/// Competition ranks for `scores`, aligned with the input.
///
/// Higher scores rank first. Equal scores share the rank of the first member
/// of their group and the next distinct score resumes at
/// `previous_rank + group_size`. `None` scores get `None`.
pub fn competition_ranks(scores: &[Option<f64>]) -> Vec<Option<u32>> {
  let mut order: Vec<(usize, f64)> =
    scores.iter().enumerate().filter_map(|(i, s)| s.map(|s| (i, s))).collect();
  order.sort_by(|a, b| b.1.total_cmp(&a.1));

  let mut ranks = vec![None; scores.len()];
  let mut current_rank = 0u32;
  let mut previous: Option<f64> = None;
  for (position, (index, score)) in order.into_iter().enumerate() {
    if previous != Some(score) {
      current_rank = position as u32 + 1;
      previous = Some(score);
    }
    ranks[index] = Some(current_rank);
  }
  ranks
}

/// Recompute every rank dimension for the unlocked entries in `entries`.
///
/// `entries` should hold every entry of the sport being ranked, locked ones
/// included, so that unlocked entries are ordered correctly around them.
/// Unlocked entries without a score, or without the position/state a
/// dimension needs, get `None` for that dimension.
pub fn assign_ranks(entries: &mut [RankingEntry]) {
  for dimension in RankDimension::iter() {
    let groups: Vec<Vec<usize>> = {
      let mut groups: HashMap<GroupKey<'_>, Vec<usize>> = HashMap::new();
      for (index, entry) in entries.iter().enumerate() {
        if let Some(key) = dimension.group_key(entry) {
          groups.entry(key).or_default().push(index);
        }
      }
      groups.into_values().collect()
    };

    for entry in entries.iter_mut() {
      if !entry.is_manual_override && dimension.group_key(entry).is_none() {
        dimension.set(&mut entry.ranks, None);
      }
    }

    for members in groups {
      let scores: Vec<Option<f64>> =
        members.iter().map(|&i| entries[i].composite_score).collect();
      for (&index, rank) in members.iter().zip(competition_ranks(&scores)) {
        let entry = &mut entries[index];
        if !entry.is_manual_override {
          dimension.set(&mut entry.ranks, rank);
        }
      }
    }
  }
}
