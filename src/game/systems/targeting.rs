//! Cost-aware target selection

use crate::game::cell::Cell;
use crate::game::grid::Bucket;
use crate::game::systems::pathfinding::ShortestPaths;
use crate::util::vec2::Vec2;

/// Picks the nearest admissible candidate for the current tick
pub struct TargetSelector<'a> {
    paths: &'a ShortestPaths,
    bucket_edge: f32,
}

impl<'a> TargetSelector<'a> {
    pub fn new(paths: &'a ShortestPaths, bucket_edge: f32) -> Self {
        Self { paths, bucket_edge }
    }

    /// Candidate with the lowest path cost; unreachable candidates never qualify
    pub fn closest<'c>(&self, candidates: &'c [Cell]) -> Option<&'c Cell> {
        self.closest_matching(candidates, |_| true)
    }

    /// Lowest path cost among candidates passing `filter`
    pub fn closest_matching<'c, F>(&self, candidates: &'c [Cell], filter: F) -> Option<&'c Cell>
    where
        F: Fn(&Cell) -> bool,
    {
        closest_by(candidates, filter, |cell| {
            self.paths
                .cost_to(Bucket::from_world(cell.position, self.bucket_edge))
                .ok()
        })
    }

    /// Lowest straight-line distance from `origin` among candidates passing `filter`.
    ///
    /// Used for threats, which sit inside their own impassable halo and so
    /// never have a finite path cost.
    pub fn nearest_matching<'c, F>(
        &self,
        origin: Vec2,
        candidates: &'c [Cell],
        filter: F,
    ) -> Option<&'c Cell>
    where
        F: Fn(&Cell) -> bool,
    {
        closest_by(candidates, filter, |cell| {
            Some(origin.distance_sq_to(cell.position))
        })
    }
}

/// Minimum of `cost` over admissible candidates, lower id on ties.
/// A `None` cost excludes the candidate.
fn closest_by<'c, F, C, K>(candidates: &'c [Cell], filter: F, cost: C) -> Option<&'c Cell>
where
    F: Fn(&Cell) -> bool,
    C: Fn(&Cell) -> Option<K>,
    K: PartialOrd,
{
    let mut best: Option<(&Cell, K)> = None;
    for cell in candidates {
        if !filter(cell) {
            continue;
        }
        let Some(c) = cost(cell) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((current, current_cost)) => {
                c < *current_cost || (c == *current_cost && cell.id < current.id)
            }
        };
        if better {
            best = Some((cell, c));
        }
    }
    best.map(|(cell, _)| cell)
}
