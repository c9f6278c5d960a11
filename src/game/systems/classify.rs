//! Threat/opportunity classification of foreign cells
//!
//! Thresholds are derived from the smallest owned cell, since that is the
//! piece most exposed to being eaten.

use std::cmp::Reverse;

use rustc_hash::FxHashSet;

use crate::game::cell::{Cell, CellId};
use crate::game::constants::{food, ignore_size, predator_threshold, prey_threshold};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Food,
    Prey,
    Predator,
}

/// Size cut-offs for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub ignore: i32,
    pub prey: i32,
    pub predator: i32,
}

impl Thresholds {
    pub fn for_size(smallest_own_size: i32) -> Self {
        Self {
            ignore: ignore_size(smallest_own_size),
            prey: prey_threshold(smallest_own_size),
            predator: predator_threshold(smallest_own_size),
        }
    }

    /// First matching category in Food, Prey, Predator order; `None` is untracked
    pub fn categorize(&self, cell: &Cell) -> Option<Category> {
        if cell.is_virus {
            None
        } else if cell.size <= food::MAX_SIZE {
            Some(Category::Food)
        } else if cell.size >= self.ignore && cell.size <= self.prey {
            Some(Category::Prey)
        } else if cell.size >= self.predator {
            Some(Category::Predator)
        } else {
            None
        }
    }
}

/// Per-tick classification sets, each ordered by descending size then ascending id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub food: Vec<Cell>,
    pub prey: Vec<Cell>,
    pub predators: Vec<Cell>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.food.is_empty() && self.prey.is_empty() && self.predators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.food.len() + self.prey.len() + self.predators.len()
    }
}

/// Partition foreign, non-virus cells into Food / Prey / Predators
pub fn classify<'a, I>(cells: I, owned: &FxHashSet<CellId>, smallest_own_size: i32) -> Classification
where
    I: IntoIterator<Item = &'a Cell>,
{
    let thresholds = Thresholds::for_size(smallest_own_size);
    let mut out = Classification::default();

    for cell in cells {
        if owned.contains(&cell.id) {
            continue;
        }
        match thresholds.categorize(cell) {
            Some(Category::Food) => out.food.push(cell.clone()),
            Some(Category::Prey) => out.prey.push(cell.clone()),
            Some(Category::Predator) => out.predators.push(cell.clone()),
            None => {}
        }
    }

    for set in [&mut out.food, &mut out.prey, &mut out.predators] {
        set.sort_unstable_by_key(|c| (Reverse(c.size), c.id));
    }

    out
}

/// Pseudo-cell standing in for all owned cells: mean position, summed size,
/// identity copied from the first cell
pub fn aggregate_self(own: &[&Cell]) -> Option<Cell> {
    let first = own.first()?;
    let mut position = Vec2::ZERO;
    let mut size = 0;
    for cell in own {
        position += cell.position;
        size += cell.size;
    }

    Some(Cell {
        id: first.id,
        position: position / own.len() as f32,
        size,
        heading: first.heading,
        is_virus: first.is_virus,
        name: first.name.clone(),
        color: first.color,
    })
}

/// Owned cell with the minimum size, lowest id on ties
pub fn smallest_own_cell<'a>(own: &[&'a Cell]) -> Option<&'a Cell> {
    own.iter().copied().min_by_key(|c| (c.size, c.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::cell;

    fn owned(ids: &[CellId]) -> FxHashSet<CellId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_thresholds_for_size_50() {
        let t = Thresholds::for_size(50);
        assert_eq!(t, Thresholds { ignore: 12, prey: 40, predator: 61 });
    }

    #[test]
    fn test_small_cells_are_food() {
        let cells = vec![cell(1, 0.0, 0.0, 20), cell(2, 0.0, 0.0, 12)];
        // Even a tiny own cell cannot turn pellets into predators
        let c = classify(&cells, &owned(&[]), 10);
        assert_eq!(c.food.len(), 2);
        assert!(c.prey.is_empty() && c.predators.is_empty());
    }

    #[test]
    fn test_prey_and_predator_bands() {
        let cells = vec![
            cell(1, 0.0, 0.0, 30),  // prey
            cell(2, 0.0, 0.0, 40),  // prey, at threshold
            cell(3, 0.0, 0.0, 50),  // same size: untracked
            cell(4, 0.0, 0.0, 61),  // predator, at threshold
            cell(5, 0.0, 0.0, 300), // predator
        ];
        let c = classify(&cells, &owned(&[]), 50);
        let ids = |v: &[Cell]| v.iter().map(|c| c.id).collect::<Vec<_>>();
        assert_eq!(ids(&c.prey), vec![2, 1]);
        assert_eq!(ids(&c.predators), vec![5, 4]);
    }

    #[test]
    fn test_below_ignore_size_is_untracked() {
        let cells = vec![cell(1, 0.0, 0.0, 30)];
        // ignore size for 200 is 50
        let c = classify(&cells, &owned(&[]), 200);
        assert!(c.is_empty());
    }

    #[test]
    fn test_excludes_owned_and_viruses() {
        let cells = vec![
            cell(1, 0.0, 0.0, 15),
            cell(2, 0.0, 0.0, 100).virus(),
            cell(3, 0.0, 0.0, 15).virus(),
            cell(4, 0.0, 0.0, 200),
        ];
        let c = classify(&cells, &owned(&[1, 4]), 50);
        assert!(c.is_empty());
    }

    #[test]
    fn test_sets_are_disjoint() {
        let cells: Vec<Cell> = (0..200).map(|i| cell(i, 0.0, 0.0, 5 + i as i32 * 3)).collect();
        let own = owned(&[7, 8, 9]);
        let c = classify(&cells, &own, 60);

        let mut seen = FxHashSet::default();
        for cell in c.food.iter().chain(&c.prey).chain(&c.predators) {
            assert!(seen.insert(cell.id), "cell {} classified twice", cell.id);
            assert!(!own.contains(&cell.id));
        }
    }

    #[test]
    fn test_ordering_descending_size_then_id() {
        let cells = vec![
            cell(9, 0.0, 0.0, 15),
            cell(4, 0.0, 0.0, 15),
            cell(2, 0.0, 0.0, 18),
        ];
        let c = classify(&cells, &owned(&[]), 50);
        let ids: Vec<CellId> = c.food.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 4, 9]);
    }

    #[test]
    fn test_aggregate_self() {
        let a = cell(5, 100.0, 100.0, 40);
        let b = cell(3, 300.0, 200.0, 60);
        let me = aggregate_self(&[&a, &b]).unwrap();
        assert_eq!(me.id, 5);
        assert_eq!(me.size, 100);
        assert!(me.position.approx_eq(Vec2::new(200.0, 150.0), 1e-4));
    }

    #[test]
    fn test_aggregate_self_empty() {
        assert!(aggregate_self(&[]).is_none());
    }

    #[test]
    fn test_smallest_own_cell_tie_breaks_on_id() {
        let a = cell(8, 0.0, 0.0, 40);
        let b = cell(3, 0.0, 0.0, 40);
        let c = cell(1, 0.0, 0.0, 90);
        assert_eq!(smallest_own_cell(&[&a, &b, &c]).map(|c| c.id), Some(3));
    }
}
