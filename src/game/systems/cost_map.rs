//! Per-tick traversal cost map
//!
//! A fresh grid is built every tick: a graded band along the board edges
//! discourages boundary hugging, and a flat `do_not_pass` halo around every
//! predator marks its kill radius as impassable.

use smallvec::SmallVec;

use crate::config::BotConfig;
use crate::game::cell::{Bounds, Cell};
use crate::game::constants::grid::{BOUNDARY_DIVISORS, HALO_PADDING};
use crate::game::grid::{Bucket, Grid};
use crate::game::systems::pathfinding::Traversable;

#[derive(Debug, Clone, PartialEq)]
pub struct CostMap {
    grid: Grid,
    bucket_edge: f32,
    do_not_pass: f32,
}

impl CostMap {
    /// Build the cost map for one tick
    pub fn build(bounds: &Bounds, predators: &[Cell], config: &BotConfig) -> Self {
        let width = (bounds.right / config.bucket_edge) as usize + 1;
        let height = (bounds.bottom / config.bucket_edge) as usize + 1;

        let mut map = Self::from_grid(Grid::new(width, height), config);
        map.paint_boundary();
        for predator in predators {
            map.paint_halo(predator);
        }
        map
    }

    pub fn from_grid(grid: Grid, config: &BotConfig) -> Self {
        Self {
            grid,
            bucket_edge: config.bucket_edge,
            do_not_pass: config.do_not_pass,
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn bucket_edge(&self) -> f32 {
        self.bucket_edge
    }

    #[inline]
    pub fn do_not_pass(&self) -> f32 {
        self.do_not_pass
    }

    #[inline]
    pub fn cost(&self, bucket: Bucket) -> Option<f32> {
        self.grid.get(bucket)
    }

    /// Out-of-bounds buckets count as impassable
    #[inline]
    pub fn is_impassable(&self, bucket: Bucket) -> bool {
        self.grid.get(bucket).map_or(true, |c| c >= self.do_not_pass)
    }

    #[inline]
    pub fn bucket_of(&self, cell: &Cell) -> Bucket {
        Bucket::from_world(cell.position, self.bucket_edge)
    }

    /// Halo radius, in buckets, stamped around a predator
    #[inline]
    pub fn halo_radius(&self, predator: &Cell) -> i32 {
        ((predator.size + HALO_PADDING) as f32 / self.bucket_edge) as i32
    }

    /// Graded band along every edge: `do_not_pass / 2` on the outermost
    /// ring, then `/3`, `/4`, `/5` moving inward. Where bands from two edges
    /// meet, the one nearer to its edge wins.
    fn paint_boundary(&mut self) {
        let (w, h) = (self.grid.width() as i32, self.grid.height() as i32);
        let bands = BOUNDARY_DIVISORS.len() as i32;

        for y in 0..h {
            for x in 0..w {
                let depth = x.min(y).min(w - 1 - x).min(h - 1 - y);
                if depth < bands {
                    let cost = self.do_not_pass / BOUNDARY_DIVISORS[depth as usize];
                    self.grid.set(Bucket::new(x, y), cost);
                }
            }
        }
    }

    /// Stamped twice, the second time offset by (+1, +1), to cover the
    /// truncation of world coordinates into buckets
    fn paint_halo(&mut self, predator: &Cell) {
        let center = self.bucket_of(predator);
        let radius = self.halo_radius(predator);
        self.grid.fill_circle(center, radius, self.do_not_pass);
        self.grid.fill_circle(center.offset(1, 1), radius, self.do_not_pass);
    }
}

impl Traversable for CostMap {
    fn width(&self) -> usize {
        self.grid.width()
    }

    fn height(&self) -> usize {
        self.grid.height()
    }

    fn is_passable(&self, bucket: Bucket) -> bool {
        !self.is_impassable(bucket)
    }

    fn neighbors(&self, bucket: Bucket) -> SmallVec<[Bucket; 8]> {
        self.grid.neighbors(bucket)
    }
}
