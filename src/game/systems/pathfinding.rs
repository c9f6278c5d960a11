//! Single-source shortest paths over a bucket grid
//!
//! The graph is implicit: every bucket is a node, edges join Moore
//! neighbours, and an edge exists only when its destination is passable.
//! Edge weight is the squared bucket distance (1 orthogonal, 2 diagonal),
//! so stored costs gate connectivity without weighting it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bitvec::vec::BitVec;
use smallvec::SmallVec;

use crate::game::grid::Bucket;

/// Grid capability the search runs over
pub trait Traversable {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Whether the bucket may be entered
    fn is_passable(&self, bucket: Bucket) -> bool;
    /// In-bounds neighbours, passable or not
    fn neighbors(&self, bucket: Bucket) -> SmallVec<[Bucket; 8]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no such node: {0}")]
    NoSuchNode(Bucket),
    #[error("no path to {0}")]
    Unreachable(Bucket),
}

const UNVISITED: u32 = u32::MAX;

/// Shortest-path tree from one source bucket, valid for a single tick
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: Bucket,
    width: usize,
    height: usize,
    cost: Vec<u32>,
    predecessor: Vec<Option<u32>>,
}

impl ShortestPaths {
    /// Run Dijkstra from `source` over the whole grid.
    ///
    /// The source itself is never gated. A source outside the grid yields a
    /// tree with nothing reachable.
    pub fn from_source<G: Traversable + ?Sized>(graph: &G, source: Bucket) -> Self {
        let (width, height) = (graph.width(), graph.height());
        let node_count = width * height;
        let mut paths = Self {
            source,
            width,
            height,
            cost: vec![UNVISITED; node_count],
            predecessor: vec![None; node_count],
        };

        let Some(start) = paths.index_of(source) else {
            return paths;
        };

        let mut settled: BitVec = BitVec::repeat(false, node_count);
        let mut heap: BinaryHeap<Reverse<(u32, u32)>> = BinaryHeap::new();
        paths.cost[start] = 0;
        heap.push(Reverse((0, start as u32)));

        while let Some(Reverse((cost, index))) = heap.pop() {
            let index = index as usize;
            if settled[index] {
                continue;
            }
            settled.set(index, true);

            let bucket = paths.bucket_at(index);
            for next in graph.neighbors(bucket) {
                if !graph.is_passable(next) {
                    continue;
                }
                let Some(ni) = paths.index_of(next) else {
                    continue;
                };
                if settled[ni] {
                    continue;
                }
                let candidate = cost + bucket.distance_sq(next);
                if candidate < paths.cost[ni] {
                    paths.cost[ni] = candidate;
                    paths.predecessor[ni] = Some(index as u32);
                    heap.push(Reverse((candidate, ni as u32)));
                }
            }
        }

        paths
    }

    #[inline]
    pub fn source(&self) -> Bucket {
        self.source
    }

    /// Cumulative cost from the source
    pub fn cost_to(&self, bucket: Bucket) -> Result<u32, PathError> {
        let index = self.index_of(bucket).ok_or(PathError::NoSuchNode(bucket))?;
        match self.cost[index] {
            UNVISITED => Err(PathError::Unreachable(bucket)),
            cost => Ok(cost),
        }
    }

    /// Bucket sequence from the source to `bucket`, both ends included
    pub fn path_to(&self, bucket: Bucket) -> Result<Vec<Bucket>, PathError> {
        self.cost_to(bucket)?;

        let mut path = Vec::new();
        let mut cursor = self.index_of(bucket);
        while let Some(index) = cursor {
            path.push(self.bucket_at(index));
            cursor = self.predecessor[index].map(|p| p as usize);
        }
        path.reverse();
        Ok(path)
    }

    pub fn reachable_count(&self) -> usize {
        self.cost.iter().filter(|&&c| c != UNVISITED).count()
    }

    #[inline]
    fn index_of(&self, bucket: Bucket) -> Option<usize> {
        if bucket.x >= 0
            && bucket.y >= 0
            && (bucket.x as usize) < self.width
            && (bucket.y as usize) < self.height
        {
            Some(bucket.y as usize * self.width + bucket.x as usize)
        } else {
            None
        }
    }

    #[inline]
    fn bucket_at(&self, index: usize) -> Bucket {
        Bucket::new((index % self.width) as i32, (index / self.width) as i32)
    }
}
