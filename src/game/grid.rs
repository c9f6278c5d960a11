//! Discretized world grid
//!
//! Buckets are fixed-size squares of world space. The grid stores one `f32`
//! per bucket in a contiguous row-major buffer with bounds-checked access.

use std::fmt;

use smallvec::SmallVec;

use crate::util::vec2::Vec2;

/// Moore neighbourhood offsets
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bucket {
    pub x: i32,
    pub y: i32,
}

impl Bucket {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Bucket containing a world position (truncates toward zero)
    #[inline]
    pub fn from_world(position: Vec2, bucket_edge: f32) -> Self {
        Self {
            x: (position.x / bucket_edge) as i32,
            y: (position.y / bucket_edge) as i32,
        }
    }

    /// World-space centre of this bucket
    #[inline]
    pub fn center(&self, bucket_edge: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * bucket_edge,
            (self.y as f32 + 0.5) * bucket_edge,
        )
    }

    #[inline]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared Euclidean distance in bucket units
    #[inline]
    pub fn distance_sq(&self, other: Bucket) -> u32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy) as u32
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed-size 2D grid of costs
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Grid {
    /// Create a zero-filled grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn contains(&self, bucket: Bucket) -> bool {
        bucket.x >= 0
            && bucket.y >= 0
            && (bucket.x as usize) < self.width
            && (bucket.y as usize) < self.height
    }

    /// Linear index of a bucket, `None` when out of bounds
    #[inline]
    pub fn index_of(&self, bucket: Bucket) -> Option<usize> {
        if self.contains(bucket) {
            Some(bucket.y as usize * self.width + bucket.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn bucket_at(&self, index: usize) -> Bucket {
        Bucket::new((index % self.width) as i32, (index / self.width) as i32)
    }

    #[inline]
    pub fn get(&self, bucket: Bucket) -> Option<f32> {
        self.index_of(bucket).map(|i| self.values[i])
    }

    #[inline]
    pub fn get_mut(&mut self, bucket: Bucket) -> Option<&mut f32> {
        self.index_of(bucket).map(move |i| &mut self.values[i])
    }

    /// Write a value; out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, bucket: Bucket, value: f32) {
        if let Some(slot) = self.get_mut(bucket) {
            *slot = value;
        }
    }

    /// In-bounds Moore neighbours of `bucket`
    pub fn neighbors(&self, bucket: Bucket) -> SmallVec<[Bucket; 8]> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dx, dy)| bucket.offset(dx, dy))
            .filter(|b| self.contains(*b))
            .collect()
    }

    /// Assign `value` over the horizontal span `[x_start, x_end]` of row `y`, clipped to the grid
    pub fn fill_span(&mut self, y: i32, x_start: i32, x_end: i32, value: f32) {
        if y < 0 || y as usize >= self.height || self.width == 0 {
            return;
        }
        let lo = x_start.max(0);
        let hi = x_end.min(self.width as i32 - 1);
        if lo > hi {
            return;
        }
        let row = y as usize * self.width;
        self.values[row + lo as usize..=row + hi as usize].fill(value);
    }

    /// Assign `value` over a rasterized filled circle
    pub fn fill_circle(&mut self, center: Bucket, radius: i32, value: f32) {
        fill_circle(center, radius, |y, x_start, x_end| {
            self.fill_span(y, x_start, x_end, value)
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, f32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.bucket_at(i), v))
    }
}

/// Midpoint circle rasterizer.
///
/// Calls `span(y, x_start, x_end)` with `x_start <= x_end` for every scanline
/// the filled circle covers. Scanlines can be reported more than once, so
/// callers must assign rather than accumulate.
pub fn fill_circle<F>(center: Bucket, radius: i32, mut span: F)
where
    F: FnMut(i32, i32, i32),
{
    let (cx, cy) = (center.x, center.y);
    let mut x = radius;
    let mut y = 0;
    let mut decision = 1 - x;

    while x >= y {
        span(cy + y, cx - x, cx + x);
        span(cy - y, cx - x, cx + x);
        span(cy + x, cx - y, cx + y);
        span(cy - x, cx - y, cx + y);

        y += 1;
        if decision <= 0 {
            decision += 2 * y + 1;
        } else {
            x -= 1;
            decision += 2 * (y - x) + 1;
        }
    }
}
