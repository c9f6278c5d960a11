/// Size-ratio rules: who can eat whom
pub mod eat {
    /// A cell must be this many times larger than another to consume it
    pub const SIZE_REQUIREMENT: f32 = 1.25;
    /// Foreign cells smaller than `own / IGNORE_DIVISOR` are not worth tracking as prey
    pub const IGNORE_DIVISOR: i32 = 4;
}

/// Food pellet constants
pub mod food {
    /// Pellets never exceed this size; players start at 10 and can't fall below it
    pub const MAX_SIZE: i32 = 20;
}

/// Cell movement speed: `BASE * size^EXPONENT * FRAME_SCALE` units per frame
pub mod speed {
    pub const BASE: f32 = 745.28;
    pub const EXPONENT: f32 = -0.222;
    pub const FRAME_SCALE: f32 = 50.0 / 1000.0;
}

/// Split mechanics
pub mod split {
    /// A cell must be strictly larger than this to split
    pub const MIN_SIZE: i32 = 36;
    /// Minimum time between two split commands in milliseconds
    pub const COOLDOWN_MS: u64 = 250;
    /// Split lunge covers `LUNGE_FRAMES * (LUNGE_BASE + speed * LUNGE_FRAMES) + size * SIZE_FACTOR`
    pub const LUNGE_FRAMES: f32 = 4.0;
    pub const LUNGE_BASE: f32 = 40.0;
    pub const SIZE_FACTOR: f32 = 1.75;
    /// Slack subtracted from the eat threshold before doubling it for split-kill danger
    pub const KILL_SLACK: f32 = 10.0;
    /// Predators this many times larger are unlikely to split on us
    pub const IGNORE_FACTOR: i32 = 4;
}

/// Flee behavior
pub mod flee {
    /// Padding added to a predator's reach when testing the eat-capable radius
    pub const EAT_RANGE_PADDING: f32 = 100.0;
    /// Fraction of our own size subtracted from a predator's reach
    pub const SELF_SIZE_DISCOUNT: f32 = 0.35;
    /// Distance of the flee target along the reflected bearing
    pub const DISTANCE: f32 = 500.0;
}

/// Cost grid constants
pub mod grid {
    /// World units covered by one bucket edge
    pub const BUCKET_EDGE: f32 = 125.0;
    /// Cost at or above which a bucket is impassable
    pub const DO_NOT_PASS: f32 = 1024.0;
    /// Boundary band divisors, outermost band first
    pub const BOUNDARY_DIVISORS: [f32; 4] = [2.0, 3.0, 4.0, 5.0];
    /// Added to a predator's size before converting its halo radius to buckets
    pub const HALO_PADDING: i32 = 100;
    /// Look-ahead distance is `own size + BUCKET_EDGE * LOOKAHEAD_FACTOR`
    pub const LOOKAHEAD_FACTOR: f32 = 1.3;
}

/// Respawn handling
pub mod respawn {
    /// Base delay between spawn attempts, multiplied by the attempt count
    pub const RETRY_MS: u64 = 300;
    /// Size of a freshly spawned player cell
    pub const START_SIZE: i32 = 10;
    /// Nicknames picked from when (re)spawning
    pub const NICKNAMES: [&str; 8] = [
        "blob", "nibbler", "cellular", "mitosis", "petri", "amoeba", "drifter", "plankton",
    ];
}

/// Movement speed of a cell of the given size (units per 40ms frame)
#[inline]
pub fn cell_speed(size: i32) -> f32 {
    speed::BASE * (size.max(1) as f32).powf(speed::EXPONENT) * speed::FRAME_SCALE
}

/// Distance a freshly split half of a cell of `size` travels during its lunge
#[inline]
pub fn split_lunge_distance(size: i32) -> f32 {
    split::LUNGE_FRAMES * (split::LUNGE_BASE + cell_speed(size) * split::LUNGE_FRAMES)
        + size as f32 * split::SIZE_FACTOR
}

#[inline]
pub fn split_lunge_distance_sq(size: i32) -> f32 {
    let d = split_lunge_distance(size);
    d * d
}

/// Foreign cells at or above this size can eat a cell of `own_size`
#[inline]
pub fn predator_threshold(own_size: i32) -> i32 {
    (own_size as f32 * eat::SIZE_REQUIREMENT) as i32 - 1
}

/// Foreign cells at or below this size can be eaten by a cell of `own_size`
#[inline]
pub fn prey_threshold(own_size: i32) -> i32 {
    (own_size as f32 / eat::SIZE_REQUIREMENT) as i32
}

#[inline]
pub fn ignore_size(own_size: i32) -> i32 {
    own_size / eat::IGNORE_DIVISOR
}

/// Largest target a cell of `own_size` can still eat after halving itself
#[inline]
pub fn split_kill_size(own_size: i32) -> i32 {
    (own_size as f32 / 2.0 / eat::SIZE_REQUIREMENT) as i32
}

/// Smallest predator that can split-kill a cell of `own_size`
#[inline]
pub fn split_killer_min_size(own_size: i32) -> i32 {
    ((own_size as f32 * eat::SIZE_REQUIREMENT - split::KILL_SLACK) * 2.0) as i32
}

/// Predators at or above this size are assumed not to split on a cell of `own_size`
#[inline]
pub fn split_killer_ignore_size(own_size: i32) -> i32 {
    own_size * split::IGNORE_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_decays_with_size() {
        let sizes = [10, 36, 50, 100, 200, 400, 800];
        for pair in sizes.windows(2) {
            assert!(
                cell_speed(pair[0]) > cell_speed(pair[1]),
                "speed should decrease: size {} vs {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_speed_known_value() {
        // 745.28 * 100^-0.222 * 0.05 ≈ 13.41
        let s = cell_speed(100);
        assert!((s - 13.41).abs() < 0.05, "got {}", s);
    }

    #[test]
    fn test_speed_no_nan_for_degenerate_size() {
        assert!(cell_speed(0).is_finite());
        assert!(cell_speed(-5).is_finite());
    }

    #[test]
    fn test_split_lunge_distance_known_value() {
        // 4 * (40 + 13.41 * 4) + 100 * 1.75 ≈ 549.5
        let d = split_lunge_distance(100);
        assert!((d - 549.5).abs() < 1.0, "got {}", d);
        assert!((split_lunge_distance_sq(100) - d * d).abs() < 1.0);
    }

    #[test]
    fn test_thresholds_for_size_50() {
        assert_eq!(predator_threshold(50), 61);
        assert_eq!(prey_threshold(50), 40);
        assert_eq!(ignore_size(50), 12);
        assert_eq!(split_kill_size(50), 20);
    }

    #[test]
    fn test_thresholds_for_size_100() {
        assert_eq!(predator_threshold(100), 124);
        assert_eq!(prey_threshold(100), 80);
        assert_eq!(ignore_size(100), 25);
        assert_eq!(split_kill_size(100), 40);
        assert_eq!(split_killer_min_size(100), 230);
        assert_eq!(split_killer_ignore_size(100), 400);
    }

    #[test]
    fn test_prey_and_predator_bands_do_not_overlap() {
        for size in 10..2000 {
            assert!(prey_threshold(size) < predator_threshold(size), "size {}", size);
        }
    }

    #[test]
    fn test_boundary_divisors_increase_inward() {
        for pair in grid::BOUNDARY_DIVISORS.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
