//! Behaviour state machine and path follower
//!
//! Every tick is evaluated from scratch: classify, build the cost map, run
//! the shortest-path search from our own bucket, then try flee, hunt,
//! chase, feed and wander in that order until one of them issues a move.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::BotConfig;
use crate::game::cell::{own_cells, Bounds, BoundsError, Cell, CommandSink, GameView};
use crate::game::constants::{
    flee, split, split_kill_size, split_killer_ignore_size, split_killer_min_size,
};
use crate::game::grid::Bucket;
use crate::game::systems::classify::{aggregate_self, classify, smallest_own_cell, Classification};
use crate::game::systems::cost_map::CostMap;
use crate::game::systems::pathfinding::ShortestPaths;
use crate::game::systems::targeting::TargetSelector;
use crate::util::vec2::Vec2;

/// Behaviour chosen on the last tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    /// Running from a predator
    Fleeing,
    /// Split-killing or chasing prey
    Hunting,
    /// Collecting food pellets
    Feeding,
    /// Nothing to do, drifting to the board centre
    #[default]
    Idle,
}

impl BotState {
    pub const ALL: [BotState; 4] = [
        BotState::Fleeing,
        BotState::Hunting,
        BotState::Feeding,
        BotState::Idle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Fleeing => "fleeing",
            BotState::Hunting => "hunting",
            BotState::Feeding => "feeding",
            BotState::Idle => "idle",
        }
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BotError {
    #[error("invalid board: {0}")]
    Board(#[from] BoundsError),
}

/// Outcome of one decision tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub state: BotState,
    /// Point handed to `set_target_position`
    pub target: Vec2,
    pub split: bool,
    /// The path follower gave up on the computed path and steered straight
    pub path_fallback: bool,
}

/// Steering plan for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Point to steer toward right now
    pub waypoint: Vec2,
    /// Full planned route in world space, for display
    pub path: Vec<Vec2>,
    pub fallback: bool,
}

impl Route {
    fn direct(from: Vec2, to: Vec2, fallback: bool) -> Self {
        Self {
            waypoint: to,
            path: vec![from, to],
            fallback,
        }
    }
}

/// Path follower: pick the look-ahead waypoint toward `target`.
///
/// Targets within `size + bucket_edge * lookahead_factor` are approached
/// directly. Otherwise the first path bucket at least that far away is
/// used, falling back to a straight line when there is no path or no
/// bucket qualifies.
pub fn plan_route(config: &BotConfig, me: &Cell, paths: &ShortestPaths, target: Vec2) -> Route {
    let reach = config.direct_move_distance(me.size);
    let threshold = reach * reach;

    if me.position.distance_sq_to(target) < threshold {
        return Route::direct(me.position, target, false);
    }

    let buckets = match paths.path_to(Bucket::from_world(target, config.bucket_edge)) {
        Ok(buckets) => buckets,
        Err(e) => {
            debug!("Pathfinding to ({:.0}, {:.0}) failed: {}", target.x, target.y, e);
            return Route::direct(me.position, target, true);
        }
    };

    let points: Vec<Vec2> = buckets
        .iter()
        .map(|b| b.center(config.bucket_edge))
        .collect();

    match points
        .iter()
        .copied()
        .find(|p| me.position.distance_sq_to(*p) >= threshold)
    {
        Some(waypoint) => Route {
            waypoint,
            path: points,
            fallback: false,
        },
        None => Route::direct(me.position, target, true),
    }
}

/// Point `distance` units from `me`, directly away from `threat`
fn flee_point(me: Vec2, threat: Vec2, center: Vec2, distance: f32) -> Vec2 {
    let mut away = (me - threat).normalize();
    if away == Vec2::ZERO {
        // Stacked on the threat: any direction works, prefer open space
        away = (center - me).normalize();
    }
    if away == Vec2::ZERO {
        away = Vec2::RIGHT;
    }
    me + away * distance
}

/// Values derived from the game state for a single tick
struct Tick<'a> {
    me: &'a Cell,
    smallest: &'a Cell,
    own_count: usize,
    bounds: Bounds,
    classification: &'a Classification,
    paths: &'a ShortestPaths,
}

/// Navigation and decision engine for one agent
pub struct Bot {
    config: BotConfig,
    state: BotState,
    status: Vec<String>,
    path: Vec<Vec2>,
    cost_map: Option<CostMap>,
    me: Option<Cell>,
    smallest: Option<Cell>,
    classification: Classification,
    split_cooldown: Duration,
}

impl Bot {
    pub fn new(config: BotConfig) -> Self {
        Self {
            config,
            state: BotState::default(),
            status: Vec::new(),
            path: Vec::new(),
            cost_map: None,
            me: None,
            smallest: None,
            classification: Classification::default(),
            split_cooldown: Duration::ZERO,
        }
    }

    /// Run one full tick.
    ///
    /// Returns `Ok(None)` when there is nothing to steer: no board yet or no
    /// owned cell alive. A board whose origin is not (0, 0) is an error.
    pub fn update<G, S>(
        &mut self,
        dt: Duration,
        game: &G,
        sink: &mut S,
    ) -> Result<Option<TickReport>, BotError>
    where
        G: GameView + ?Sized,
        S: CommandSink + ?Sized,
    {
        self.split_cooldown = self.split_cooldown.saturating_sub(dt);

        let Some(edges) = game.board() else {
            debug!("No board yet, skipping tick");
            return Ok(None);
        };
        let bounds = Bounds::from_edges(edges)?;

        let own = own_cells(game);
        let (Some(me), Some(smallest)) = (aggregate_self(&own), smallest_own_cell(&own)) else {
            debug!("No owned cells, skipping tick");
            return Ok(None);
        };
        let smallest = smallest.clone();
        let own_count = own.len();

        self.status.clear();
        self.path.clear();

        let classification = classify(game.cells().values(), game.owned_ids(), smallest.size);
        let cost_map = CostMap::build(&bounds, &classification.predators, &self.config);
        let paths = ShortestPaths::from_source(&cost_map, cost_map.bucket_of(&me));

        let report = {
            let tick = Tick {
                me: &me,
                smallest: &smallest,
                own_count,
                bounds,
                classification: &classification,
                paths: &paths,
            };
            self.execute(&tick, sink)
        };

        debug!(
            "{} -> ({:.0}, {:.0}){}: {}",
            report.state,
            report.target.x,
            report.target.y,
            if report.split { " +split" } else { "" },
            self.status.join("; ")
        );

        self.me = Some(me);
        self.smallest = Some(smallest);
        self.classification = classification;
        self.cost_map = Some(cost_map);

        Ok(Some(report))
    }

    fn execute<S: CommandSink + ?Sized>(&mut self, tick: &Tick<'_>, sink: &mut S) -> TickReport {
        let selector = TargetSelector::new(tick.paths, self.config.bucket_edge);

        if let Some(route) = self.flee(tick, &selector) {
            return self.steer(BotState::Fleeing, route, sink);
        }

        if let Some(route) = self.hunt(tick, &selector) {
            let mut report = self.steer(BotState::Hunting, route, sink);
            if self.split_cooldown.is_zero() {
                sink.split();
                self.split_cooldown = self.config.split_cooldown;
                report.split = true;
            } else {
                self.note(format!(
                    "Split on cooldown ({}ms)",
                    self.split_cooldown.as_millis()
                ));
            }
            return report;
        }

        if let Some(route) = self.chase(tick, &selector) {
            return self.steer(BotState::Hunting, route, sink);
        }

        if let Some(route) = self.feed(tick, &selector) {
            return self.steer(BotState::Feeding, route, sink);
        }

        self.note("Wandering");
        let route = plan_route(&self.config, tick.me, tick.paths, tick.bounds.center());
        self.steer(BotState::Idle, route, sink)
    }

    /// Move directly away from the nearest predator able to eat us
    fn flee(&mut self, tick: &Tick<'_>, selector: &TargetSelector<'_>) -> Option<Route> {
        let predators = &tick.classification.predators;
        if predators.is_empty() {
            self.note("Not fleeing: no known predators");
            return None;
        }

        let me = tick.me;
        let killer_min = split_killer_min_size(tick.smallest.size);
        let killer_ignore = split_killer_ignore_size(tick.smallest.size);

        let threat = selector.nearest_matching(me.position, predators, |p| {
            let dist_sq = me.position.distance_sq_to(p.position);
            let reach =
                p.size as f32 - me.size as f32 * flee::SELF_SIZE_DISCOUNT + flee::EAT_RANGE_PADDING;
            if dist_sq <= reach * reach {
                return true;
            }
            p.size >= killer_min && p.size < killer_ignore && dist_sq <= p.split_lunge_distance_sq()
        });

        let Some(threat) = threat else {
            self.note("Not fleeing: no dangerous predators nearby");
            return None;
        };

        let target = flee_point(
            me.position,
            threat.position,
            tick.bounds.center(),
            self.config.flee_distance,
        );
        self.note(format!("Fleeing from {}", threat.display_name()));
        Some(Route::direct(me.position, target, false))
    }

    /// Line up a split on prey inside lunge range
    fn hunt(&mut self, tick: &Tick<'_>, selector: &TargetSelector<'_>) -> Option<Route> {
        if tick.own_count > 1 {
            self.note("Not hunting: too many splits");
            return None;
        }
        if tick.smallest.size <= split::MIN_SIZE {
            self.note("Not hunting: too small");
            return None;
        }
        let prey = &tick.classification.prey;
        if prey.is_empty() {
            self.note("Not hunting: no known prey");
            return None;
        }

        let me = tick.me;
        let kill_size = split_kill_size(tick.smallest.size);
        let lunge_sq = tick.smallest.split_lunge_distance_sq();

        let Some(target) = selector.closest_matching(prey, |c| {
            c.size <= kill_size && me.position.distance_sq_to(c.position) < lunge_sq
        }) else {
            self.note("Not hunting: no prey to split kill");
            return None;
        };

        self.note(format!("Splitting on {}", target.display_name()));
        Some(Route::direct(me.position, target.position, false))
    }

    fn chase(&mut self, tick: &Tick<'_>, selector: &TargetSelector<'_>) -> Option<Route> {
        let prey = &tick.classification.prey;
        if prey.is_empty() {
            self.note("Not chasing: no known prey");
            return None;
        }
        let Some(target) = selector.closest(prey) else {
            self.note("Not chasing: no reachable prey");
            return None;
        };

        self.note(format!("Chasing {}", target.display_name()));
        Some(plan_route(&self.config, tick.me, tick.paths, target.position))
    }

    fn feed(&mut self, tick: &Tick<'_>, selector: &TargetSelector<'_>) -> Option<Route> {
        let food = &tick.classification.food;
        if food.is_empty() {
            self.note("Not feeding: no known food");
            return None;
        }
        let Some(target) = selector.closest(food) else {
            self.note("Not feeding: no reachable food");
            return None;
        };

        self.note("Eating food pellets");
        Some(plan_route(&self.config, tick.me, tick.paths, target.position))
    }

    fn steer<S: CommandSink + ?Sized>(
        &mut self,
        state: BotState,
        route: Route,
        sink: &mut S,
    ) -> TickReport {
        if route.fallback {
            self.note("No usable path, moving directly");
        }
        sink.set_target_position(route.waypoint);
        self.state = state;
        self.path = route.path;
        TickReport {
            state,
            target: route.waypoint,
            split: false,
            path_fallback: route.fallback,
        }
    }

    fn note(&mut self, message: impl Into<String>) {
        self.status.push(message.into());
    }

    #[inline]
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> BotState {
        self.state
    }

    /// Decision chain of the last tick, for display
    pub fn status(&self) -> &[String] {
        &self.status
    }

    /// Planned route of the last tick in world space
    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    pub fn cost_map(&self) -> Option<&CostMap> {
        self.cost_map.as_ref()
    }

    /// Aggregate of all owned cells as of the last tick
    pub fn me(&self) -> Option<&Cell> {
        self.me.as_ref()
    }

    pub fn smallest_own_cell(&self) -> Option<&Cell> {
        self.smallest.as_ref()
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Time left before another split may be issued
    #[inline]
    pub fn split_cooldown(&self) -> Duration {
        self.split_cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cell::{BoardEdges, Snapshot};
    use crate::game::test_support::{cell, RecordingSink};

    const BOARD: f32 = 5000.0;

    fn world() -> Snapshot {
        Snapshot::new(BoardEdges::from_size(BOARD, BOARD))
    }

    fn tick(bot: &mut Bot, game: &Snapshot, sink: &mut RecordingSink) -> TickReport {
        bot.update(Duration::from_millis(40), game, sink)
            .unwrap()
            .expect("tick should not be skipped")
    }

    #[test]
    fn test_feeds_on_nearby_food_directly() {
        let mut game = world();
        game.insert_owned(cell(1, 1000.0, 1000.0, 50));
        game.insert(cell(2, 1100.0, 1000.0, 15));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Feeding);
        assert_eq!(bot.state(), BotState::Feeding);
        assert_eq!(sink.targets, vec![Vec2::new(1100.0, 1000.0)]);
        assert_eq!(bot.path(), &[Vec2::new(1000.0, 1000.0), Vec2::new(1100.0, 1000.0)]);
        assert_eq!(sink.splits, 0);
    }

    #[test]
    fn test_flees_from_predator_in_eat_range() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 50));
        game.insert(cell(2, 2600.0, 2500.0, 100));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Fleeing);
        assert!(report.target.approx_eq(Vec2::new(2000.0, 2500.0), 1e-3));
        assert_eq!(sink.targets.len(), 1);
        assert!(bot.status().iter().any(|s| s.starts_with("Fleeing from")));
    }

    #[test]
    fn test_split_self_flees_from_predator_near_small_cell() {
        let mut game = world();
        // Combined size pushes the reach negative; its square still covers 100
        game.insert_owned(cell(1, 2500.0, 2500.0, 40));
        game.insert_owned(cell(3, 2500.0, 2500.0, 1960));
        game.insert(cell(2, 2600.0, 2500.0, 60));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Fleeing);
        assert!(report.target.approx_eq(Vec2::new(2000.0, 2500.0), 1e-3));
    }

    #[test]
    fn test_flees_from_nearest_of_two_predators() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 50));
        game.insert(cell(2, 2500.0, 2350.0, 100));
        game.insert(cell(3, 2600.0, 2500.0, 100));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Fleeing);
        assert!(report.target.approx_eq(Vec2::new(2000.0, 2500.0), 1e-3));
    }

    #[test]
    fn test_flee_tie_goes_to_lower_id() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 50));
        game.insert(cell(5, 2600.0, 2500.0, 100));
        game.insert(cell(4, 2400.0, 2500.0, 100));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Fleeing);
        assert!(report.target.approx_eq(Vec2::new(3000.0, 2500.0), 1e-3));
        assert!(bot.status().iter().any(|s| s.starts_with("Fleeing from") && s.contains("(100)")));
    }

    #[test]
    fn test_flees_from_split_killer() {
        let mut game = world();
        // Outside eat range (232.5) but within the predator's split lunge
        game.insert_owned(cell(1, 2500.0, 2500.0, 50));
        game.insert(cell(2, 2500.0, 3000.0, 150));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Fleeing);
        assert!(report.target.approx_eq(Vec2::new(2500.0, 2000.0), 1e-3));
    }

    #[test]
    fn test_ignores_distant_predator() {
        let mut game = world();
        game.insert_owned(cell(1, 1000.0, 2500.0, 50));
        game.insert(cell(2, 2500.0, 2500.0, 100));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Idle);
        assert!(bot
            .status()
            .iter()
            .any(|s| s == "Not fleeing: no dangerous predators nearby"));
    }

    #[test]
    fn test_flee_point_when_stacked_on_threat() {
        let center = Vec2::new(2500.0, 2500.0);
        let me = Vec2::new(1000.0, 2500.0);
        let target = flee_point(me, me, center, 500.0);
        assert!(target.approx_eq(Vec2::new(1500.0, 2500.0), 1e-3));
        assert!(flee_point(center, center, center, 10.0).approx_eq(Vec2::new(2510.0, 2500.0), 1e-3));
    }

    #[test]
    fn test_hunt_splits_on_prey_in_lunge_range() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 100));
        game.insert(cell(2, 2800.0, 2500.0, 30));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Hunting);
        assert!(report.split);
        assert_eq!(sink.splits, 1);
        assert_eq!(sink.targets, vec![Vec2::new(2800.0, 2500.0)]);
        assert_eq!(bot.split_cooldown(), Duration::from_millis(250));
    }

    #[test]
    fn test_split_cooldown_blocks_second_split() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 100));
        game.insert(cell(2, 2800.0, 2500.0, 30));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        bot.update(Duration::ZERO, &game, &mut sink).unwrap();
        assert_eq!(sink.splits, 1);

        let report = bot
            .update(Duration::from_millis(100), &game, &mut sink)
            .unwrap()
            .unwrap();
        assert_eq!(report.state, BotState::Hunting);
        assert!(!report.split);
        assert_eq!(sink.splits, 1);
        assert_eq!(bot.split_cooldown(), Duration::from_millis(150));

        bot.update(Duration::from_millis(200), &game, &mut sink).unwrap();
        assert_eq!(sink.splits, 2);
    }

    #[test]
    fn test_chases_prey_out_of_lunge_range() {
        let mut game = world();
        game.insert_owned(cell(1, 1000.0, 2500.0, 100));
        game.insert(cell(2, 3500.0, 2500.0, 30));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Hunting);
        assert!(!report.split);
        assert_eq!(sink.splits, 0);
        assert!(bot
            .status()
            .iter()
            .any(|s| s == "Not hunting: no prey to split kill"));
        assert!(bot.path().len() > 2);
    }

    #[test]
    fn test_no_hunt_when_already_split() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 100));
        game.insert_owned(cell(3, 2600.0, 2500.0, 100));
        game.insert(cell(2, 2800.0, 2500.0, 30));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Hunting);
        assert_eq!(sink.splits, 0);
        assert!(bot.status().iter().any(|s| s == "Not hunting: too many splits"));
        assert_eq!(bot.me().map(|c| c.size), Some(200));
        assert_eq!(bot.smallest_own_cell().map(|c| c.id), Some(1));
    }

    #[test]
    fn test_wanders_to_board_center() {
        let mut game = world();
        game.insert_owned(cell(1, 2400.0, 2450.0, 50));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Idle);
        assert_eq!(sink.targets, vec![Vec2::new(2500.0, 2500.0)]);
        assert_eq!(bot.status().last().map(String::as_str), Some("Wandering"));
    }

    #[test]
    fn test_far_target_uses_lookahead_waypoint() {
        let mut game = world();
        game.insert_owned(cell(1, 1000.0, 1000.0, 50));
        let me = Vec2::new(1000.0, 1000.0);
        let center = Vec2::new(2500.0, 2500.0);

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Idle);
        assert!(!report.path_fallback);
        let reach = bot.config().direct_move_distance(50);
        assert!(me.distance_sq_to(report.target) >= reach * reach);
        assert!(report.target.distance_to(center) < me.distance_to(center));
        assert_eq!(bot.path().last(), Some(&Bucket::new(20, 20).center(125.0)));
        assert!(bot.path().contains(&report.target));
    }

    #[test]
    fn test_path_avoids_predator_halo() {
        let mut game = world();
        game.insert_owned(cell(1, 1000.0, 2500.0, 50));
        game.insert(cell(2, 4000.0, 2500.0, 15));
        // Too big to bother splitting on us, too far to eat us
        game.insert(cell(3, 2500.0, 2500.0, 400));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let report = tick(&mut bot, &game, &mut sink);

        assert_eq!(report.state, BotState::Feeding);
        assert!(!report.path_fallback);
        let map = bot.cost_map().unwrap();
        assert!(map.is_impassable(Bucket::new(20, 20)));
        for point in bot.path() {
            let bucket = Bucket::from_world(*point, map.bucket_edge());
            assert!(!map.is_impassable(bucket), "path crosses {}", bucket);
        }
    }

    #[test]
    fn test_unreachable_target_falls_back_to_direct_move() {
        let config = BotConfig::default();
        let mut grid = crate::game::grid::Grid::new(10, 10);
        for y in 0..10 {
            grid.set(Bucket::new(5, y), config.do_not_pass);
        }
        let map = CostMap::from_grid(grid, &config);
        let me = cell(1, 200.0, 200.0, 50);
        let paths = ShortestPaths::from_source(&map, map.bucket_of(&me));

        let target = Vec2::new(1000.0, 200.0);
        let route = plan_route(&config, &me, &paths, target);
        assert!(route.fallback);
        assert_eq!(route.waypoint, target);
        assert_eq!(route.path, vec![me.position, target]);
    }

    #[test]
    fn test_plan_route_is_idempotent() {
        let config = BotConfig::default();
        let bounds = Bounds::from_edges(BoardEdges::from_size(BOARD, BOARD)).unwrap();
        let predators = vec![cell(9, 2500.0, 2000.0, 300)];
        let map = CostMap::build(&bounds, &predators, &config);
        let me = cell(1, 800.0, 1200.0, 60);
        let paths = ShortestPaths::from_source(&map, map.bucket_of(&me));

        let target = Vec2::new(4200.0, 3100.0);
        let first = plan_route(&config, &me, &paths, target);
        let second = plan_route(&config, &me, &paths, target);
        assert_eq!(first, second);
    }

    #[test]
    fn test_update_is_idempotent_for_unchanged_world() {
        let mut game = world();
        game.insert_owned(cell(1, 700.0, 900.0, 60));
        game.insert(cell(2, 4100.0, 3900.0, 18));
        game.insert(cell(3, 2600.0, 2400.0, 500));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let a = bot.update(Duration::ZERO, &game, &mut sink).unwrap();
        let b = bot.update(Duration::ZERO, &game, &mut sink).unwrap();
        assert_eq!(a, b);
        assert_eq!(sink.targets[0], sink.targets[1]);
    }

    #[test]
    fn test_status_is_rebuilt_each_tick() {
        let mut game = world();
        game.insert_owned(cell(1, 2400.0, 2450.0, 50));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        tick(&mut bot, &game, &mut sink);
        let first = bot.status().to_vec();
        tick(&mut bot, &game, &mut sink);
        assert_eq!(bot.status(), first.as_slice());
    }

    #[test]
    fn test_non_zero_origin_is_an_error() {
        let mut game = Snapshot::new(BoardEdges {
            left: -100.0,
            top: 0.0,
            right: BOARD,
            bottom: BOARD,
        });
        game.insert_owned(cell(1, 1000.0, 1000.0, 50));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        let result = bot.update(Duration::ZERO, &game, &mut sink);
        assert!(matches!(
            result,
            Err(BotError::Board(BoundsError::NonZeroOrigin { .. }))
        ));
        assert!(sink.targets.is_empty());
    }

    #[test]
    fn test_skips_tick_without_own_cells() {
        let mut game = world();
        game.insert(cell(2, 1100.0, 1000.0, 15));
        game.owned.insert(1);

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        assert_eq!(bot.update(Duration::ZERO, &game, &mut sink), Ok(None));
        assert!(sink.targets.is_empty());
        assert!(bot.cost_map().is_none());
        assert!(bot.classification().is_empty());
    }

    #[test]
    fn test_skips_tick_without_board() {
        let mut game = Snapshot::default();
        game.insert_owned(cell(1, 1000.0, 1000.0, 50));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        assert_eq!(bot.update(Duration::ZERO, &game, &mut sink), Ok(None));
        assert!(sink.targets.is_empty());
    }

    #[test]
    fn test_cooldown_elapses_while_skipping() {
        let mut game = world();
        game.insert_owned(cell(1, 2500.0, 2500.0, 100));
        game.insert(cell(2, 2800.0, 2500.0, 30));

        let mut bot = Bot::new(BotConfig::default());
        let mut sink = RecordingSink::default();
        bot.update(Duration::ZERO, &game, &mut sink).unwrap();
        assert_eq!(bot.split_cooldown(), Duration::from_millis(250));

        let empty = world();
        bot.update(Duration::from_millis(300), &empty, &mut sink).unwrap();
        assert_eq!(bot.split_cooldown(), Duration::ZERO);
    }
}
