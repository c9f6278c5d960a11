//! Headless local arena
//!
//! Stands in for the game server: owns the authoritative cell map, applies
//! the bot's commands and simulates enough of the rules (movement, eating,
//! splitting, merging, respawning) to drive the bot end to end.

use std::cmp::Reverse;
use std::f32::consts::TAU;
use std::time::Duration;

use hashbrown::{HashMap, HashSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::SandboxConfig;
use crate::game::cell::{BoardEdges, Cell, CellId, Color, CommandSink, Snapshot};
use crate::game::constants::{eat, food, respawn, split, split_lunge_distance};
use crate::util::vec2::Vec2;

/// Movement is specified per server frame
const FRAME: Duration = Duration::from_millis(40);
/// Split halves may merge back after this long
const MERGE_DELAY: Duration = Duration::from_secs(5);
const FOOD_MIN_SIZE: i32 = 10;
const NPC_SIZES: (i32, i32) = (30, 300);
const VIRUS_SIZE: i32 = 100;
/// Per-step chance an NPC picks a new heading
const NPC_TURN_CHANCE: f64 = 0.02;

/// Commands received from the bot, applied on the next step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub target: Option<Vec2>,
    pub split_requested: bool,
    pub spawn_requests: Vec<String>,
}

impl CommandSink for Controls {
    fn set_target_position(&mut self, target: Vec2) {
        self.target = Some(target);
    }

    fn split(&mut self) {
        self.split_requested = true;
    }

    fn spawn(&mut self, nickname: &str) {
        self.spawn_requests.push(nickname.to_string());
    }
}

/// Remaining travel of a freshly split half
#[derive(Debug, Clone, Copy)]
struct Lunge {
    direction: Vec2,
    remaining: f32,
    per_frame: f32,
}

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub food_eaten: u32,
    pub players_eaten: u32,
    pub own_cells_lost: u32,
    pub spawned: bool,
}

pub struct Sandbox {
    pub world: Snapshot,
    pub controls: Controls,
    config: SandboxConfig,
    rng: StdRng,
    next_id: CellId,
    elapsed: Duration,
    merge_at: HashMap<CellId, Duration>,
    lunges: HashMap<CellId, Lunge>,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sandbox = Self {
            world: Snapshot::new(BoardEdges::from_size(config.width, config.height)),
            controls: Controls::default(),
            config,
            rng,
            next_id: 1,
            elapsed: Duration::ZERO,
            merge_at: HashMap::new(),
            lunges: HashMap::new(),
        };

        for _ in 0..sandbox.config.food_count {
            let pellet = sandbox.new_food();
            sandbox.world.insert(pellet);
        }
        for _ in 0..sandbox.config.player_count {
            let npc = sandbox.new_npc();
            sandbox.world.insert(npc);
        }
        for _ in 0..sandbox.config.virus_count {
            let id = sandbox.alloc_id();
            let position = sandbox.random_position();
            let mut virus = Cell::new(id, position, VIRUS_SIZE).virus();
            virus.color = Color::new(51, 255, 51);
            sandbox.world.insert(virus);
        }

        info!(
            "Sandbox {}x{}: {} food, {} players, {} viruses",
            sandbox.config.width,
            sandbox.config.height,
            sandbox.config.food_count,
            sandbox.config.player_count,
            sandbox.config.virus_count
        );
        sandbox
    }

    #[inline]
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_alive(&self) -> bool {
        !self.world.own_cells().is_empty()
    }

    /// Total size of all owned cells
    pub fn own_mass(&self) -> i32 {
        self.world.own_cells().iter().map(|c| c.size).sum()
    }

    /// Advance the arena by `dt`, applying pending commands first
    pub fn step(&mut self, dt: Duration) -> StepStats {
        self.elapsed += dt;
        let frames = dt.as_secs_f32() / FRAME.as_secs_f32();

        let mut stats = StepStats {
            spawned: self.handle_spawns(),
            ..Default::default()
        };
        if std::mem::take(&mut self.controls.split_requested) {
            self.split_own();
        }
        self.move_own(frames);
        self.move_npcs(frames);
        self.resolve_eating(&mut stats);
        self.merge_own();
        stats
    }

    fn handle_spawns(&mut self) -> bool {
        let requests = std::mem::take(&mut self.controls.spawn_requests);
        let Some(nickname) = requests.last() else {
            return false;
        };
        if self.is_alive() {
            return false;
        }

        let id = self.alloc_id();
        let position = self.random_position();
        let mut cell = Cell::new(id, position, respawn::START_SIZE).with_name(nickname.as_str());
        cell.color = self.random_color();
        self.world.owned.clear();
        self.world.insert_owned(cell);
        self.controls.target = None;
        self.merge_at.clear();
        self.lunges.clear();

        info!(
            "Spawned \"{}\" at ({:.0}, {:.0})",
            nickname, position.x, position.y
        );
        true
    }

    fn own_ids(&self) -> Vec<CellId> {
        self.world.own_cells().iter().map(|c| c.id).collect()
    }

    fn split_own(&mut self) {
        let target = self.controls.target;

        for id in self.own_ids() {
            let Some(parent) = self.world.cells.get_mut(&id) else {
                continue;
            };
            if parent.size <= split::MIN_SIZE {
                continue;
            }

            let lunge = split_lunge_distance(parent.size);
            let half = combined_size(area(parent.size) / 2);
            parent.size = half;
            let origin = parent.position;
            let direction = target
                .map(|t| (t - origin).normalize())
                .filter(|d| *d != Vec2::ZERO)
                .unwrap_or(parent.heading);
            let mut child = parent.clone();

            child.id = self.alloc_id();
            child.heading = direction;
            self.lunges.insert(
                child.id,
                Lunge {
                    direction,
                    remaining: lunge,
                    per_frame: lunge / split::LUNGE_FRAMES,
                },
            );
            let merge = self.elapsed + MERGE_DELAY;
            self.merge_at.insert(id, merge);
            self.merge_at.insert(child.id, merge);
            debug!("Split {} -> {} ({} each)", id, child.id, half);
            self.world.insert_owned(child);
        }
    }

    fn move_own(&mut self, frames: f32) {
        let target = self.controls.target;
        let max = Vec2::new(self.config.width, self.config.height);

        for id in self.own_ids() {
            let Some(cell) = self.world.cells.get_mut(&id) else {
                continue;
            };
            if let Some(target) = target {
                let next = cell.position.step_toward(target, cell.speed() * frames);
                let moved = next - cell.position;
                if moved.length_sq() > 0.0 {
                    cell.heading = moved.normalize();
                }
                cell.position = next;
            }
            if let Some(lunge) = self.lunges.get_mut(&id) {
                let travel = (lunge.per_frame * frames).min(lunge.remaining);
                cell.position += lunge.direction * travel;
                lunge.remaining -= travel;
            }
            cell.position = cell.position.clamp(Vec2::ZERO, max);
        }

        self.lunges.retain(|_, l| l.remaining > 0.0);
    }

    fn move_npcs(&mut self, frames: f32) {
        let (w, h) = (self.config.width, self.config.height);
        let owned = &self.world.owned;
        let mut npcs: Vec<CellId> = self
            .world
            .cells
            .values()
            .filter(|c| !owned.contains(&c.id) && !c.is_virus && c.size > food::MAX_SIZE)
            .map(|c| c.id)
            .collect();
        // Fixed order keeps seeded runs reproducible
        npcs.sort_unstable();

        for id in npcs {
            let Some(cell) = self.world.cells.get_mut(&id) else {
                continue;
            };
            if self.rng.gen_bool(NPC_TURN_CHANCE) {
                cell.heading = Vec2::from_angle(self.rng.gen_range(0.0..TAU));
            }

            let next = cell.position + cell.heading * (cell.speed() * frames);
            if next.x < 0.0 || next.x > w {
                cell.heading.x = -cell.heading.x;
            }
            if next.y < 0.0 || next.y > h {
                cell.heading.y = -cell.heading.y;
            }
            cell.position = next.clamp(Vec2::ZERO, Vec2::new(w, h));
        }
    }

    /// A cell eats another when the other's centre lies inside it and it is
    /// at least `eat::SIZE_REQUIREMENT` times larger. Owned cells never eat
    /// each other; they merge instead.
    fn resolve_eating(&mut self, stats: &mut StepStats) {
        let mut ids: Vec<CellId> = self.world.cells.keys().copied().collect();
        ids.sort_unstable();

        let mut eaters: Vec<(i32, CellId)> = self
            .world
            .cells
            .values()
            .filter(|c| !c.is_virus && c.size > food::MAX_SIZE)
            .map(|c| (c.size, c.id))
            .collect();
        eaters.sort_unstable_by_key(|&(size, id)| (Reverse(size), id));

        let mut eaten: HashSet<CellId> = HashSet::new();
        for (_, eater_id) in eaters {
            if eaten.contains(&eater_id) {
                continue;
            }
            let Some(eater) = self.world.cells.get(&eater_id) else {
                continue;
            };
            let eater_owned = self.world.owned.contains(&eater_id);
            let reach_sq = (eater.size as f32) * (eater.size as f32);
            let mut gained: i64 = 0;

            for &other_id in &ids {
                if other_id == eater_id || eaten.contains(&other_id) {
                    continue;
                }
                let Some(other) = self.world.cells.get(&other_id) else {
                    continue;
                };
                if other.is_virus || (eater_owned && self.world.owned.contains(&other_id)) {
                    continue;
                }
                if eater.size as f32 >= other.size as f32 * eat::SIZE_REQUIREMENT
                    && eater.position.distance_sq_to(other.position) < reach_sq
                {
                    eaten.insert(other_id);
                    gained += area(other.size);
                }
            }

            if gained > 0 {
                if let Some(eater) = self.world.cells.get_mut(&eater_id) {
                    eater.size = combined_size(area(eater.size) + gained);
                }
            }
        }

        let mut eaten: Vec<CellId> = eaten.into_iter().collect();
        eaten.sort_unstable();
        for id in eaten {
            let was_owned = self.world.owned.contains(&id);
            let Some(cell) = self.world.remove(id) else {
                continue;
            };
            if was_owned {
                self.merge_at.remove(&id);
                self.lunges.remove(&id);
                stats.own_cells_lost += 1;
                debug!("Lost own cell {}", id);
            } else if cell.size <= food::MAX_SIZE {
                let mut pellet = self.new_food();
                pellet.id = id;
                self.world.insert(pellet);
                stats.food_eaten += 1;
            } else {
                let npc = self.new_npc();
                self.world.insert(npc);
                stats.players_eaten += 1;
            }
        }
    }

    /// Once every half's merge timer has run out, fold all owned cells into the lowest id
    fn merge_own(&mut self) {
        let own = self.own_ids();
        let Some((&keep, rest)) = own.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        let elapsed = self.elapsed;
        if own
            .iter()
            .any(|id| self.merge_at.get(id).is_some_and(|&at| at > elapsed))
        {
            return;
        }

        let mut total: i64 = 0;
        for id in rest {
            if let Some(cell) = self.world.remove(*id) {
                total += area(cell.size);
            }
            self.lunges.remove(id);
        }
        if let Some(cell) = self.world.cells.get_mut(&keep) {
            cell.size = combined_size(area(cell.size) + total);
            debug!("Merged {} cells into {} ({})", rest.len() + 1, keep, cell.size);
        }
        self.merge_at.clear();
    }

    fn alloc_id(&mut self) -> CellId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn random_position(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(0.0..self.config.width),
            self.rng.gen_range(0.0..self.config.height),
        )
    }

    fn random_color(&mut self) -> Color {
        Color::new(self.rng.gen(), self.rng.gen(), self.rng.gen())
    }

    fn new_food(&mut self) -> Cell {
        let id = self.alloc_id();
        let position = self.random_position();
        let size = self.rng.gen_range(FOOD_MIN_SIZE..=food::MAX_SIZE);
        let mut pellet = Cell::new(id, position, size);
        pellet.color = self.random_color();
        pellet
    }

    fn new_npc(&mut self) -> Cell {
        let id = self.alloc_id();
        let position = self.random_position();
        let size = self.rng.gen_range(NPC_SIZES.0..=NPC_SIZES.1);
        let name = self.npc_name();
        let mut npc = Cell::new(id, position, size).with_name(name);
        npc.heading = Vec2::from_angle(self.rng.gen_range(0.0..TAU));
        npc.color = self.random_color();
        npc
    }

    fn npc_name(&mut self) -> String {
        const PREFIXES: [&str; 8] = ["Tiny", "Hungry", "Sly", "Big", "Lazy", "Swift", "Grim", "Odd"];
        const SUFFIXES: [&str; 8] = ["Blob", "Cell", "Dot", "Orb", "Speck", "Mass", "Goo", "Bean"];
        format!(
            "{}{}",
            PREFIXES[self.rng.gen_range(0..PREFIXES.len())],
            SUFFIXES[self.rng.gen_range(0..SUFFIXES.len())]
        )
    }
}

#[inline]
fn area(size: i32) -> i64 {
    size as i64 * size as i64
}

/// Size of a cell with the given summed area
#[inline]
fn combined_size(area: i64) -> i32 {
    (area as f64).sqrt() as i32
}
