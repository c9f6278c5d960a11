pub mod ai;
pub mod classify;
pub mod cost_map;
pub mod pathfinding;
pub mod targeting;
