pub mod cell;
pub mod constants;
pub mod grid;
pub mod keepalive;
pub mod systems;
