//! Entities observed from the game-state collaborator and the command surface the bot drives.

use hashbrown::HashMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::game::constants::{cell_speed, split_lunge_distance_sq};
use crate::util::vec2::Vec2;

/// Stable, totally ordered entity identifier (used as a tie-break everywhere)
pub type CellId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A circular entity on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub position: Vec2,
    /// Integer mass proxy
    pub size: i32,
    /// Unit heading vector
    pub heading: Vec2,
    pub is_virus: bool,
    pub name: String,
    pub color: Color,
}

impl Cell {
    pub fn new(id: CellId, position: Vec2, size: i32) -> Self {
        Self {
            id,
            position,
            size,
            heading: Vec2::RIGHT,
            is_virus: false,
            name: String::new(),
            color: Color::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn virus(mut self) -> Self {
        self.is_virus = true;
        self
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        cell_speed(self.size)
    }

    /// Squared reach of this cell's split lunge
    #[inline]
    pub fn split_lunge_distance_sq(&self) -> f32 {
        split_lunge_distance_sq(self.size)
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("an unnamed cell ({})", self.size)
        } else {
            format!("{} ({})", self.name, self.size)
        }
    }
}

/// Raw board edges as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardEdges {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoardEdges {
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("board origin must be (0, 0), got ({left}, {top})")]
    NonZeroOrigin { left: f32, top: f32 },
    #[error("board has no playable area: {right}x{bottom}")]
    Empty { right: f32, bottom: f32 },
}

/// Validated playable area, anchored at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn from_edges(edges: BoardEdges) -> Result<Self, BoundsError> {
        if edges.left != 0.0 || edges.top != 0.0 {
            return Err(BoundsError::NonZeroOrigin {
                left: edges.left,
                top: edges.top,
            });
        }
        if !(edges.right > 0.0 && edges.bottom > 0.0) {
            return Err(BoundsError::Empty {
                right: edges.right,
                bottom: edges.bottom,
            });
        }
        Ok(Self {
            right: edges.right,
            bottom: edges.bottom,
        })
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.right / 2.0, self.bottom / 2.0)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right, self.bottom)
    }
}

/// Read side of the game-state collaborator.
///
/// Implementors must hand out a consistent snapshot for the duration of a tick.
pub trait GameView {
    fn cells(&self) -> &HashMap<CellId, Cell>;
    fn owned_ids(&self) -> &FxHashSet<CellId>;
    /// `None` until the server has sent the board dimensions
    fn board(&self) -> Option<BoardEdges>;
}

/// Write side of the game-state collaborator
pub trait CommandSink {
    /// Steer toward a world point
    fn set_target_position(&mut self, target: Vec2);
    /// Request a split of every owned cell
    fn split(&mut self);
    /// Ask the server to (re)spawn us under `nickname`
    fn spawn(&mut self, nickname: &str);
}

/// Owned in-memory view of the game state
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub cells: HashMap<CellId, Cell>,
    pub owned: FxHashSet<CellId>,
    pub board: Option<BoardEdges>,
}

impl Snapshot {
    pub fn new(board: BoardEdges) -> Self {
        Self {
            board: Some(board),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, cell: Cell) {
        self.cells.insert(cell.id, cell);
    }

    pub fn insert_owned(&mut self, cell: Cell) {
        self.owned.insert(cell.id);
        self.cells.insert(cell.id, cell);
    }

    pub fn remove(&mut self, id: CellId) -> Option<Cell> {
        self.owned.remove(&id);
        self.cells.remove(&id)
    }

    /// Owned cells that are currently present in the cell map, ordered by id
    pub fn own_cells(&self) -> Vec<&Cell> {
        own_cells(self)
    }
}

impl GameView for Snapshot {
    fn cells(&self) -> &HashMap<CellId, Cell> {
        &self.cells
    }

    fn owned_ids(&self) -> &FxHashSet<CellId> {
        &self.owned
    }

    fn board(&self) -> Option<BoardEdges> {
        self.board
    }
}

/// Owned ids can outlive their cells between server updates; only present cells count
pub fn own_cells<G: GameView + ?Sized>(game: &G) -> Vec<&Cell> {
    let cells = game.cells();
    let mut own: Vec<&Cell> = game
        .owned_ids()
        .iter()
        .filter_map(|id| cells.get(id))
        .collect();
    own.sort_unstable_by_key(|c| c.id);
    own
}
