//! The block world that images are rendered into
//!
//! [`World`] is the only surface the builder talks to. [`RecordingWorld`] keeps
//! every command in memory for dry runs and tests; the network client lives in
//! [`crate::pi`].

use std::fmt;
use std::io;

use thiserror::Error;

use crate::registry::Block;

/// Integer tile coordinate in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A single block placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacementCommand {
    pub pos: TilePos,
    pub block: Block,
}

impl fmt::Display for PlacementCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.pos.x, self.pos.y, self.pos.z, self.block.block_type, self.block.variant
        )
    }
}

/// Error from the world collaborator
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorldError {
    /// Transport failure talking to the world
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),
    /// The world answered with something unexpected
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// A world that accepts block placements.
pub trait World {
    /// Current anchor position (the player's tile).
    fn tile_pos(&mut self) -> Result<TilePos, WorldError>;

    /// Place one block.
    fn set_block(&mut self, pos: TilePos, block: Block) -> Result<(), WorldError>;
}

impl<W: World + ?Sized> World for &mut W {
    fn tile_pos(&mut self) -> Result<TilePos, WorldError> {
        (**self).tile_pos()
    }

    fn set_block(&mut self, pos: TilePos, block: Block) -> Result<(), WorldError> {
        (**self).set_block(pos, block)
    }
}

/// In-memory world that records every placement.
#[derive(Debug, Clone, Default)]
pub struct RecordingWorld {
    anchor: TilePos,
    commands: Vec<PlacementCommand>,
    fail_after: Option<usize>,
}

impl RecordingWorld {
    /// Create a world whose player stands at `anchor`.
    pub fn new(anchor: TilePos) -> Self {
        Self { anchor, commands: Vec::new(), fail_after: None }
    }

    /// Make placements fail once `count` blocks have been placed.
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn commands(&self) -> &[PlacementCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<PlacementCommand> {
        self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl World for RecordingWorld {
    fn tile_pos(&mut self) -> Result<TilePos, WorldError> {
        Ok(self.anchor)
    }

    fn set_block(&mut self, pos: TilePos, block: Block) -> Result<(), WorldError> {
        if self.fail_after.is_some_and(|limit| self.commands.len() >= limit) {
            return Err(WorldError::Connection(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "recording world closed",
            )));
        }
        self.commands.push(PlacementCommand { pos, block });
        Ok(())
    }
}
