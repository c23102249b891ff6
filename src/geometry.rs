//! Grid rectangles and the overlap primitive.
//!
//! Positions are plain values measured in grid units. Coordinates are signed
//! so a raw drag candidate that wandered off the left edge can still be
//! represented and checked; whether a position is usable is always an
//! explicit question asked through [`GridPosition::validate`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GridConfig;

/// Number of columns on the page grid.
pub const GRID_COLUMNS: i32 = 12;
/// Height of one grid row in pixels.
pub const GRID_ROW_HEIGHT_PX: f64 = 110.0;
/// Narrowest a block may be, in columns.
pub const MIN_WIDTH: i32 = 2;
/// Shortest a block may be, in rows.
pub const MIN_HEIGHT: i32 = 2;

/// Integer clamp. When `max < min` the lower bound wins.
pub fn clamp(value: i32, min: i32, max: i32) -> i32 {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}

/// Rectangle anchored on the block grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a position and reject it unless it fits `grid`.
    pub fn checked(
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        grid: &GridConfig,
    ) -> Result<Self, GridError> {
        let position = Self::new(x, y, width, height);
        position.validate(grid)?;
        Ok(position)
    }

    /// First column to the right of the block.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// First row below the block.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn contains_cell(&self, column: i32, row: i32) -> bool {
        column >= self.x && column < self.right() && row >= self.y && row < self.bottom()
    }

    pub fn overlaps(&self, other: &GridPosition) -> bool {
        overlaps(self, other)
    }

    pub fn is_in_bounds(&self, grid: &GridConfig) -> bool {
        self.validate(grid).is_ok()
    }

    /// Report the first grid rule this position breaks.
    pub fn validate(&self, grid: &GridConfig) -> Result<(), GridError> {
        if self.x < 0 || self.y < 0 {
            return Err(GridError::NegativeOrigin {
                x: self.x,
                y: self.y,
            });
        }
        if self.width < grid.min_width {
            return Err(GridError::TooNarrow {
                width: self.width,
                min: grid.min_width,
            });
        }
        if self.height < grid.min_height {
            return Err(GridError::TooShort {
                height: self.height,
                min: grid.min_height,
            });
        }
        if self.right() > grid.columns {
            return Err(GridError::ExceedsColumns {
                right: self.right(),
                columns: grid.columns,
            });
        }
        Ok(())
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// Axis-aligned overlap test. Rectangles that only share an edge do not collide.
pub fn overlaps(a: &GridPosition, b: &GridPosition) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Grid rule violations reported by [`GridPosition::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("origin ({x}, {y}) lies before the grid start")]
    NegativeOrigin { x: i32, y: i32 },
    #[error("width {width} is below the minimum of {min}")]
    TooNarrow { width: i32, min: i32 },
    #[error("height {height} is below the minimum of {min}")]
    TooShort { height: i32, min: i32 },
    #[error("right edge {right} extends past column {columns}")]
    ExceedsColumns { right: i32, columns: i32 },
}
