//! # Table Geometry
//!
//! Plain data types shared by every stage of grid extraction: rectangles,
//! line axes, cells, rows and tables. All coordinates are integer pixels in
//! page space unless a function says otherwise.

use serde::{Deserialize, Serialize};

/// Axis along which a ruling line runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Lines running left to right (they delimit rows)
    Horizontal,
    /// Lines running top to bottom (they delimit columns)
    Vertical,
}

impl Axis {
    /// Short lowercase name, used in log fields and debug artifact names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
        }
    }
}

/// Integer pixel rectangle `(x1, y1, x2, y2)`.
///
/// The right and bottom edges are exclusive, so `width() == x2 - x1` and a box
/// can be passed straight to a crop. A well-formed box has `x1 < x2` and
/// `y1 < y2`; use [`BoundingBox::is_degenerate`] to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True when the box encloses no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }

    /// Translates a box expressed in a region's local space into page space.
    pub fn offset(&self, dx: u32, dy: u32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Clamps the box to an image of the given size. The result may be degenerate.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        Self::new(
            self.x1.min(width),
            self.y1.min(height),
            self.x2.min(width),
            self.y2.min(height),
        )
    }
}

/// Ordered ruling-line positions along one axis of a region.
///
/// Entries are strictly increasing, in region-local coordinates.
pub type GridAxis = Vec<u32>;

/// One grid cell with its position in the table matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub bbox: BoundingBox,
    pub row: usize,
    pub col: usize,
}

/// Cells sharing an approximate top edge, sorted left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Top edge of the first cell, used as the row's representative y.
    pub fn top(&self) -> Option<u32> {
        self.cells.first().map(|cell| cell.bbox.y1)
    }
}

/// A detected table region and its row-major cell matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub region: BoundingBox,
    pub rows: Vec<Row>,
}

impl Table {
    /// A table whose grid could not be reconstructed.
    pub fn empty(region: BoundingBox) -> Self {
        Self {
            region,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }
}
