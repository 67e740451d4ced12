use serde::Serialize;
use tracing::debug;

use super::raster::Raster;
use super::templates::{Catalog, GLYPH_HEIGHT, GLYPH_WIDTH, PROBE, catalog};

/// Normalized cell values.
const BLANK: u8 = 0;
const INKED: u8 = 1;
/// Marks cells already claimed by a matched glyph.
pub const CONSUMED: u8 = 2;

/// Only every other row and column of a window is compared.
const STRIDE: usize = 2;

/// A matched character and the top-left corner of its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Glyph {
    pub label: char,
    pub x: usize,
    pub y: usize,
}

/// Decode the characters drawn in `raster`, in scan order.
///
/// Cells equal to either `ink` byte count as ink. A result shorter than
/// the expected code length means the raster was not fully legible.
pub fn decode(raster: &Raster, ink: [u8; 2]) -> Vec<char> {
    decode_glyphs(raster, ink)
        .into_iter()
        .map(|glyph| glyph.label)
        .collect()
}

/// Like [`decode`], keeping where each character was found.
pub fn decode_glyphs(raster: &Raster, ink: [u8; 2]) -> Vec<Glyph> {
    let rows = raster.rows();
    let columns = raster.columns();
    if rows < GLYPH_HEIGHT || columns < GLYPH_WIDTH {
        return Vec::new();
    }

    let mut grid = Grid {
        columns,
        cells: raster
            .data()
            .iter()
            .map(|&value| {
                if value == ink[0] || value == ink[1] {
                    INKED
                } else {
                    BLANK
                }
            })
            .collect(),
    };
    let catalog = catalog();
    let mut found = Vec::new();

    for y in 0..=rows - GLYPH_HEIGHT {
        let mut x = 0;
        while x <= columns - GLYPH_WIDTH {
            match grid.match_at(catalog, x, y) {
                Some(label) => {
                    grid.consume(x, y);
                    found.push(Glyph { label, x, y });
                    x += GLYPH_WIDTH;
                }
                None => x += 1,
            }
        }
    }

    debug!(
        rows,
        columns,
        decoded = %found.iter().map(|g| g.label).collect::<String>(),
        "raster decoded"
    );
    found
}

struct Grid {
    columns: usize,
    cells: Vec<u8>,
}

impl Grid {
    fn at(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.columns + x]
    }

    /// Offsets inside a window that take part in comparisons.
    fn sampled() -> impl Iterator<Item = (usize, usize)> {
        (0..GLYPH_HEIGHT)
            .step_by(STRIDE)
            .flat_map(|dy| (0..GLYPH_WIDTH).step_by(STRIDE).map(move |dx| (dx, dy)))
    }

    /// Whether a sampled cell of the window at `(x, y)` is already claimed.
    ///
    /// Cells between samples are not checked.
    fn is_claimed(&self, x: usize, y: usize) -> bool {
        Self::sampled().any(|(dx, dy)| self.at(x + dx, y + dy) == CONSUMED)
    }

    fn match_at(&self, catalog: &Catalog, x: usize, y: usize) -> Option<char> {
        if self.is_claimed(x, y) {
            return None;
        }
        let probe = self.at(x + PROBE.0, y + PROBE.1) == INKED;
        catalog
            .bucket(probe)
            .find(|template| {
                Self::sampled().all(|(dx, dy)| self.at(x + dx, y + dy) == template.cell(dx, dy))
            })
            .map(|template| template.label)
    }

    /// Claim the full window, not just the sampled cells.
    fn consume(&mut self, x: usize, y: usize) {
        for dy in 0..GLYPH_HEIGHT {
            let start = (y + dy) * self.columns + x;
            self.cells[start..start + GLYPH_WIDTH].fill(CONSUMED);
        }
    }
}
