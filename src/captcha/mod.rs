//! Periodic visual challenge: raster model, glyph catalog, decoder and the
//! retrying solver built on top of it.

mod decoder;
mod raster;
mod draw;
mod solver;
mod templates;

pub use decoder::{CONSUMED, Glyph, decode, decode_glyphs};
pub use raster::Raster;
pub use draw::render;
pub use solver::{ChallengeOutcome, ChallengeSolver};
pub use templates::{Catalog, GLYPH_HEIGHT, GLYPH_WIDTH, PROBE, Template, catalog};
