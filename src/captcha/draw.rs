use super::raster::Raster;
use super::templates::{GLYPH_HEIGHT, GLYPH_WIDTH, catalog};

/// Draw `text` with the template catalog, `per_row` glyphs to a line.
///
/// Ink cells alternate between the two `ink` bytes; everything else is
/// zero. Characters without a template leave their cell blank.
pub fn render(text: &str, ink: [u8; 2], per_row: usize) -> Raster {
    let count = text.chars().count();
    let per_row = per_row.max(1);
    let lines = count.div_ceil(per_row);
    let columns = per_row.min(count.max(1)) * GLYPH_WIDTH;
    let rows = lines * GLYPH_HEIGHT;
    let mut raster = Raster::filled(rows, columns, 0);

    for (i, label) in text.chars().enumerate() {
        let Some(template) = catalog().get(label) else {
            continue;
        };
        let left = (i % per_row) * GLYPH_WIDTH;
        let top = (i / per_row) * GLYPH_HEIGHT;
        for dy in 0..GLYPH_HEIGHT {
            for dx in 0..GLYPH_WIDTH {
                if template.cell(dx, dy) == 1 {
                    raster.set(left + dx, top + dy, ink[(dx + dy) % 2]);
                }
            }
        }
    }
    raster
}
