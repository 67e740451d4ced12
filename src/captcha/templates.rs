//! Character template catalog for the challenge decoder.
//!
//! Each glyph is a 12×14 ink mask drawn with two-cell strokes, so the
//! stride-2 comparison used by the decoder still sees every stroke.

use std::sync::LazyLock;

pub const GLYPH_WIDTH: usize = 12;
pub const GLYPH_HEIGHT: usize = 14;

/// Cell sampled to pick a bucket, as `(x, y)` inside the window.
pub const PROBE: (usize, usize) = (4, 4);

const INK: u8 = b'#';

#[rustfmt::skip]
const GLYPHS: &[(char, [&str; GLYPH_HEIGHT])] = &[
    (
        '0',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##....####..",
            "##....####..",
            "##..##..##..",
            "##..##..##..",
            "####....##..",
            "####....##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        '1',
        [
            "....##......",
            "....##......",
            "..####......",
            "..####......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "..######....",
            "..######....",
        ],
    ),
    (
        '2',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "........##..",
            "........##..",
            "......##....",
            "......##....",
            "....##......",
            "....##......",
            "..##........",
            "..##........",
            "##########..",
            "##########..",
        ],
    ),
    (
        '3',
        [
            "##########..",
            "##########..",
            "......##....",
            "......##....",
            "....##......",
            "....##......",
            "......##....",
            "......##....",
            "........##..",
            "........##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        '4',
        [
            "......##....",
            "......##....",
            "....####....",
            "....####....",
            "..##..##....",
            "..##..##....",
            "##....##....",
            "##....##....",
            "##########..",
            "##########..",
            "......##....",
            "......##....",
            "......##....",
            "......##....",
        ],
    ),
    (
        '5',
        [
            "##########..",
            "##########..",
            "##..........",
            "##..........",
            "########....",
            "########....",
            "........##..",
            "........##..",
            "........##..",
            "........##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        '6',
        [
            "....####....",
            "....####....",
            "..##........",
            "..##........",
            "##..........",
            "##..........",
            "########....",
            "########....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        '7',
        [
            "##########..",
            "##########..",
            "........##..",
            "........##..",
            "......##....",
            "......##....",
            "....##......",
            "....##......",
            "..##........",
            "..##........",
            "..##........",
            "..##........",
            "..##........",
            "..##........",
        ],
    ),
    (
        '8',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        '9',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..########..",
            "..########..",
            "........##..",
            "........##..",
            "......##....",
            "......##....",
            "..####......",
            "..####......",
        ],
    ),
    (
        'A',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##########..",
            "##########..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'B',
        [
            "########....",
            "########....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "########....",
            "########....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "########....",
            "########....",
        ],
    ),
    (
        'C',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        'D',
        [
            "######......",
            "######......",
            "##....##....",
            "##....##....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##....##....",
            "##....##....",
            "######......",
            "######......",
        ],
    ),
    (
        'E',
        [
            "##########..",
            "##########..",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "########....",
            "########....",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##########..",
            "##########..",
        ],
    ),
    (
        'F',
        [
            "##########..",
            "##########..",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "########....",
            "########....",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
        ],
    ),
    (
        'G',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##..........",
            "##..........",
            "##..######..",
            "##..######..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..########..",
            "..########..",
        ],
    ),
    (
        'H',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##########..",
            "##########..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'I',
        [
            "..######....",
            "..######....",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "..######....",
            "..######....",
        ],
    ),
    (
        'J',
        [
            "....######..",
            "....######..",
            "......##....",
            "......##....",
            "......##....",
            "......##....",
            "......##....",
            "......##....",
            "......##....",
            "......##....",
            "##....##....",
            "##....##....",
            "..####......",
            "..####......",
        ],
    ),
    (
        'K',
        [
            "##......##..",
            "##......##..",
            "##....##....",
            "##....##....",
            "##..##......",
            "##..##......",
            "####........",
            "####........",
            "##..##......",
            "##..##......",
            "##....##....",
            "##....##....",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'L',
        [
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##########..",
            "##########..",
        ],
    ),
    (
        'M',
        [
            "##......##..",
            "##......##..",
            "####..####..",
            "####..####..",
            "##..##..##..",
            "##..##..##..",
            "##..##..##..",
            "##..##..##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'N',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "####....##..",
            "####....##..",
            "##..##..##..",
            "##..##..##..",
            "##....####..",
            "##....####..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'O',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        'P',
        [
            "########....",
            "########....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "########....",
            "########....",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
        ],
    ),
    (
        'Q',
        [
            "..######....",
            "..######....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##..##..##..",
            "##..##..##..",
            "##....##....",
            "##....##....",
            "..####..##..",
            "..####..##..",
        ],
    ),
    (
        'R',
        [
            "########....",
            "########....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "########....",
            "########....",
            "##..##......",
            "##..##......",
            "##....##....",
            "##....##....",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'S',
        [
            "..########..",
            "..########..",
            "##..........",
            "##..........",
            "##..........",
            "##..........",
            "..######....",
            "..######....",
            "........##..",
            "........##..",
            "........##..",
            "........##..",
            "########....",
            "########....",
        ],
    ),
    (
        'T',
        [
            "##########..",
            "##########..",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
        ],
    ),
    (
        'U',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..######....",
            "..######....",
        ],
    ),
    (
        'V',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..##..##....",
            "..##..##....",
            "....##......",
            "....##......",
        ],
    ),
    (
        'W',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "##..##..##..",
            "##..##..##..",
            "##..##..##..",
            "##..##..##..",
            "##..##..##..",
            "##..##..##..",
            "..##..##....",
            "..##..##....",
        ],
    ),
    (
        'X',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..##..##....",
            "..##..##....",
            "....##......",
            "....##......",
            "..##..##....",
            "..##..##....",
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
        ],
    ),
    (
        'Y',
        [
            "##......##..",
            "##......##..",
            "##......##..",
            "##......##..",
            "..##..##....",
            "..##..##....",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
            "....##......",
        ],
    ),
    (
        'Z',
        [
            "##########..",
            "##########..",
            "........##..",
            "........##..",
            "......##....",
            "......##....",
            "....##......",
            "....##......",
            "..##........",
            "..##........",
            "##..........",
            "##..........",
            "##########..",
            "##########..",
        ],
    ),
];

/// One character's binary bitmap, `cells[y][x]` is 1 where ink is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub label: char,
    pub cells: [[u8; GLYPH_WIDTH]; GLYPH_HEIGHT],
}

impl Template {
    fn parse(label: char, rows: &[&str; GLYPH_HEIGHT]) -> Self {
        let mut cells = [[0u8; GLYPH_WIDTH]; GLYPH_HEIGHT];
        for (y, row) in rows.iter().enumerate() {
            let bytes = row.as_bytes();
            for (x, cell) in cells[y].iter_mut().enumerate() {
                *cell = u8::from(bytes.get(x) == Some(&INK));
            }
        }
        Self { label, cells }
    }

    pub fn cell(&self, x: usize, y: usize) -> u8 {
        self.cells[y][x]
    }

    /// Whether the probe cell carries ink.
    pub fn probe_is_ink(&self) -> bool {
        self.cell(PROBE.0, PROBE.1) == 1
    }
}

/// All templates plus the two probe buckets.
#[derive(Debug)]
pub struct Catalog {
    templates: Vec<Template>,
    inked: Vec<usize>,
    hollow: Vec<usize>,
}

impl Catalog {
    fn build() -> Self {
        let templates: Vec<Template> = GLYPHS
            .iter()
            .map(|(label, rows)| Template::parse(*label, rows))
            .collect();
        let (inked, hollow): (Vec<usize>, Vec<usize>) =
            (0..templates.len()).partition(|&i| templates[i].probe_is_ink());
        Self {
            templates,
            inked,
            hollow,
        }
    }

    /// Candidates for a window whose probe cell is (or is not) ink.
    pub fn bucket(&self, probe_is_ink: bool) -> impl Iterator<Item = &Template> {
        let indices = if probe_is_ink { &self.inked } else { &self.hollow };
        indices.iter().map(|&i| &self.templates[i])
    }

    pub fn get(&self, label: char) -> Option<&Template> {
        self.templates.iter().find(|t| t.label == label)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::build);

pub fn catalog() -> &'static Catalog {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn glyph_rows_have_template_width() {
        for (label, rows) in GLYPHS {
            for row in rows {
                assert_eq!(row.len(), GLYPH_WIDTH, "glyph {label}");
                assert!(row.bytes().all(|b| b == b'#' || b == b'.'), "glyph {label}");
            }
        }
    }

    #[test]
    fn catalog_covers_digits_then_letters() {
        let labels: String = catalog().templates().iter().map(|t| t.label).collect();
        assert_eq!(labels, "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(catalog().len(), 36);
    }

    #[test]
    fn buckets_partition_the_catalog() {
        let inked: Vec<char> = catalog().bucket(true).map(|t| t.label).collect();
        let hollow: Vec<char> = catalog().bucket(false).map(|t| t.label).collect();

        assert_eq!(inked.len() + hollow.len(), catalog().len());
        assert!(inked.iter().all(|c| !hollow.contains(c)));
        assert!(catalog().bucket(true).all(Template::probe_is_ink));
        assert!(!catalog().bucket(false).any(Template::probe_is_ink));
        assert_eq!(inked, vec!['1', '3', '5', 'I', 'K', 'M', 'T']);
    }

    #[test]
    fn strided_samples_distinguish_every_glyph() {
        let mut seen = HashSet::new();
        for template in catalog().templates() {
            let sample: Vec<u8> = (0..GLYPH_HEIGHT)
                .step_by(2)
                .flat_map(|y| (0..GLYPH_WIDTH).step_by(2).map(move |x| (x, y)))
                .map(|(x, y)| template.cell(x, y))
                .collect();
            assert!(seen.insert(sample), "glyph {} is ambiguous", template.label);
        }
    }

    #[test]
    fn lookup_by_label() {
        let zero = catalog().get('0').unwrap();
        assert_eq!(zero.cell(2, 0), 1);
        assert_eq!(zero.cell(0, 0), 0);
        assert!(catalog().get('?').is_none());
    }
}
