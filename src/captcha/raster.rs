use serde::{Deserialize, Serialize};

use crate::error::AnglerError;

/// A rows × columns grid of raw cell bytes, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRaster")]
pub struct Raster {
    rows: usize,
    columns: usize,
    data: Vec<u8>,
}

#[derive(Deserialize)]
struct RawRaster {
    rows: usize,
    columns: usize,
    data: Vec<u8>,
}

impl TryFrom<RawRaster> for Raster {
    type Error = AnglerError;

    fn try_from(raw: RawRaster) -> Result<Self, Self::Error> {
        Raster::new(raw.rows, raw.columns, raw.data)
    }
}

impl Raster {
    /// Build a raster, rejecting data whose length is not `rows * columns`.
    pub fn new(rows: usize, columns: usize, data: Vec<u8>) -> Result<Self, AnglerError> {
        let expected = rows.checked_mul(columns).ok_or(AnglerError::RasterShape {
            rows,
            columns,
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() != expected {
            return Err(AnglerError::RasterShape {
                rows,
                columns,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            data,
        })
    }

    /// A raster with every cell set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * columns` overflows `usize`, in debug and release
    /// builds alike. Use [`Raster::new`] for untrusted dimensions.
    pub fn filled(rows: usize, columns: usize, fill: u8) -> Self {
        let Some(len) = rows.checked_mul(columns) else {
            panic!("raster of {rows}x{columns} cells overflows usize");
        };
        Self {
            rows,
            columns,
            data: vec![fill; len],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.columns && y < self.rows {
            Some(self.data[y * self.columns + x])
        } else {
            None
        }
    }

    /// Overwrite one cell; out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.columns && y < self.rows {
            self.data[y * self.columns + x] = value;
        }
    }
}
