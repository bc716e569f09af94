//! 3D lookup table color grading.
//!
//! A [`Lut3d`] is a 33x33x33 table of RGB triplets in the unit range,
//! loaded from `.cube` text. Grading maps each 8 bit channel to the
//! nearest lattice cell, no trilinear interpolation. The [`LutRegistry`]
//! holds the named tables a pipeline can switch between.

use std::collections::HashMap;
use std::sync::Arc;

use livefx_formats::{ImageMutData, Rgba8, Stride};

pub mod cube;

/// Number of lattice points per axis.
pub const LUT_SIZE: usize = 33;

/// A 33x33x33 color lookup table.
///
/// Entries are stored flat with the red axis varying fastest, then green,
/// then blue, matching the `.cube` body order.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3d {
    pub title: Option<String>,
    data: Vec<[f32; 3]>,
}

impl Lut3d {
    /// Parse a LUT from `.cube` text.
    pub fn from_cube_str(text: &str) -> Result<Self, cube::Error> {
        cube::parse(text)
    }

    /// The identity table: grading with it leaves near-lattice colors
    /// unchanged.
    pub fn identity() -> Self {
        let max = (LUT_SIZE - 1) as f32;
        let mut data = Vec::with_capacity(LUT_SIZE * LUT_SIZE * LUT_SIZE);
        for b in 0..LUT_SIZE {
            for g in 0..LUT_SIZE {
                for r in 0..LUT_SIZE {
                    data.push([r as f32 / max, g as f32 / max, b as f32 / max]);
                }
            }
        }
        Self { title: None, data }
    }

    /// Map an 8 bit channel value to its nearest lattice index.
    #[inline]
    fn axis_index(c: u8) -> usize {
        let idx = (c as f32 / 255.0 * (LUT_SIZE - 1) as f32).round() as usize;
        idx.min(LUT_SIZE - 1)
    }

    /// Grade one RGB triplet through the table.
    #[inline]
    pub fn grade(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        let ri = Self::axis_index(r);
        let gi = Self::axis_index(g);
        let bi = Self::axis_index(b);
        let cell = self.data[(bi * LUT_SIZE + gi) * LUT_SIZE + ri];
        [
            (cell[0] * 255.0).round().clamp(0.0, 255.0) as u8,
            (cell[1] * 255.0).round().clamp(0.0, 255.0) as u8,
            (cell[2] * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }
}

/// Grade every pixel of a packed RGBA frame in place. Alpha is untouched.
pub fn apply_in_place<D>(lut: &Lut3d, frame: &mut D)
where
    D: ImageMutData<Rgba8> + Stride,
{
    let valid = frame.width() as usize * 4;
    let stride = frame.stride();
    let height = frame.height() as usize;
    let rows = frame.image_data_mut().chunks_mut(stride).take(height);
    for row in rows {
        for px in row[..valid].chunks_exact_mut(4) {
            let [r, g, b] = lut.grade(px[0], px[1], px[2]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}

/// The set of named grading tables available to a pipeline.
#[derive(Debug, Default, Clone)]
pub struct LutRegistry {
    luts: HashMap<String, Arc<Lut3d>>,
}

impl LutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under a name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, lut: Lut3d) {
        self.luts.insert(name.into(), Arc::new(lut));
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<Arc<Lut3d>> {
        self.luts.get(name).cloned()
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.luts.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.luts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.luts.is_empty()
    }
}
