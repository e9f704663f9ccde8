//! Pixel buffer the programs draw on.

use walle_source::Error;
use walle_value::Color;

use crate::draw::blend;

/// A `width` x `height` buffer of [`Color`]s in row-major order.
/// Out of bounds reads return [`Color::TRANSPARENT`] and out of bounds writes are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a blank (white) canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
        }
    }

    /// Creates a canvas of `width` x `height` from an RGBA raster of `src_width` x `src_height`,
    /// scaled with nearest-neighbour sampling.
    pub fn from_rgba(
        rgba: &[u8],
        src_width: usize,
        src_height: usize,
        width: usize,
        height: usize,
    ) -> Result<Self, Error> {
        if src_width == 0 || src_height == 0 {
            return Err(Error::import("Background image is empty."));
        }
        if rgba.len() != src_width * src_height * 4 {
            return Err(Error::import(format!(
                "Background raster has {} bytes, expected {} for {}x{} pixels.",
                rgba.len(),
                src_width * src_height * 4,
                src_width,
                src_height
            )));
        }

        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let src_y = y * src_height / height;
            for x in 0..width {
                let src_x = x * src_width / width;
                let i = (src_y * src_width + src_x) * 4;
                pixels.push(Color::rgba(rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]));
            }
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        self.index(x, y).is_some()
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn get(&self, x: i64, y: i64) -> Color {
        match self.index(x, y) {
            Some(i) => self.pixels[i],
            None => Color::TRANSPARENT,
        }
    }

    pub fn set(&mut self, x: i64, y: i64, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Composes `color` over the pixel at (`x`, `y`).
    /// Returns `false` if the pixel is outside the canvas.
    pub fn blend(&mut self, x: i64, y: i64, color: Color) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.pixels[i] = blend(self.pixels[i], color);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.iter_mut().for_each(|pixel| *pixel = color);
    }

    /// Counts the pixels equal to `color` in `[x, x + w) x [y, y + h)`, clipped to the canvas.
    pub fn count(&self, color: Color, x: i64, y: i64, w: i64, h: i64) -> usize {
        if w <= 0 || h <= 0 {
            return 0;
        }
        let clip = |start: i64, len: i64, extent: usize| {
            let end = start.saturating_add(len).min(extent as i64);
            (start.max(0), end)
        };
        let (x0, x1) = clip(x, w, self.width);
        let (y0, y1) = clip(y, h, self.height);

        let mut count = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) == color {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Returns the canvas as a row-major RGBA byte raster.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|color| [color.r, color.g, color.b, color.a])
            .collect()
    }
}
