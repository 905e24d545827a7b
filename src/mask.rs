use image::{GrayImage, Luma, imageops};

use crate::error::{LesionError, Result};

const ON: u8 = 255;

/// Binary lesion mask aligned to an image's pixel grid.
///
/// Stored as a `GrayImage` holding 0 or 255 so it can be handed straight to
/// `imageproc` routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    inner: GrayImage,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: GrayImage::new(width, height),
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let inner = GrayImage::from_fn(width, height, |x, y| Luma([if f(x, y) { ON } else { 0 }]));
        Self { inner }
    }

    /// Any non-zero pixel counts as lesion.
    pub fn from_gray(gray: &GrayImage) -> Self {
        let mut inner = gray.clone();
        for pixel in inner.pixels_mut() {
            if pixel[0] != 0 {
                pixel[0] = ON;
            }
        }
        Self { inner }
    }

    /// Row-major booleans, `width * height` long.
    pub fn from_bools(width: u32, height: u32, cells: &[bool]) -> Result<Self> {
        if cells.len() != width as usize * height as usize {
            return Err(LesionError::InvalidParameter(format!(
                "Mask holds {} cells, expected {}x{}",
                cells.len(),
                width,
                height
            )));
        }
        Ok(Self::from_fn(width, height, |x, y| {
            cells[y as usize * width as usize + x as usize]
        }))
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.inner.get_pixel(x, y)[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.inner.put_pixel(x, y, Luma([if value { ON } else { 0 }]));
    }

    /// Zeroth raw moment: number of lesion pixels.
    pub fn area(&self) -> u64 {
        self.inner.pixels().filter(|p| p[0] != 0).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.pixels().all(|p| p[0] == 0)
    }

    /// Mirror along the vertical axis.
    pub fn flipped_horizontal(&self) -> Self {
        Self {
            inner: imageops::flip_horizontal(&self.inner),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, bool)> + '_ {
        self.inner
            .enumerate_pixels()
            .map(|(x, y, p)| (x, y, p[0] != 0))
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.inner
    }

    pub fn into_gray(self) -> GrayImage {
        self.inner
    }
}
