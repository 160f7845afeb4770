use std::{error, io, path::Path};

use derive_more::{Display, From};
use image::{ImageReader, Rgb, RgbImage};

use super::{super::types::ProvinceId, ColorIndex};

#[derive(Debug, From, Display)]
pub enum MapError {
    IoError(io::Error),
    ImageError(image::ImageError),
}

impl error::Error for MapError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MapError::IoError(e) => Some(e),
            MapError::ImageError(e) => Some(e),
        }
    }
}

/// Returns the image decoded as rgb8, meaning each pixel is represented by 3 bytes
fn read_png_bytes<P: AsRef<Path>>(path: P) -> Result<RgbImage, MapError> {
    Ok(ImageReader::open(path)?.decode()?.to_rgb8())
}

/// The province map, where every province is painted in its own color.
pub struct ProvinceMap {
    provinces: RgbImage,
}

impl ProvinceMap {
    /// Opens the province map image at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        Ok(ProvinceMap {
            provinces: read_png_bytes(path)?,
        })
    }

    /// Wraps an already decoded image
    pub fn from_image(provinces: RgbImage) -> Self {
        ProvinceMap { provinces }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.provinces.dimensions()
    }

    /// Gets the color of a pixel, or [None] if out of bounds
    pub fn color_at(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        let (width, height) = self.dimensions();
        if x >= width || y >= height {
            return None;
        }
        Some(*self.provinces.get_pixel(x, y))
    }

    /// Finds the province under the given pixel
    pub fn province_at(&self, x: u32, y: u32, colors: &ColorIndex) -> Option<ProvinceId> {
        colors.id_for_color(self.color_at(x, y)?)
    }
}
