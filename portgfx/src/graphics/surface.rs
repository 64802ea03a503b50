/// CPU pixel surfaces used for texture upload and framebuffer readback

use crate::error::Result;
use crate::engine_bail;

/// Pixel byte order of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Bytes R, G, B, A. Native upload format of every texture.
    Rgba8888,
    /// Bytes B, G, R, A
    Bgra8888,
    /// Bytes R, G, B
    Rgb888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 | PixelFormat::Bgra8888 => 4,
            PixelFormat::Rgb888 => 3,
        }
    }

    pub fn has_alpha(self) -> bool {
        !matches!(self, PixelFormat::Rgb888)
    }

    fn read_rgba(self, px: &[u8]) -> [u8; 4] {
        match self {
            PixelFormat::Rgba8888 => [px[0], px[1], px[2], px[3]],
            PixelFormat::Bgra8888 => [px[2], px[1], px[0], px[3]],
            PixelFormat::Rgb888 => [px[0], px[1], px[2], 0xff],
        }
    }

    fn write_rgba(self, px: &mut [u8], rgba: [u8; 4]) {
        match self {
            PixelFormat::Rgba8888 => px[..4].copy_from_slice(&rgba),
            PixelFormat::Bgra8888 => px[..4].copy_from_slice(&[rgba[2], rgba[1], rgba[0], rgba[3]]),
            PixelFormat::Rgb888 => px[..3].copy_from_slice(&rgba[..3]),
        }
    }
}

/// Pixel surface with explicit row pitch
///
/// An optional RGB color key marks transparent pixels. Converting a keyed
/// surface to a format with alpha writes alpha 0 for every keyed pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    color_key: Option<[u8; 3]>,
    pixels: Vec<u8>,
}

impl Surface {
    /// Zero-filled surface with a tight pitch
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let pitch = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            pitch,
            format,
            color_key: None,
            pixels: vec![0; pitch * height as usize],
        }
    }

    /// Wrap existing pixel bytes
    ///
    /// # Errors
    ///
    /// `BackendError` when the pitch is narrower than a row or the buffer is
    /// too short for `height` rows.
    pub fn from_pixels(
        width: u32,
        height: u32,
        pitch: usize,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        if pitch < row_bytes {
            engine_bail!("portgfx::Surface", "pitch {} smaller than row size {}", pitch, row_bytes);
        }
        let needed = if height == 0 { 0 } else { pitch * (height as usize - 1) + row_bytes };
        if pixels.len() < needed {
            engine_bail!(
                "portgfx::Surface",
                "{}x{} surface needs {} bytes, got {}",
                width, height, needed, pixels.len()
            );
        }
        Ok(Self { width, height, pitch, format, color_key: None, pixels })
    }

    pub fn with_color_key(mut self, key: Option<[u8; 3]>) -> Self {
        self.color_key = key;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn color_key(&self) -> Option<[u8; 3]> {
        self.color_key
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Pixels per row including padding (`GL_UNPACK_ROW_LENGTH`)
    pub fn row_length(&self) -> usize {
        self.pitch / self.format.bytes_per_pixel()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.pitch + x as usize * self.format.bytes_per_pixel()
    }

    /// Read a pixel as R, G, B, A. Out-of-range reads return `None`.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = self.offset(x, y);
        Some(self.format.read_rgba(&self.pixels[at..]))
    }

    /// Write a pixel given as R, G, B, A. Out-of-range writes are ignored.
    pub fn set_pixel_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let at = self.offset(x, y);
        self.format.write_rgba(&mut self.pixels[at..], rgba);
    }

    /// Copy into a new tightly packed surface of `format`
    pub fn convert(&self, format: PixelFormat) -> Surface {
        let mut out = Surface::new(self.width, self.height, format);
        let key_to_alpha = format.has_alpha();
        for y in 0..self.height {
            for x in 0..self.width {
                let at = self.offset(x, y);
                let mut rgba = self.format.read_rgba(&self.pixels[at..]);
                if key_to_alpha && self.color_key == Some([rgba[0], rgba[1], rgba[2]]) {
                    rgba[3] = 0;
                }
                out.set_pixel_rgba(x, y, rgba);
            }
        }
        if !key_to_alpha {
            out.color_key = self.color_key;
        }
        out
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
