//! Video frame types and pixel access

use crate::FrameError;
use image::{GrayImage, Luma, RgbImage};

/// Luminance of one RGB pixel: 0.299*R + 0.587*G + 0.114*B
pub fn luminance(pixel: [u8; 3]) -> f64 {
    0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64
}

/// Decoded RGB video frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a frame from raw RGB data, checking the buffer length
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ns: 0,
            sequence: 0,
        })
    }

    /// Create a frame from a decoded image of any color type
    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            data: rgb.into_raw(),
            width,
            height,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    /// Stamp capture metadata
    pub fn with_timestamp(mut self, timestamp_ns: u64, sequence: u32) -> Self {
        self.timestamp_ns = timestamp_ns;
        self.sequence = sequence;
        self
    }

    /// Frame with no pixels (zero width or height)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Average luminance over every pixel (0-255 scale)
    pub fn mean_luminance(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let total: f64 = self
            .data
            .chunks_exact(3)
            .take(self.pixel_count())
            .map(|px| luminance([px[0], px[1], px[2]]))
            .sum();
        Some(total / (self.width as f64 * self.height as f64))
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Convert to an 8-bit grayscale image using the BT.601 weights
    ///
    /// Pixels beyond `width * height` are ignored; missing ones stay black.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut gray = GrayImage::new(self.width, self.height);
        if self.is_empty() {
            return gray;
        }
        for (i, px) in self.data.chunks_exact(3).take(self.pixel_count()).enumerate() {
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            let value = luminance([px[0], px[1], px[2]]).round().clamp(0.0, 255.0) as u8;
            gray.put_pixel(x, y, Luma([value]));
        }
        gray
    }

    /// Borrow the frame as an `image` RGB buffer (copies the pixels)
    pub fn to_rgb_image(&self) -> Result<RgbImage, FrameError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            FrameError::BufferSize {
                expected: self.width as usize * self.height as usize * 3,
                actual: self.data.len(),
            },
        )
    }

    /// Crop a region of the frame
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<VideoFrame> {
        if x.checked_add(w)? > self.width || y.checked_add(h)? > self.height {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h * 3) as usize);
        for row in y..(y + h) {
            let start = ((row as usize * self.width as usize) + x as usize) * 3;
            let end = start + (w as usize * 3);
            cropped.extend_from_slice(self.data.get(start..end)?);
        }

        Some(VideoFrame {
            data: cropped,
            width: w,
            height: h,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }

    /// Encode as JPEG for upload
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, FrameError> {
        let rgb = self.to_rgb_image()?;
        let mut buf = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(buf)
    }
}
