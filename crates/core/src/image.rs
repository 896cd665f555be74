//! In-memory pixel arrays passed from the decoder to the encoder.

use thiserror::Error;

/// Typed pixel buffer in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Pixels {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the sample type, e.g. `"u16"`.
    pub fn sample_type(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::I16(_) => "i16",
            Self::U16(_) => "u16",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::I64(_) => "i64",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
        }
    }
}

/// Shape does not match the number of samples.
#[derive(Debug, Error)]
#[error("pixel count {actual} does not match shape {shape:?}")]
pub struct ShapeMismatch {
    pub shape: Vec<usize>,
    pub actual: usize,
}

/// A pixel array with its shape, slowest axis first.
///
/// A FITS image with `NAXIS1 = width` and `NAXIS2 = height` has shape
/// `[height, width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    shape: Vec<usize>,
    pixels: Pixels,
}

impl Image {
    /// Creates an image, checking that the shape covers every sample.
    pub fn new(shape: Vec<usize>, pixels: Pixels) -> Result<Self, ShapeMismatch> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || expected != pixels.len() {
            return Err(ShapeMismatch {
                shape,
                actual: pixels.len(),
            });
        }
        Ok(Self { shape, pixels })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    /// Appends a unit channel axis to single-plane images.
    ///
    /// `[h, w]` becomes `[h, w, 1]`; any other shape is returned unchanged.
    /// Sample values and order are untouched.
    pub fn with_channel_axis(mut self) -> Self {
        if self.shape.len() == 2 {
            self.shape.push(1);
        }
        self
    }
}
