//! Image types for the livefx color pipeline.
//!
//! This crate is the lowest common denominator shared by the conversion,
//! grading and pipeline crates: strided image traits, the owned working
//! frame [`OwnedFrame`], borrowed views over camera-delivered YUV planes
//! ([`PlaneView`], [`YuvPlanarImage`]) and the [`Nv21Buffer`] encoder
//! output container.

pub mod pixel_format;
pub use pixel_format::{pixfmt, Nv21, PixFmt, PixelFormat, Rgba8};

// ------------------------------- simple traits ----------------------

/// An image.
pub trait ImageData<F> {
    /// Number of pixel columns in the image. Note: this is not the stride.
    fn width(&self) -> u32;
    /// Number of pixel rows in the image.
    fn height(&self) -> u32;
    /// Returns a slice to the raw image data, does not copy the data.
    fn image_data(&self) -> &[u8];
}

/// An image whose raw data can be mutated in place.
pub trait ImageMutData<F>: ImageData<F> {
    /// Returns a mutable slice to the raw image data.
    fn image_data_mut(&mut self) -> &mut [u8];
}

/// An image whose data is stored such that successive rows are a stride apart.
pub trait Stride {
    /// The width (in bytes) of each row of image data.
    fn stride(&self) -> usize;
}

/// An image with a stride.
pub trait ImageStride<F>: ImageData<F> + Stride {}
impl<S, F> ImageStride<F> for S where S: ImageData<F> + Stride {}

// ------------------------------- owned frame ------------------------

/// Image data with a statically typed, strided pixel format.
#[derive(Clone)]
pub struct OwnedFrame<F> {
    /// width in pixels
    width: u32,
    /// height in pixels
    height: u32,
    /// number of bytes in an image row
    stride: u32,
    /// raw image data
    image_data: Vec<u8>,
    /// format of the data
    fmt: std::marker::PhantomData<F>,
}

impl<F> OwnedFrame<F>
where
    F: PixelFormat,
{
    /// Move a `Vec<u8>` buffer as the backing store for an image.
    ///
    /// Returns None if the buffer is not large enough to store an image of
    /// the desired properties.
    pub fn new(width: u32, height: u32, stride: u32, image_data: Vec<u8>) -> Option<Self> {
        let fmt = pixfmt::<F>().ok()?;
        let valid_stride = fmt.bits_per_pixel() as usize * width as usize / 8;

        let sz = stride as usize * (height as usize).saturating_sub(1) + valid_stride;
        if image_data.len() < sz {
            return None;
        }
        Some(Self {
            width,
            height,
            stride,
            image_data,
            fmt: std::marker::PhantomData,
        })
    }

    /// Allocate a minimum size buffer for an image and fill with zeros.
    pub fn zeros(width: u32, height: u32, stride: u32) -> Self {
        let image_data = vec![0u8; stride as usize * height as usize];
        Self {
            width,
            height,
            stride,
            image_data,
            fmt: std::marker::PhantomData,
        }
    }

    /// Copy an existing image into a newly owned frame.
    pub fn copy_from<S: ImageStride<F>>(frame: &S) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            stride: frame.stride() as u32,
            image_data: frame.image_data().to_vec(),
            fmt: std::marker::PhantomData,
        }
    }

    /// The number of bytes per row actually occupied by pixel data.
    pub fn valid_stride(&self) -> usize {
        let fmt = pixfmt::<F>().unwrap_or(PixFmt::Rgba8);
        fmt.bits_per_pixel() as usize * self.width as usize / 8
    }
}

impl<F> ImageData<F> for OwnedFrame<F> {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn image_data(&self) -> &[u8] {
        &self.image_data
    }
}

impl<F> ImageMutData<F> for OwnedFrame<F> {
    fn image_data_mut(&mut self) -> &mut [u8] {
        &mut self.image_data
    }
}

impl<F> Stride for OwnedFrame<F> {
    fn stride(&self) -> usize {
        self.stride as usize
    }
}

impl<F> From<OwnedFrame<F>> for Vec<u8> {
    fn from(orig: OwnedFrame<F>) -> Vec<u8> {
        orig.image_data
    }
}

impl<F> std::fmt::Debug for OwnedFrame<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "OwnedFrame {{ {}x{} }}", self.width, self.height)
    }
}

impl<F> PartialEq for OwnedFrame<F>
where
    F: PixelFormat,
{
    fn eq(&self, other: &OwnedFrame<F>) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }

        // Strides may differ. Compare only the regions where pixels live.
        let valid_stride = self.valid_stride();
        let a_rows = self.image_data.chunks_exact(self.stride as usize);
        let b_rows = other.image_data.chunks_exact(other.stride as usize);
        for (a_row, b_row) in a_rows.zip(b_rows) {
            if a_row[..valid_stride] != b_row[..valid_stride] {
                return false;
            }
        }
        true
    }
}

// ------------------------------- borrowed planes --------------------

/// A borrowed view over one image plane with independent strides.
///
/// `row_stride` is the number of bytes between the start of successive
/// rows, `pix_stride` the number of bytes between successive samples in a
/// row. Camera HALs commonly deliver chroma planes with `pix_stride == 2`
/// (interleaved) and rows padded beyond the image width.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pix_stride: usize,
}

impl<'a> PlaneView<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pix_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pix_stride,
        }
    }

    /// A packed plane: one byte per sample, rows exactly `width` apart.
    pub fn packed(data: &'a [u8], width: usize) -> Self {
        Self {
            data,
            row_stride: width,
            pix_stride: 1,
        }
    }

    /// Sample at column `x`, row `y`. No bounds check beyond the slice's own.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.row_stride + x * self.pix_stride]
    }

    /// Minimum slice length needed to address `cols` x `rows` samples.
    pub fn min_len(&self, cols: usize, rows: usize) -> usize {
        if cols == 0 || rows == 0 {
            return 0;
        }
        (rows - 1) * self.row_stride + (cols - 1) * self.pix_stride + 1
    }
}

/// A planar YUV 4:2:0 input frame: full-resolution luma and two
/// half-resolution chroma planes, each with its own strides.
#[derive(Debug, Clone, Copy)]
pub struct YuvPlanarImage<'a> {
    pub y: PlaneView<'a>,
    pub u: PlaneView<'a>,
    pub v: PlaneView<'a>,
    /// luma width in pixels (even)
    pub width: u32,
    /// luma height in pixels (even)
    pub height: u32,
}

impl<'a> YuvPlanarImage<'a> {
    pub fn new(
        y: PlaneView<'a>,
        u: PlaneView<'a>,
        v: PlaneView<'a>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            y,
            u,
            v,
            width,
            height,
        }
    }
}

// ------------------------------- NV21 output ------------------------

/// An owned NV21 buffer: `width*height` luma bytes followed by
/// `width*height/2` interleaved V,U chroma bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Nv21Buffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Nv21Buffer {
    /// The byte length of an NV21 buffer for the given dimensions.
    pub fn expected_len(width: u32, height: u32) -> usize {
        let w = width as usize;
        let h = height as usize;
        w * h + w * (h / 2)
    }

    /// Allocate a zero-filled buffer.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; Self::expected_len(width, height)],
        }
    }

    /// Wrap an existing buffer. Returns None if the length does not match.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != Self::expected_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The full-resolution luma plane.
    pub fn y_plane(&self) -> &[u8] {
        &self.data[..self.width as usize * self.height as usize]
    }

    /// The interleaved V,U chroma plane.
    pub fn vu_plane(&self) -> &[u8] {
        &self.data[self.width as usize * self.height as usize..]
    }
}

impl From<Nv21Buffer> for Vec<u8> {
    fn from(orig: Nv21Buffer) -> Vec<u8> {
        orig.data
    }
}

// ------------------------------- rotation ---------------------------

/// Display rotation in 90 degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a rotation from degrees. Only 0/90/180/270 are valid.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True for rotations that swap image width and height.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_degrees_roundtrip() {
        for degrees in [0u32, 90, 180, 270] {
            let r = Rotation::from_degrees(degrees).unwrap();
            assert_eq!(r.degrees(), degrees);
        }
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::from_degrees(360), None);
        assert!(!Rotation::Deg0.swaps_dimensions());
        assert!(Rotation::Deg90.swaps_dimensions());
        assert!(!Rotation::Deg180.swaps_dimensions());
        assert!(Rotation::Deg270.swaps_dimensions());
    }

    #[test]
    fn test_plane_view_strided_sample() {
        // 4x2 samples stored with row stride 10 and pixel stride 2.
        let mut data = vec![0u8; 2 * 10];
        data[0] = 1;
        data[2] = 2;
        data[10 + 6] = 3;
        let plane = PlaneView::new(&data, 10, 2);
        assert_eq!(plane.sample(0, 0), 1);
        assert_eq!(plane.sample(1, 0), 2);
        assert_eq!(plane.sample(3, 1), 3);
        assert_eq!(plane.min_len(4, 2), 10 + 6 + 1);
    }

    #[test]
    fn test_owned_frame_new_rejects_short_buffer() {
        let frame = OwnedFrame::<Rgba8>::new(4, 4, 16, vec![0u8; 63]);
        assert!(frame.is_none());
        let frame = OwnedFrame::<Rgba8>::new(4, 4, 16, vec![0u8; 64]);
        assert!(frame.is_some());
    }

    #[test]
    fn test_owned_frame_eq_ignores_row_padding() {
        // Same 2x2 image, one with 8-byte padded rows.
        let mut a = OwnedFrame::<Rgba8>::zeros(2, 2, 8);
        let mut b = OwnedFrame::<Rgba8>::zeros(2, 2, 16);
        for frame in [&mut a, &mut b] {
            let stride = frame.stride();
            for row in frame.image_data_mut().chunks_exact_mut(stride) {
                for px in row[..8].chunks_exact_mut(4) {
                    px.copy_from_slice(&[1, 2, 3, 255]);
                }
            }
        }
        // Garbage in the padding must not affect equality.
        b.image_data_mut()[9] = 42;
        assert_eq!(a, b);
    }

    #[test]
    fn test_nv21_buffer_layout() {
        let buf = Nv21Buffer::zeros(4, 4);
        assert_eq!(buf.data().len(), 4 * 4 * 3 / 2);
        assert_eq!(buf.y_plane().len(), 16);
        assert_eq!(buf.vu_plane().len(), 8);
        assert!(Nv21Buffer::new(4, 4, vec![0u8; 23]).is_none());
        assert!(Nv21Buffer::new(4, 4, vec![0u8; 24]).is_some());
    }
}
