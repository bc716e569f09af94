//! In-memory rotation of packed RGBA frames in 90 degree steps.

use livefx_formats::{ImageData, ImageMutData, ImageStride, OwnedFrame, Rgba8, Rotation, Stride};

/// Rotate a frame clockwise by the given amount.
///
/// Quarter-turn rotations swap the output dimensions. `Rotation::Deg0`
/// returns a plain copy.
pub fn rotate<S>(src: &S, rotation: Rotation) -> OwnedFrame<Rgba8>
where
    S: ImageStride<Rgba8>,
{
    match rotation {
        Rotation::Deg0 => OwnedFrame::copy_from(src),
        Rotation::Deg90 => rotate90(src),
        Rotation::Deg180 => rotate180(src),
        Rotation::Deg270 => rotate270(src),
    }
}

/// Rotate 90 degrees clockwise. The result is `height` x `width`.
pub fn rotate90<S>(src: &S) -> OwnedFrame<Rgba8>
where
    S: ImageStride<Rgba8>,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut dest = OwnedFrame::zeros(src.height(), src.width(), src.height() * 4);
    let dest_data = dest.image_data_mut();
    let src_rows = src.image_data().chunks(src.stride()).take(h);
    for (y, src_row) in src_rows.enumerate() {
        for (x, px) in src_row[..w * 4].chunks_exact(4).enumerate() {
            let di = (x * h + (h - 1 - y)) * 4;
            dest_data[di..di + 4].copy_from_slice(px);
        }
    }
    dest
}

/// Rotate 180 degrees. Dimensions are unchanged.
pub fn rotate180<S>(src: &S) -> OwnedFrame<Rgba8>
where
    S: ImageStride<Rgba8>,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut dest = OwnedFrame::zeros(src.width(), src.height(), src.width() * 4);
    let dest_data = dest.image_data_mut();
    let src_rows = src.image_data().chunks(src.stride()).take(h);
    for (y, src_row) in src_rows.enumerate() {
        for (x, px) in src_row[..w * 4].chunks_exact(4).enumerate() {
            let di = ((h - 1 - y) * w + (w - 1 - x)) * 4;
            dest_data[di..di + 4].copy_from_slice(px);
        }
    }
    dest
}

/// Rotate 270 degrees clockwise. The result is `height` x `width`.
pub fn rotate270<S>(src: &S) -> OwnedFrame<Rgba8>
where
    S: ImageStride<Rgba8>,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut dest = OwnedFrame::zeros(src.height(), src.width(), src.height() * 4);
    let dest_data = dest.image_data_mut();
    let src_rows = src.image_data().chunks(src.stride()).take(h);
    for (y, src_row) in src_rows.enumerate() {
        for (x, px) in src_row[..w * 4].chunks_exact(4).enumerate() {
            let di = ((w - 1 - x) * h + y) * 4;
            dest_data[di..di + 4].copy_from_slice(px);
        }
    }
    dest
}
