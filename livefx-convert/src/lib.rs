//! Colorspace conversion between camera YUV 4:2:0 planes, packed RGBA
//! working frames and NV21 encoder buffers.
//!
//! All conversions use the BT.601 studio-swing fixed-point coefficients.
//! Luma is sampled per pixel; chroma is subsampled 2x2 with the top-left
//! sample of each block taken as representative.

use itertools::izip;

use livefx_formats::{
    ImageData, ImageMutData, ImageStride, Nv21Buffer, OwnedFrame, Rgba8, Stride, YuvPlanarImage,
};

pub mod rotate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("image dimensions {0}x{1} are not both even")]
    OddDimensions(u32, u32),
    #[error("{plane} plane holds {have} bytes, need at least {need}")]
    PlaneTooSmall {
        plane: &'static str,
        have: usize,
        need: usize,
    },
    #[error("invalid allocated buffer size")]
    InvalidAllocatedBufferSize,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fixed-point BT.601 sample conversions.
pub mod bt601 {
    #[inline]
    fn clamp(i: i32) -> u8 {
        if i < 0 {
            0
        } else if i > 255 {
            255
        } else {
            i as u8
        }
    }

    /// Convert a YUV triplet to RGB.
    #[inline]
    pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
        let c = y as i32 - 16;
        let d = u as i32 - 128;
        let e = v as i32 - 128;
        let r = clamp((298 * c + 409 * e + 128) >> 8);
        let g = clamp((298 * c - 100 * d - 208 * e + 128) >> 8);
        let b = clamp((298 * c + 516 * d + 128) >> 8);
        [r, g, b]
    }

    /// Convert an RGB triplet to YUV.
    #[inline]
    pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        let r = r as i32;
        let g = g as i32;
        let b = b as i32;
        let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
        let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
        let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
        (clamp(y), clamp(u), clamp(v))
    }
}

fn check_yuv420_input(frame: &YuvPlanarImage<'_>) -> Result<()> {
    if frame.width % 2 != 0 || frame.height % 2 != 0 {
        return Err(Error::OddDimensions(frame.width, frame.height));
    }
    let w = frame.width as usize;
    let h = frame.height as usize;
    let checks = [
        ("luma", &frame.y, w, h),
        ("u", &frame.u, w / 2, h / 2),
        ("v", &frame.v, w / 2, h / 2),
    ];
    for (name, plane, cols, rows) in checks {
        let need = plane.min_len(cols, rows);
        if plane.data.len() < need {
            return Err(Error::PlaneTooSmall {
                plane: name,
                have: plane.data.len(),
                need,
            });
        }
    }
    Ok(())
}

/// Decode a YUV 4:2:0 frame into a newly allocated packed RGBA frame.
///
/// The alpha channel is set to 255 for every pixel.
pub fn yuv420_to_rgba(frame: &YuvPlanarImage<'_>) -> Result<OwnedFrame<Rgba8>> {
    let mut dest = OwnedFrame::zeros(frame.width, frame.height, frame.width * 4);
    yuv420_to_rgba_into(frame, &mut dest)?;
    Ok(dest)
}

/// Decode a YUV 4:2:0 frame into a pre-allocated RGBA destination.
pub fn yuv420_to_rgba_into<D>(frame: &YuvPlanarImage<'_>, dest: &mut D) -> Result<()>
where
    D: ImageMutData<Rgba8> + Stride,
{
    check_yuv420_input(frame)?;
    if dest.width() != frame.width || dest.height() != frame.height {
        return Err(Error::InvalidAllocatedBufferSize);
    }
    let w = frame.width as usize;
    let h = frame.height as usize;
    let dest_stride = dest.stride();
    if dest.image_data().len() < dest_stride * h.saturating_sub(1) + w * 4 {
        return Err(Error::InvalidAllocatedBufferSize);
    }

    let y_plane = frame.y;
    let u_plane = frame.u;
    let v_plane = frame.v;
    let dest_rows = dest.image_data_mut().chunks_mut(dest_stride).take(h);
    for (row_idx, dest_row) in dest_rows.enumerate() {
        let uv_row = row_idx / 2;
        for (x, px) in dest_row[..w * 4].chunks_exact_mut(4).enumerate() {
            let y = y_plane.sample(x, row_idx);
            let u = u_plane.sample(x / 2, uv_row);
            let v = v_plane.sample(x / 2, uv_row);
            let [r, g, b] = bt601::yuv_to_rgb(y, u, v);
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = 255;
        }
    }
    Ok(())
}

/// Re-pack a packed RGBA frame into a newly allocated NV21 buffer.
pub fn rgba_to_nv21<S>(frame: &S) -> Result<Nv21Buffer>
where
    S: ImageStride<Rgba8>,
{
    let mut dest = Nv21Buffer::zeros(frame.width(), frame.height());
    rgba_to_nv21_into(frame, dest.data_mut())?;
    Ok(dest)
}

/// Re-pack a packed RGBA frame into a pre-allocated NV21 buffer.
///
/// The destination holds `width*height` luma bytes followed by the
/// interleaved V,U chroma plane. Chroma is taken from the top-left pixel
/// of each 2x2 block.
pub fn rgba_to_nv21_into<S>(frame: &S, dest: &mut [u8]) -> Result<()>
where
    S: ImageStride<Rgba8>,
{
    let w = frame.width() as usize;
    let h = frame.height() as usize;
    if frame.width() % 2 != 0 || frame.height() % 2 != 0 {
        return Err(Error::OddDimensions(frame.width(), frame.height()));
    }
    if dest.len() != Nv21Buffer::expected_len(frame.width(), frame.height()) {
        return Err(Error::InvalidAllocatedBufferSize);
    }

    let (y_plane, vu_plane) = dest.split_at_mut(w * h);
    let src_rows = frame.image_data().chunks(frame.stride()).take(h);
    let dest_rows = y_plane.chunks_exact_mut(w);
    for (row_idx, src_row, y_row) in izip!(0.., src_rows, dest_rows) {
        for (x, px, y_out) in izip!(0usize.., src_row[..w * 4].chunks_exact(4), y_row.iter_mut()) {
            let (y, u, v) = bt601::rgb_to_yuv(px[0], px[1], px[2]);
            *y_out = y;
            if row_idx % 2 == 0 && x % 2 == 0 {
                let uv_row: usize = row_idx / 2;
                let uv_idx = uv_row * w + x;
                // Never write past the chroma plane, whatever the caller
                // handed us.
                if uv_row < h / 2 && uv_idx + 1 < vu_plane.len() {
                    vu_plane[uv_idx] = v;
                    vu_plane[uv_idx + 1] = u;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use livefx_formats::PlaneView;

    fn packed_yuv420<'a>(
        y: &'a [u8],
        u: &'a [u8],
        v: &'a [u8],
        width: u32,
        height: u32,
    ) -> YuvPlanarImage<'a> {
        YuvPlanarImage::new(
            PlaneView::packed(y, width as usize),
            PlaneView::packed(u, width as usize / 2),
            PlaneView::packed(v, width as usize / 2),
            width,
            height,
        )
    }

    #[test]
    fn test_decode_black_and_white() {
        let w = 4u32;
        let h = 4u32;
        // Studio-swing black.
        let y = vec![16u8; 16];
        let u = vec![128u8; 4];
        let v = vec![128u8; 4];
        let frame = packed_yuv420(&y, &u, &v, w, h);
        let rgba = yuv420_to_rgba(&frame).unwrap();
        for px in rgba.image_data().chunks_exact(4) {
            assert_eq!(px, [0, 0, 0, 255]);
        }

        // Studio-swing white.
        let y = vec![235u8; 16];
        let frame = packed_yuv420(&y, &u, &v, w, h);
        let rgba = yuv420_to_rgba(&frame).unwrap();
        for px in rgba.image_data().chunks_exact(4) {
            assert_eq!(px, [255, 255, 255, 255]);
        }
    }

    #[test]
    fn test_decode_strided_planes() {
        // 2x2 image with luma rows padded to 8 bytes and chroma delivered
        // interleaved (pixel stride 2), as camera HALs do.
        let w = 2u32;
        let h = 2u32;
        let mut y = vec![0u8; 8 * 2];
        for row in y.chunks_exact_mut(8) {
            row[..2].copy_from_slice(&[235, 235]);
        }
        let u = [128u8, 77];
        let v = [128u8, 77];
        let frame = YuvPlanarImage::new(
            PlaneView::new(&y, 8, 1),
            PlaneView::new(&u, 2, 2),
            PlaneView::new(&v, 2, 2),
            w,
            h,
        );
        let rgba = yuv420_to_rgba(&frame).unwrap();
        // Only the first chroma byte must be read, the 77s are padding.
        for px in rgba.image_data().chunks_exact(4) {
            assert_eq!(px, [255, 255, 255, 255]);
        }
    }

    #[test]
    fn test_decode_rejects_short_plane() {
        let y = vec![16u8; 15];
        let u = vec![128u8; 4];
        let v = vec![128u8; 4];
        let frame = packed_yuv420(&y, &u, &v, 4, 4);
        match yuv420_to_rgba(&frame) {
            Err(Error::PlaneTooSmall { plane: "luma", .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_odd_dimensions() {
        let y = vec![16u8; 15];
        let u = vec![128u8; 4];
        let v = vec![128u8; 4];
        let frame = packed_yuv420(&y, &u, &v, 3, 5);
        assert!(matches!(
            yuv420_to_rgba(&frame),
            Err(Error::OddDimensions(3, 5))
        ));
    }

    #[test]
    fn test_bt601_endpoints() {
        assert_eq!(bt601::yuv_to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(bt601::yuv_to_rgb(235, 128, 128), [255, 255, 255]);
        assert_eq!(bt601::rgb_to_yuv(0, 0, 0), (16, 128, 128));
        assert_eq!(bt601::rgb_to_yuv(255, 255, 255), (235, 128, 128));
    }

    #[test]
    fn test_bt601_roundtrip_tolerance() {
        for r in (0u16..=255).step_by(17) {
            for g in (0u16..=255).step_by(17) {
                for b in (0u16..=255).step_by(17) {
                    let (y, u, v) = bt601::rgb_to_yuv(r as u8, g as u8, b as u8);
                    let [r2, g2, b2] = bt601::yuv_to_rgb(y, u, v);
                    for (orig, back) in [(r, r2 as u16), (g, g2 as u16), (b, b2 as u16)] {
                        let dist = orig.abs_diff(back);
                        assert!(
                            dist <= 4,
                            "({r},{g},{b}) -> ({y},{u},{v}) -> ({r2},{g2},{b2})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_nv21_layout_minimal() {
        // 2x2 solid red.
        let data = [255u8, 0, 0, 255].repeat(4);
        let frame = OwnedFrame::<Rgba8>::new(2, 2, 8, data).unwrap();
        let nv21 = rgba_to_nv21(&frame).unwrap();
        assert_eq!(nv21.data().len(), 6);

        let (y, u, v) = bt601::rgb_to_yuv(255, 0, 0);
        assert_eq!(nv21.y_plane(), [y, y, y, y]);
        // V before U.
        assert_eq!(nv21.vu_plane(), [v, u]);
    }

    #[test]
    fn test_nv21_chroma_from_top_left() {
        // 2x2 block whose pixels differ. The chroma sample must come from
        // the top-left pixel only.
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(&[200, 10, 30, 255]);
        data[4..8].copy_from_slice(&[0, 255, 0, 255]);
        data[8..12].copy_from_slice(&[0, 0, 255, 255]);
        data[12..16].copy_from_slice(&[255, 255, 255, 255]);
        let frame = OwnedFrame::<Rgba8>::new(2, 2, 8, data).unwrap();
        let nv21 = rgba_to_nv21(&frame).unwrap();
        let (_, u, v) = bt601::rgb_to_yuv(200, 10, 30);
        assert_eq!(nv21.vu_plane(), [v, u]);
    }

    #[test]
    fn test_nv21_into_rejects_wrong_size() {
        let frame = OwnedFrame::<Rgba8>::zeros(4, 4, 16);
        let mut dest = vec![0u8; 23];
        assert!(matches!(
            rgba_to_nv21_into(&frame, &mut dest),
            Err(Error::InvalidAllocatedBufferSize)
        ));
    }

    #[test]
    fn test_nv21_ignores_row_padding() {
        // Identical images, one with padded rows. Outputs must match.
        let tight = OwnedFrame::<Rgba8>::new(2, 2, 8, [10u8, 20, 30, 255].repeat(4)).unwrap();
        let mut padded_data = vec![0u8; 12 * 2];
        for row in padded_data.chunks_exact_mut(12) {
            row[..8].copy_from_slice(&[10, 20, 30, 255, 10, 20, 30, 255]);
        }
        let padded = OwnedFrame::<Rgba8>::new(2, 2, 12, padded_data).unwrap();
        assert_eq!(rgba_to_nv21(&tight).unwrap(), rgba_to_nv21(&padded).unwrap());
    }

    #[test]
    fn test_yuv420_nv21_roundtrip_tolerance() {
        // Uniform 2x2 color blocks survive the chroma subsampling, so a
        // decode followed by a re-pack should land close to the input.
        let w = 8u32;
        let h = 2u32;
        let mut y = vec![0u8; 16];
        let mut u = vec![0u8; 4];
        let mut v = vec![0u8; 4];
        let colors = [(16, 128, 128), (235, 128, 128), (82, 90, 240), (145, 54, 34)];
        for (i, (yy, uu, vv)) in colors.iter().enumerate() {
            y[i * 2] = *yy;
            y[i * 2 + 1] = *yy;
            y[8 + i * 2] = *yy;
            y[8 + i * 2 + 1] = *yy;
            u[i] = *uu;
            v[i] = *vv;
        }
        let frame = packed_yuv420(&y, &u, &v, w, h);
        let rgba = yuv420_to_rgba(&frame).unwrap();
        let nv21 = rgba_to_nv21(&rgba).unwrap();
        for (orig, back) in y.iter().zip(nv21.y_plane()) {
            assert!(orig.abs_diff(*back) <= 3, "luma {orig} -> {back}");
        }
        for (i, (vv, uu)) in nv21.vu_plane().chunks_exact(2).map(|c| (c[0], c[1])).enumerate() {
            assert!(v[i].abs_diff(vv) <= 3, "V {} -> {}", v[i], vv);
            assert!(u[i].abs_diff(uu) <= 3, "U {} -> {}", u[i], uu);
        }
    }
}
