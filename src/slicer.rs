//! Band geometry and pixel extraction: splits a decoded image into four
//! contiguous horizontal bands and encodes each one as a standalone PNG.

use std::io::Cursor;

use image::RgbaImage;

use crate::error::SplitError;

/// The split is always into four bands, top to bottom.
pub const SLICE_COUNT: usize = 4;

/// One horizontal band of the source image.
///
/// `png` holds the band serialized as a standalone PNG. A zero-height band
/// (source shorter than four rows) cannot be PNG-encoded and carries an
/// empty buffer instead; preview and export skip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub index: usize,
    pub start_y: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Computes the `(start_y, height)` of each band for a source of the given
/// height. The first three bands get `height / 4` rows; the last band
/// absorbs the remainder, so the bands always partition `0..height` exactly.
///
/// The remainder deliberately goes to the last band instead of being spread
/// evenly. Changing this changes every output byte-for-byte.
pub fn band_layout(height: u32) -> [(u32, u32); SLICE_COUNT] {
    let base = height / SLICE_COUNT as u32;
    let mut bands = [(0u32, 0u32); SLICE_COUNT];
    for (i, band) in bands.iter_mut().enumerate() {
        let start_y = i as u32 * base;
        let band_height = if i == SLICE_COUNT - 1 {
            height - start_y
        } else {
            base
        };
        *band = (start_y, band_height);
    }
    bands
}

/// Splits `image` into [`SLICE_COUNT`] bands and encodes each non-empty band
/// as PNG. Extraction is a pixel-for-pixel row copy; nothing is resampled
/// and the width is never altered. The source is not modified.
///
/// All-or-nothing: if any band fails to encode, no slice sequence is
/// returned.
pub fn slice_image(image: &RgbaImage) -> Result<Vec<Slice>, SplitError> {
    let width = image.width();
    let stride = width as usize * 4;
    let mut slices = Vec::with_capacity(SLICE_COUNT);

    for (index, (start_y, band_height)) in band_layout(image.height()).into_iter().enumerate() {
        let png = if band_height == 0 {
            Vec::new()
        } else {
            let band = extract_band(image, stride, start_y, band_height).ok_or_else(|| {
                SplitError::Encode {
                    index,
                    message: "band rows out of bounds".to_owned(),
                }
            })?;
            encode_png(&band).map_err(|e| SplitError::Encode {
                index,
                message: e.to_string(),
            })?
        };

        slices.push(Slice {
            index,
            start_y,
            height: band_height,
            png,
        });
    }

    log::info!(
        "sliced {}x{} into {} bands",
        image.width(),
        image.height(),
        slices.len()
    );

    Ok(slices)
}

/// Copies rows `start_y..start_y + band_height` into a fresh full-width image.
/// Bands span the whole width, so the rows are one contiguous byte range.
fn extract_band(
    image: &RgbaImage,
    stride: usize,
    start_y: u32,
    band_height: u32,
) -> Option<RgbaImage> {
    let start = start_y as usize * stride;
    let end = start + band_height as usize * stride;
    let rows = image.as_raw().get(start..end)?;
    RgbaImage::from_raw(image.width(), band_height, rows.to_vec())
}

fn encode_png(band: &RgbaImage) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    band.write_to(&mut buf, image::ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn layout_divisible_height_gives_equal_bands() {
        assert_eq!(
            band_layout(1000),
            [(0, 250), (250, 250), (500, 250), (750, 250)]
        );
    }

    #[test]
    fn layout_remainder_goes_to_last_band() {
        assert_eq!(
            band_layout(999),
            [(0, 249), (249, 249), (498, 249), (747, 252)]
        );
    }

    #[test]
    fn layout_shorter_than_four_rows() {
        assert_eq!(band_layout(3), [(0, 0), (0, 0), (0, 0), (0, 3)]);
        assert_eq!(band_layout(1), [(0, 0), (0, 0), (0, 0), (0, 1)]);
    }

    #[test]
    fn slices_are_pixel_exact_copies() {
        let src = gradient(8, 10);
        let slices = slice_image(&src).unwrap();
        assert_eq!(slices.len(), SLICE_COUNT);

        for slice in &slices {
            let decoded = image::load_from_memory(&slice.png).unwrap().to_rgba8();
            assert_eq!(decoded.width(), src.width());
            assert_eq!(decoded.height(), slice.height);
            for y in 0..slice.height {
                for x in 0..src.width() {
                    assert_eq!(
                        decoded.get_pixel(x, y),
                        src.get_pixel(x, slice.start_y + y),
                        "pixel mismatch at ({x}, {y}) in band {}",
                        slice.index
                    );
                }
            }
        }
    }

    #[test]
    fn slicing_twice_gives_identical_bytes() {
        let src = gradient(33, 47);
        let first = slice_image(&src).unwrap();
        let second = slice_image(&src).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn short_image_yields_three_empty_bands() {
        let src = gradient(100, 3);
        let slices = slice_image(&src).unwrap();
        for slice in &slices[..3] {
            assert_eq!(slice.height, 0);
            assert!(slice.png.is_empty());
        }
        assert_eq!(slices[3].start_y, 0);
        assert_eq!(slices[3].height, 3);
        assert!(!slices[3].png.is_empty());
    }

    #[test]
    fn source_is_untouched_by_slicing() {
        let src = gradient(16, 9);
        let before = src.clone();
        let _ = slice_image(&src).unwrap();
        assert_eq!(src, before);
    }

    proptest! {
        #[test]
        fn bands_partition_the_full_height(height in 1u32..50_000) {
            let bands = band_layout(height);

            let mut expected_start = 0u32;
            for (start, band_height) in bands {
                prop_assert_eq!(start, expected_start);
                expected_start += band_height;
            }
            prop_assert_eq!(expected_start, height);

            let base = height / 4;
            for (_, band_height) in &bands[..3] {
                prop_assert_eq!(*band_height, base);
            }
            prop_assert_eq!(bands[3].1, base + height % 4);
        }
    }
}
