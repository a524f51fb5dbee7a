use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use swatch::{
    batch_extract_colors, extract_colors, extract_from_source, Bitmap, ColorSpace, ExtractError,
    ExtractOptions, ImageSource, KmeansOptions, Palette, PaletteSize, PixelLayout,
    QuantizeMethod, SortMode, SourceType,
};

fn size(k: u16) -> PaletteSize {
    PaletteSize::try_from(k).unwrap()
}

fn methods() -> [QuantizeMethod; 2] {
    [QuantizeMethod::MedianCut, QuantizeMethod::kmeans()]
}

fn assert_frequencies_sum_to_one(palette: &Palette) {
    let sum = palette.frequencies().iter().sum::<f64>();
    assert!((sum - 1.0).abs() < 1e-6, "frequencies sum to {sum}");
}

/// A 64x64 image with four colored quadrants of different sizes and a transparent border.
fn quadrants() -> RgbaImage {
    RgbaImage::from_fn(64, 64, |x, y| {
        if x < 4 || y < 4 {
            Rgba([0, 255, 0, 0])
        } else if x < 40 && y < 40 {
            Rgba([200, 30, 30, 255])
        } else if x < 40 {
            Rgba([30, 30, 200, 255])
        } else if y < 40 {
            Rgba([240, 240, 240, 255])
        } else {
            Rgba([20, 20, 20, 255])
        }
    })
}

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

#[test]
fn solid_red() {
    let bitmap = Bitmap::new(100, 100, PixelLayout::Rgb, [255, 0, 0].repeat(100 * 100)).unwrap();

    for method in methods() {
        let options = ExtractOptions::new()
            .palette_size(size(1))
            .quantize_method(method);

        let palette = extract_colors(&bitmap, &options).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(palette[0].hex(), "#FF0000");
        assert!((palette[0].frequency() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn black_and_white_median_cut() {
    let bitmap = Bitmap::new(2, 1, PixelLayout::Rgb, vec![0, 0, 0, 255, 255, 255]).unwrap();
    let options = ExtractOptions::new()
        .palette_size(size(2))
        .quantize_method(QuantizeMethod::MedianCut)
        .resize(false);

    let palette = extract_colors(&bitmap, &options).unwrap();
    let hex = palette.iter().map(|c| c.hex()).collect::<Vec<_>>();
    assert_eq!(hex, ["#000000", "#FFFFFF"]);
    assert_eq!(palette.frequencies(), &[0.5, 0.5]);
}

#[test]
fn fully_transparent_image_fails_after_masking() {
    let bitmap = Bitmap::from(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])));
    let options = ExtractOptions::new().alpha_mask_threshold(Some(255));

    for method in methods() {
        let result = extract_colors(&bitmap, &options.quantize_method(method));
        assert!(matches!(result, Err(ExtractError::EmptyAfterMask { threshold: 255 })));
    }
}

#[test]
fn alpha_mask_drops_transparent_border() {
    let bitmap = Bitmap::from(quadrants());
    let options = ExtractOptions::new()
        .palette_size(size(8))
        .alpha_mask_threshold(Some(128))
        .resize(false);

    for method in methods() {
        let palette = extract_colors(&bitmap, &options.quantize_method(method)).unwrap();
        assert!(palette.iter().all(|c| c.hex() != "#00FF00"));
        assert_frequencies_sum_to_one(&palette);
    }
}

#[test]
fn frequency_sort_puts_largest_region_first() {
    let options = ExtractOptions::new()
        .palette_size(size(4))
        .sort_mode(Some(SortMode::Frequency))
        .alpha_mask_threshold(Some(128))
        .resize(false);

    // 4 unique opaque colors, so k-means returns each of them
    let palette = extract_colors(&Bitmap::from(quadrants()), &options).unwrap();
    let hex = palette.iter().map(|c| c.hex()).collect::<Vec<_>>();
    assert_eq!(hex, ["#C81E1E", "#1E1EC8", "#F0F0F0", "#141414"]);
    assert_eq!(palette.frequencies(), &[0.36, 0.24, 0.24, 0.16]);

    let options = options.quantize_method(QuantizeMethod::MedianCut);
    let palette = extract_colors(&Bitmap::from(quadrants()), &options).unwrap();
    assert_eq!(palette.len(), 4);
    assert!(palette.frequencies().windows(2).all(|w| w[0] >= w[1]));
    assert_frequencies_sum_to_one(&palette);
}

#[test]
fn luminance_sort_is_ascending() {
    let options = ExtractOptions::new().palette_size(size(6));
    for method in methods() {
        let palette =
            extract_colors(&Bitmap::from(quadrants()), &options.quantize_method(method)).unwrap();

        let luminances = palette.iter().map(|c| c.luminance()).collect::<Vec<_>>();
        assert!(luminances.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn kmeans_is_deterministic_for_a_seed() {
    let bitmap = Bitmap::from(quadrants());
    let options = ExtractOptions::new()
        .palette_size(size(10))
        .quantize_method(KmeansOptions::new().seed(7).into());

    let a = extract_colors(&bitmap, &options).unwrap();
    let b = extract_colors(&bitmap, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn channels_stay_in_range() {
    let bitmap = Bitmap::from(quadrants());
    let unit = 0.0..=1.0;
    for method in methods() {
        let options = ExtractOptions::new()
            .palette_size(size(16))
            .quantize_method(method);

        for color in &extract_colors(&bitmap, &options).unwrap() {
            let [h, s, v] = color.hsv();
            assert!((0.0..=360.0).contains(&h));
            assert!(unit.contains(&s) && unit.contains(&v));

            let [h, l, s] = color.hls();
            assert!((0.0..=360.0).contains(&h));
            assert!(unit.contains(&l) && unit.contains(&s));

            let [r, g, b] = color.values(ColorSpace::Rgb);
            assert!([r, g, b].iter().all(|c| (0.0..=255.0).contains(c)));
            assert_eq!(color.hex(), format!("#{:02X}{:02X}{:02X}", r as u8, g as u8, b as u8));
        }
    }
}

#[test]
fn default_resize_keeps_transparent_colors_out() {
    // opaque red with a wide transparent green border
    let image = RgbaImage::from_fn(8, 8, |x, y| {
        if x < 2 || y < 2 || x >= 6 || y >= 6 {
            Rgba([0, 255, 0, 0])
        } else {
            Rgba([255, 0, 0, 255])
        }
    });

    let bitmap = Bitmap::from(image);
    for method in methods() {
        let options = ExtractOptions::new()
            .palette_size(size(3))
            .alpha_mask_threshold(Some(128))
            .quantize_method(method);

        let palette = extract_colors(&bitmap, &options).unwrap();
        assert!(!palette.is_empty());
        assert!(palette.iter().all(|c| c.hex() == "#FF0000"), "{palette:?}");
        assert_frequencies_sum_to_one(&palette);
    }
}

#[test]
fn palette_has_requested_size_for_many_colors() {
    // 16384 distinct colors
    let bitmap = Bitmap::from(RgbImage::from_fn(128, 128, |x, y| {
        Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) % 256) as u8])
    }));

    for method in methods() {
        for k in [1, 5, 10, 100] {
            let options = ExtractOptions::new()
                .palette_size(size(k))
                .quantize_method(method)
                .resize(false);

            let palette = extract_colors(&bitmap, &options).unwrap();
            assert_eq!(palette.len(), usize::from(k), "{method:?} with {k} colors");
            assert_frequencies_sum_to_one(&palette);
        }
    }
}

#[test]
fn decode_png_bytes_with_metadata() {
    let bytes = png_bytes(&quadrants());
    let len = bytes.len();
    let options = ExtractOptions::new()
        .palette_size(size(3))
        .alpha_mask_threshold(Some(128));

    let palette = extract_from_source(bytes, &options).unwrap();
    assert!(palette.len() <= 3);

    let metadata = palette.metadata().unwrap();
    assert_eq!(metadata.image_source, format!("<bytes: {len} bytes>"));
    assert_eq!(metadata.source_type, SourceType::Bytes);
    assert_eq!(metadata.image_info.format.as_deref(), Some("PNG"));
    assert_eq!(metadata.image_info.mode, PixelLayout::Rgba);
    assert!(metadata.image_info.has_alpha);
    assert_eq!(metadata.image_info.original_size, (64, 64));
    assert_eq!(metadata.image_info.processed_size, (256, 256));
    assert_eq!(metadata.processing_stats.total_pixels, 256 * 256);
    assert!(metadata.processing_stats.valid_pixels < 256 * 256);
    assert_eq!(metadata.extraction_params.alpha_mask_threshold, Some(128));
}

#[test]
fn json_round_trip_keeps_colors_and_metadata() {
    let palette = extract_from_source(png_bytes(&quadrants()), &ExtractOptions::new()).unwrap();
    let json = palette.to_json(ColorSpace::Hls).unwrap();
    let restored = Palette::from_json(&json).unwrap();

    assert_eq!(restored.len(), palette.len());
    for (a, b) in restored.iter().zip(&palette) {
        assert_eq!(a.rgb(), b.rgb());
        assert_eq!(a.hex(), b.hex());
        assert_eq!(a.frequency(), b.frequency());
        assert_eq!(a.hex(), a.hex().to_uppercase());
    }
    assert_eq!(restored.metadata(), palette.metadata());
}

#[test]
fn batch_isolates_failures() {
    let sources = vec![
        ImageSource::from(png_bytes(&quadrants())),
        ImageSource::from(Vec::<u8>::new()),
        ImageSource::from(Bitmap::from(quadrants())),
    ];

    let results = batch_extract_colors(sources, &ExtractOptions::new().palette_size(size(2)));
    assert_eq!(results.len(), 3);
    assert!(results[0].success());
    assert!(!results[1].success());
    assert!(results[2].success());
    assert_eq!(results[2].palette().unwrap().metadata().unwrap().source_type, SourceType::Bitmap);
}
