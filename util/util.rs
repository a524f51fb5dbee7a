#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use image::{Rgb, RgbImage};
use palette::Srgb;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use swatch::{Bitmap, PixelBuffer};

pub fn load_images(images: &[PathBuf]) -> Vec<(String, RgbImage)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image.into_rgb8(),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Option<Vec<(String, RgbImage)>> {
    let mut paths = std::fs::read_dir(dir)
        .ok()?
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    Some(load_images(&paths))
}

pub const BENCH_IMAGE_DIR: &str = "img/bench";

pub fn load_image_dir_relative_to_root(dir: impl AsRef<Path>) -> Option<Vec<(String, RgbImage)>> {
    // assume current exe path is something like: target/build/deps/current_exe
    let exe = std::env::current_exe().unwrap();
    let root = exe
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap();

    load_image_dir(root.join(dir.as_ref()))
}

/// A smooth gradient with seeded noise, standing in for a photo.
pub fn synthetic_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        let b = ((x + y) * 127 / (width + height)) as u8;
        let noise = |c: u8, rng: &mut Xoroshiro128PlusPlus| c.saturating_add(rng.gen_range(0..24));
        Rgb([noise(r, &mut rng), noise(g, &mut rng), noise(b, &mut rng)])
    })
}

fn load_bench_images() -> Vec<(String, RgbImage)> {
    load_image_dir_relative_to_root(BENCH_IMAGE_DIR).unwrap_or_else(|| {
        [(640, 480), (1920, 1080)]
            .into_iter()
            .enumerate()
            .map(|(i, (w, h))| (format!("synthetic_{w}x{h}"), synthetic_image(w, h, i as u64)))
            .collect()
    })
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

/// The images in `img/bench` if that directory exists, otherwise generated images.
pub fn bench_images() -> &'static [(String, RgbImage)] {
    BENCH_IMAGES.get_or_init(load_bench_images)
}

pub fn to_bitmaps(images: &[(String, RgbImage)]) -> Vec<(String, Bitmap)> {
    images
        .iter()
        .map(|(path, image)| (path.clone(), Bitmap::from(image.clone())))
        .collect()
}

pub fn to_pixels(images: &[(String, RgbImage)]) -> Vec<(String, Vec<Srgb<u8>>)> {
    to_bitmaps(images)
        .into_iter()
        .map(|(path, bitmap)| {
            let pixels = PixelBuffer::from_bitmap(&bitmap.resized(256, 256), None).unwrap();
            (path, pixels.into_colors())
        })
        .collect()
}
