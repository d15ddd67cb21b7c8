#![allow(dead_code)]

use equipmatch::{OwnedImage, ProbeImage, ReferenceImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic xor texture.
pub fn pattern(width: usize, height: usize, a: usize, b: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(((x * a) ^ (y * b) ^ (x * y)) as u8);
        }
    }
    data
}

/// Seeded uniform noise.
pub fn noise(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random::<u8>()).collect()
}

/// Copies `patch` into `image` with its top-left corner at `(x0, y0)`.
pub fn paste(
    image: &mut [u8],
    img_width: usize,
    patch: &[u8],
    patch_width: usize,
    x0: usize,
    y0: usize,
) {
    for (row_idx, row) in patch.chunks_exact(patch_width).enumerate() {
        let start = (y0 + row_idx) * img_width + x0;
        image[start..start + patch_width].copy_from_slice(row);
    }
}

pub fn crop(data: &[u8], stride: usize, x0: usize, y0: usize, w: usize, h: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        let start = (y0 + y) * stride + x0;
        out.extend_from_slice(&data[start..start + w]);
    }
    out
}

pub fn probe(data: Vec<u8>, width: usize, height: usize) -> ProbeImage {
    ProbeImage::from_gray(OwnedImage::new(data, width, height).unwrap())
}

pub fn reference(name: &str, data: Vec<u8>, width: usize, height: usize) -> ReferenceImage {
    ReferenceImage::from_raw(name, data, width, height).unwrap()
}
