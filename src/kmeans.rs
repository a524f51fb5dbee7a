//! K-means color quantization.
//!
//! Pixels are first deduplicated into [`UniqueColorCounts`] so that each unique color is a single
//! weighted point. Initial centroids are chosen by weighted k-means++ from a seeded random number
//! generator, after which Lloyd's algorithm alternates between assigning every point to its
//! nearest centroid (squared Euclidean distance in RGB) and moving each centroid to the weighted
//! mean of its points. This repeats until no assignment changes or an iteration cap is reached.
//!
//! The result only depends on the input colors, the palette size, and the [`KmeansOptions`],
//! so repeated runs give bit-identical palettes.

// References:
// - Arthur, D. & Vassilvitskii, S. k-means++: The Advantages of Careful Seeding.
//   Proceedings of the 18th annual ACM-SIAM symposium on Discrete algorithms, 1027–1035, 2007.
// - Lloyd, S. Least squares quantization in PCM.
//   IEEE Transactions on Information Theory, vol. 28, no. 2, 129–137, 1982.

use crate::{Color, KmeansOptions, PaletteSize, UniqueColorCounts};

use std::array;

use ::palette::Srgb;
use log::debug;
use rand::{
    distributions::{Distribution, WeightedIndex},
    SeedableRng,
};
use rand_xoshiro::Xoroshiro128PlusPlus;
use wide::{f32x8, CmpLt};

/// The number of components in a point.
const N: usize = 3;

/// Returns the index of the point in `points` closest to `query`.
///
/// `points` holds eight centroids per chunk, one per lane,
/// with unused lanes set to infinity.
#[inline]
fn simd_argmin(points: &[[f32x8; N]], query: [f32; N]) -> usize {
    let incr = f32x8::ONE;
    let mut cur_chunk = f32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    let query = query.map(f32x8::splat);

    for chunk in points {
        let distance = (0..N)
            .map(|i| {
                let diff = query[i] - chunk[i];
                diff * diff
            })
            .fold(f32x8::ZERO, |a, b| a + b);

        let mask = distance.cmp_lt(min_distance);
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = mask.blend(distance, min_distance);
        cur_chunk += incr;
    }

    let mut min_lane = 0;
    let mut min_dist = f32::INFINITY;
    for (i, &v) in min_distance.as_array_ref().iter().enumerate() {
        if v < min_dist {
            min_dist = v;
            min_lane = i;
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let min_chunk = min_chunk.as_array_ref()[min_lane] as usize;

    min_chunk * 8 + min_lane
}

/// Squared Euclidean distance between two points.
#[inline]
fn distance_squared(a: [f32; N], b: [f32; N]) -> f32 {
    (0..N).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}

/// Picks up to `k` initial centroids using weighted k-means++.
///
/// The first centroid is drawn with probability proportional to each color's count,
/// every following centroid proportional to `count * D²`, where `D` is the distance
/// to the nearest centroid chosen so far.
fn kmeans_plus_plus(
    points: &[[f32; N]],
    counts: &[u32],
    k: usize,
    rng: &mut Xoroshiro128PlusPlus,
) -> Vec<[f32; N]> {
    let mut centroids = Vec::with_capacity(k);

    let Ok(first) = WeightedIndex::new(counts) else {
        return centroids;
    };
    let first = points[first.sample(rng)];
    centroids.push(first);

    let mut nearest = points
        .iter()
        .map(|&p| f64::from(distance_squared(p, first)))
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let weights = nearest
            .iter()
            .zip(counts)
            .map(|(&d, &n)| d * f64::from(n));

        // fails only if every point already coincides with a centroid
        let Ok(distribution) = WeightedIndex::new(weights) else {
            break;
        };

        let centroid = points[distribution.sample(rng)];
        centroids.push(centroid);

        for (d, &p) in nearest.iter_mut().zip(points) {
            *d = d.min(f64::from(distance_squared(p, centroid)));
        }
    }

    centroids
}

/// The state for Lloyd's algorithm over a set of weighted points.
struct State<'a> {
    /// The unique colors as points.
    points: &'a [[f32; N]],
    /// The weight (pixel count) of each point.
    weights: &'a [u32],
    /// The centroids packed eight to a chunk for [`simd_argmin`].
    components: Vec<[f32x8; N]>,
    /// The current centroids.
    centroids: Vec<[f32; N]>,
    /// The centroid index assigned to each point.
    assignments: Vec<usize>,
    /// The total weight of the points assigned to each centroid.
    counts: Vec<u64>,
}

impl<'a> State<'a> {
    /// Creates the state for the given points and initial centroids.
    fn new(points: &'a [[f32; N]], weights: &'a [u32], centroids: Vec<[f32; N]>) -> Self {
        let mut state = Self {
            points,
            weights,
            components: Vec::with_capacity(centroids.len().div_ceil(8)),
            counts: vec![0; centroids.len()],
            centroids,
            assignments: vec![usize::MAX; points.len()],
        };
        state.pack_centroids();
        state
    }

    /// Copies `centroids` into the SIMD layout.
    fn pack_centroids(&mut self) {
        let Self { components, centroids, .. } = self;
        components.clear();
        for chunk in centroids.chunks(8) {
            let mut arr = [[f32::INFINITY; 8]; N];
            for (lane, centroid) in chunk.iter().enumerate() {
                for c in 0..N {
                    arr[c][lane] = centroid[c];
                }
            }
            components.push(arr.map(f32x8::new));
        }
    }

    /// Assigns each point to its nearest centroid, returning whether any assignment changed.
    fn assign(&mut self) -> bool {
        let Self { points, components, assignments, .. } = self;
        let mut changed = false;
        for (assignment, &point) in assignments.iter_mut().zip(points.iter()) {
            let nearest = simd_argmin(components, point);
            if *assignment != nearest {
                *assignment = nearest;
                changed = true;
            }
        }
        changed
    }

    /// Moves each centroid to the weighted mean of its assigned points.
    ///
    /// Centroids without any points keep their position.
    fn update(&mut self) {
        let Self {
            points, weights, centroids, assignments, counts, ..
        } = self;

        let mut sums = vec![[0.0f64; N]; centroids.len()];
        counts.fill(0);

        for ((&point, &weight), &i) in points.iter().zip(weights.iter()).zip(assignments.iter()) {
            let w = f64::from(weight);
            for c in 0..N {
                sums[i][c] += w * f64::from(point[c]);
            }
            counts[i] += u64::from(weight);
        }

        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(counts.iter()) {
            if count > 0 {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                {
                    *centroid = array::from_fn(|c| (sum[c] / count as f64) as f32);
                }
            }
        }

        self.pack_centroids();
    }

    /// Runs Lloyd's algorithm until convergence or the iteration cap.
    fn run(&mut self, max_iterations: u32) {
        for iteration in 1..=max_iterations {
            let changed = self.assign();
            self.update();
            if !changed {
                debug!("k-means converged after {iteration} iterations");
                return;
            }
        }
        debug!("k-means stopped at the iteration cap of {max_iterations}");
    }

    /// Converts the non-empty clusters into palette colors.
    fn into_palette(self, total: u64) -> Vec<Color> {
        let Self { centroids, counts, .. } = self;

        let empty = counts.iter().filter(|&&n| n == 0).count();
        if empty > 0 {
            debug!("dropping {empty} empty k-means clusters");
        }

        centroids
            .into_iter()
            .zip(counts)
            .filter(|&(_, count)| count > 0)
            .map(|(centroid, count)| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let [r, g, b] = centroid.map(|c| c.round().clamp(0.0, 255.0) as u8);

                #[allow(clippy::cast_precision_loss)]
                let frequency = count as f64 / total as f64;

                Color::new(Srgb::new(r, g, b), frequency)
            })
            .collect()
    }
}

/// Returns each unique color as its own palette color.
fn trivial_palette(color_counts: &UniqueColorCounts) -> Vec<Color> {
    #[allow(clippy::cast_precision_loss)]
    let total = color_counts.total_count() as f64;

    color_counts
        .colors()
        .iter()
        .zip(color_counts.counts())
        .map(|(&color, &count)| Color::new(color, f64::from(count) / total))
        .collect()
}

/// Computes a color palette for the given colors using k-means.
///
/// Each color's frequency is the fraction of pixels assigned to its cluster,
/// so the frequencies sum to `1`. The palette is in centroid order (unsorted).
///
/// If there are at most `palette_size` unique colors, each unique color is returned as is.
/// Clusters that end up without any pixels are left out, so the palette may have
/// fewer than `palette_size` colors.
#[must_use]
pub fn palette(
    color_counts: &UniqueColorCounts,
    palette_size: PaletteSize,
    options: &KmeansOptions,
) -> Vec<Color> {
    if color_counts.is_empty() {
        return Vec::new();
    }

    let k = palette_size.as_usize();
    if color_counts.len() <= k {
        return trivial_palette(color_counts);
    }

    let points = color_counts
        .color_components()
        .iter()
        .map(|color| color.map(f32::from))
        .collect::<Vec<_>>();

    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(options.seed);
    let centroids = kmeans_plus_plus(&points, color_counts.counts(), k, rng);

    let mut state = State::new(&points, color_counts.counts(), centroids);
    state.run(options.max_iterations.max(1));
    state.into_palette(color_counts.total_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn size(k: u16) -> PaletteSize {
        PaletteSize::try_from(k).unwrap()
    }

    #[test]
    fn empty_input() {
        let counts = UniqueColorCounts::new(&[]);
        assert!(palette(&counts, size(5), &KmeansOptions::new()).is_empty());
    }

    #[test]
    fn simd_argmin_finds_nearest() {
        let centroids = (0..19)
            .map(|i| [i as f32 * 10.0, 0.0, 0.0])
            .collect::<Vec<_>>();
        let state = State::new(&[], &[], centroids);

        assert_eq!(simd_argmin(&state.components, [0.0, 0.0, 0.0]), 0);
        assert_eq!(simd_argmin(&state.components, [94.0, 1.0, 0.0]), 9);
        assert_eq!(simd_argmin(&state.components, [176.0, 0.0, 0.0]), 18);
        assert_eq!(simd_argmin(&state.components, [1000.0, 0.0, 0.0]), 18);
    }

    #[test]
    fn not_enough_colors() {
        let colors = vec![Srgb::new(1, 2, 3), Srgb::new(1, 2, 3), Srgb::new(9, 9, 9)];
        let counts = UniqueColorCounts::new(&colors);
        let palette = palette(&counts, size(5), &KmeansOptions::new());
        assert_eq!(palette.len(), 2);
        assert_frequencies_sum_to_one(&palette);
        assert!(palette.contains(&Color::new(Srgb::new(9, 9, 9), 1.0 / 3.0)));
    }

    #[test]
    fn two_clusters() {
        let mut colors = vec![Srgb::new(10, 10, 10); 30];
        colors.extend(vec![Srgb::new(12, 10, 10); 10]);
        colors.extend(vec![Srgb::new(240, 240, 240); 20]);
        colors.extend(vec![Srgb::new(244, 240, 240); 20]);

        let counts = UniqueColorCounts::new(&colors);
        let mut palette = palette(&counts, size(2), &KmeansOptions::new());
        palette.sort_by(|a, b| a.luminance().total_cmp(&b.luminance()));

        assert_eq!(palette.len(), 2);
        // (30 * 10 + 10 * 12) / 40 = 10.5 => 11
        assert_eq!(palette[0], Color::new(Srgb::new(11, 10, 10), 0.5));
        assert_eq!(palette[1], Color::new(Srgb::new(242, 240, 240), 0.5));
    }

    #[test]
    fn requested_size_and_frequency_sum() {
        let counts = UniqueColorCounts::new(&test_data_1024());
        for k in [1, 5, 10, 100] {
            let palette = palette(&counts, size(k), &KmeansOptions::new());
            assert_eq!(palette.len(), usize::from(k));
            assert_frequencies_sum_to_one(&palette);
        }
    }

    #[test]
    fn deterministic_for_a_seed() {
        let counts = UniqueColorCounts::new(&test_data_1024());
        let options = KmeansOptions::new().seed(42);
        let a = palette(&counts, size(16), &options);
        let b = palette(&counts, size(16), &options);
        assert_eq!(a.len(), b.len());
        for (a, b) in a.iter().zip(&b) {
            assert_eq!(a.rgb(), b.rgb());
            assert_eq!(a.frequency().to_bits(), b.frequency().to_bits());
        }
    }

    #[test]
    fn seeding_picks_distinct_points() {
        let counts = UniqueColorCounts::new(&test_data_256());
        let points = counts
            .color_components()
            .iter()
            .map(|c| c.map(f32::from))
            .collect::<Vec<_>>();

        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(0);
        let centroids = kmeans_plus_plus(&points, counts.counts(), 32, rng);
        assert_eq!(centroids.len(), 32);
        for i in 0..centroids.len() {
            for j in (i + 1)..centroids.len() {
                assert_ne!(centroids[i], centroids[j]);
            }
        }
    }
}
