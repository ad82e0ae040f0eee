use approx::assert_abs_diff_eq;
use fftindex_algorithms::{
    filter_peaks, flood_fill, peaks_to_vectors, FloodFillState, GridGeometry, IntensityVolume,
};

const N: usize = 32;

fn flat(x: usize, y: usize, z: usize) -> usize {
    z + N * y + N * N * x
}

fn volume(spots: &[((usize, usize, usize), f64)]) -> IntensityVolume {
    let mut values = vec![0.0; N * N * N];
    for &((x, y, z), v) in spots {
        values[flat(x, y, z)] = v;
    }
    IntensityVolume::from_values(N, values).unwrap()
}

#[test]
fn test_peak_across_edge_becomes_one_vector() {
    // One region straddling y = N-1 | 0 at x = 10.
    let vol = volume(&[((10, 0, 0), 500.0), ((10, N - 1, 0), 500.0)]);
    let search = flood_fill(&vol, 3.0).unwrap();
    assert_eq!(search.peaks.len(), 1);
    assert_eq!(search.peaks[0].voxel_count, 2);

    // d_min = 2: one voxel is 1 Å.
    let geometry = GridGeometry::new(2.0, N).unwrap();
    let vectors = peaks_to_vectors(&search.peaks, &geometry, 3.0, 20.0);
    assert_eq!(vectors.len(), 1);
    assert_abs_diff_eq!(vectors[0].vector.x, 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(vectors[0].vector.y, -0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(vectors[0].vector.z, 0.0, epsilon = 1e-9);
}

#[test]
fn test_antipodal_peaks_merge() {
    // +8 and -8 voxels along z.
    let vol = volume(&[((0, 0, 8), 400.0), ((0, 0, N - 8), 300.0)]);
    let search = flood_fill(&vol, 3.0).unwrap();
    assert_eq!(search.peaks.len(), 2);

    let geometry = GridGeometry::new(2.0, N).unwrap();
    let vectors = peaks_to_vectors(&search.peaks, &geometry, 3.0, 20.0);
    assert_eq!(vectors.len(), 1);
    assert_abs_diff_eq!(vectors[0].vector.z, 8.0, epsilon = 1e-9);
}

#[test]
fn test_volume_filter_drops_small_regions() {
    let mut spots = Vec::new();
    // 3x3x1 block around (5, 5, 5)
    for dx in 0..3 {
        for dy in 0..3 {
            spots.push(((4 + dx, 4 + dy, 5), 200.0));
        }
    }
    // lone voxel
    spots.push(((20, 20, 20), 200.0));
    let vol = volume(&spots);

    let search = flood_fill(&vol, 3.0).unwrap();
    let counts: Vec<usize> = search.peaks.iter().map(|p| p.voxel_count).collect();
    assert_eq!(counts, vec![9, 1]);

    let kept = filter_peaks(&search.peaks, 0.15);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].voxel_count, 9);
    assert_eq!(filter_peaks(&search.peaks, 0.1).len(), 2);
}

#[test]
fn test_state_reuse_matches_fresh_search() {
    use fftindex_algorithms::flood_fill_with_state;

    let a = volume(&[((1, 2, 3), 100.0), ((1, 2, 4), 90.0)]);
    let b = volume(&[((7, 7, 7), 100.0), ((30, 30, 30), 100.0)]);
    let mut state = FloodFillState::new();

    let first = flood_fill_with_state(&a, 3.0, &mut state).unwrap();
    let second = flood_fill_with_state(&b, 3.0, &mut state).unwrap();
    assert_eq!(first, flood_fill(&a, 3.0).unwrap());
    assert_eq!(second, flood_fill(&b, 3.0).unwrap());
}
