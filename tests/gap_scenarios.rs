use gapstat::datasets::make_blobs;
use gapstat::{
    DispersionSource, Error, GapConfig, GapStatistic, KMeans, PointSet, ReferenceMethod,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// 100 points in four blobs (std 1.0) at the corners of a 20 × 20 square.
fn four_blobs(seed: u64) -> PointSet {
    let centers = vec![
        vec![-10.0, -10.0],
        vec![10.0, -10.0],
        vec![-10.0, 10.0],
        vec![10.0, 10.0],
    ];
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    make_blobs(100, &centers, 1.0, &mut rng).unwrap().points
}

#[test]
fn test_four_blobs_fixed_seed() {
    let points = four_blobs(42);
    let estimator = GapStatistic::new(KMeans::new(), GapConfig::new().with_replicates(10));
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let estimate = estimator.estimate(&points, 1..=10, &mut rng).unwrap();

    assert_eq!(estimate.recommended_k, 4);
    assert!(!estimate.recommends_single_cluster());
    assert!(estimate.failures.is_empty());

    let ks: Vec<usize> = estimate.records.iter().map(|r| r.k).collect();
    assert_eq!(ks, (1..=10).collect::<Vec<_>>());
    assert!(estimate.records[..9].iter().all(|r| r.first_difference.is_some()));
    assert_eq!(estimate.records[9].first_difference, None);
    assert!(estimate.records.iter().all(|r| r.standard_error >= 0.0));
}

#[test]
fn test_four_blobs_across_seeds() {
    let estimator = GapStatistic::new(
        KMeans::new(),
        GapConfig::new()
            .with_replicates(10)
            .with_initialization_retries(3),
    );
    let seeds = 0..10u64;
    let hits = seeds
        .clone()
        .filter(|&seed| {
            let points = four_blobs(1000 + seed);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            matches!(
                estimator.estimate(&points, 1..=10, &mut rng),
                Ok(estimate) if (3..=5).contains(&estimate.recommended_k)
            )
        })
        .count();
    assert!(hits >= 8, "only {} of {} seeds recommended k in 3..=5", hits, seeds.count());
}

#[test]
fn test_principal_axes_reference() {
    let points = four_blobs(7);
    let estimator = GapStatistic::new(
        KMeans::new(),
        GapConfig::new().with_reference_method(ReferenceMethod::PrincipalAxes),
    );
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let estimate = estimator.estimate(&points, 1..=8, &mut rng).unwrap();
    assert!((3..=5).contains(&estimate.recommended_k));
}

#[test]
fn test_identical_points_are_degenerate() {
    let points = PointSet::from_rows(&vec![vec![2.5, -1.0]; 30]).unwrap();
    let estimator = GapStatistic::default();
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    match estimator.estimate(&points, 1..=4, &mut rng) {
        Err(Error::DegenerateDispersion { k, data, partial }) => {
            assert_eq!(k, 1);
            assert_eq!(data, DispersionSource::Observed);
            assert!(partial.is_empty());
        }
        other => panic!("expected DegenerateDispersion, got {:?}", other),
    }
}

#[test]
fn test_k_equal_to_point_count_is_degenerate() {
    let points = PointSet::from_rows(&[
        vec![0.0, 0.0],
        vec![1.0, 3.0],
        vec![4.0, 1.0],
        vec![6.0, 6.0],
        vec![9.0, 2.0],
        vec![3.0, 8.0],
    ])
    .unwrap();
    let estimator = GapStatistic::new(KMeans::new(), GapConfig::new().with_replicates(4));
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let error = estimator.estimate(&points, 1..=6, &mut rng).unwrap_err();

    match &error {
        Error::DegenerateDispersion { k, data, .. } => {
            assert_eq!(*k, 6);
            assert_eq!(*data, DispersionSource::Observed);
        }
        other => panic!("expected DegenerateDispersion, got {:?}", other),
    }
    let ks: Vec<usize> = error.partial_records().iter().map(|r| r.k).collect();
    assert_eq!(ks, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_single_k_has_no_successor() {
    let points = four_blobs(0);
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    assert!(matches!(
        GapStatistic::default().estimate(&points, 1..=1, &mut rng),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_estimate_is_idempotent() {
    let points = four_blobs(11);
    let estimator = GapStatistic::new(
        KMeans::new(),
        GapConfig::new().with_replicates(5).with_initialization_retries(2),
    );
    let a = estimator
        .estimate(&points, 1..=6, &mut ChaCha20Rng::seed_from_u64(5))
        .unwrap();
    let b = estimator
        .estimate(&points, 1..=6, &mut ChaCha20Rng::seed_from_u64(5))
        .unwrap();
    assert_eq!(a.records, b.records);
    assert_eq!(a.recommended_k, b.recommended_k);
}

#[test]
fn test_parallel_matches_sequential() {
    let points = four_blobs(23);
    let config = GapConfig::new().with_replicates(6).with_initialization_retries(2);
    let sequential = GapStatistic::new(KMeans::new(), config.clone())
        .estimate(&points, 2..=7, &mut ChaCha20Rng::seed_from_u64(9))
        .unwrap();
    let parallel = GapStatistic::new(KMeans::new(), config.with_parallel(true))
        .estimate(&points, 2..=7, &mut ChaCha20Rng::seed_from_u64(9))
        .unwrap();

    assert_eq!(sequential.records, parallel.records);
    assert_eq!(sequential.recommended_k, parallel.recommended_k);
    let ks: Vec<usize> = parallel.records.iter().map(|r| r.k).collect();
    assert_eq!(ks, vec![2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_parallel_reports_same_failure() {
    let points = PointSet::from_rows(&[
        vec![0.0, 0.0],
        vec![1.0, 3.0],
        vec![4.0, 1.0],
        vec![6.0, 6.0],
    ])
    .unwrap();
    let config = GapConfig::new().with_replicates(3).with_parallel(true);
    let error = GapStatistic::new(KMeans::new(), config)
        .estimate(&points, 1..=4, &mut ChaCha20Rng::seed_from_u64(2))
        .unwrap_err();
    assert_eq!(error.k(), Some(4));
    assert_eq!(error.partial_records().len(), 3);
}
