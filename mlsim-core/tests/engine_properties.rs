//! End-to-end behaviour of the simulation engine across all four trainers.

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use mlsim_core::algorithms::kmeans;
use mlsim_core::data::{generate, linear_points};
use mlsim_core::{
    Algorithm, DataPoint, NoProgress, Parameters, SeedManager, SimError, SimulationResult,
    run_simulation, run_simulation_by_name,
};

async fn run(
    algorithm: Algorithm,
    data: &[DataPoint],
    params: &Parameters,
    seed: u64,
) -> SimulationResult {
    run_simulation(
        algorithm,
        data,
        params,
        &mut NoProgress,
        &mut StdRng::seed_from_u64(seed),
    )
    .await
    .unwrap()
}

fn quadrant_grid() -> Vec<DataPoint> {
    let coords: Vec<f64> = (0..10).map(|i| i as f64 - 3.5).collect();
    coords
        .iter()
        .flat_map(|&x| {
            coords.iter().map(move |&y| {
                DataPoint::labeled(x, y, mlsim_core::data::synth::quadrant_label(x, y))
            })
        })
        .collect()
}

fn three_blobs() -> Vec<DataPoint> {
    let centers = [(-5.0, -5.0), (0.0, 5.0), (5.0, -5.0)];
    let offsets: &[f64] = &[-0.3, 0.0, 0.3];
    centers
        .iter()
        .flat_map(|&(cx, cy)| {
            offsets.iter().flat_map(move |&dx| {
                offsets
                    .iter()
                    .map(move |&dy| DataPoint::new(cx + dx, cy + dy))
            })
        })
        .collect()
}

// --- Linear regression ---

#[tokio::test]
async fn linear_regression_recovers_exact_line() {
    let xs: Vec<f64> = (0..=20).map(|i| -5.0 + 0.5 * i as f64).collect();
    let data = linear_points(0.5, 1.0, &xs);
    let result = run(Algorithm::LinearRegression, &data, &Parameters::new(0.01, 1000), 3).await;

    let SimulationResult::LinearRegression(fit) = result else {
        panic!("expected a linear regression result");
    };
    assert!((fit.slope - 0.5).abs() < 0.05, "slope {}", fit.slope);
    assert!((fit.intercept - 1.0).abs() < 0.05, "intercept {}", fit.intercept);
    assert!(fit.mse < 0.01, "mse {}", fit.mse);
    assert_eq!(fit.history.len(), 1000);
}

#[tokio::test]
async fn three_point_scenario() {
    let data = vec![
        DataPoint::new(0.0, 1.0),
        DataPoint::new(1.0, 3.0),
        DataPoint::new(2.0, 5.0),
    ];
    let mut seen = Vec::new();
    let mut reporter = |i: usize| seen.push(i);
    let result = run_simulation(
        Algorithm::LinearRegression,
        &data,
        &Parameters::new(0.05, 200),
        &mut reporter,
        &mut StdRng::seed_from_u64(11),
    )
    .await
    .unwrap();

    let SimulationResult::LinearRegression(fit) = result else {
        panic!("expected a linear regression result");
    };
    assert!((fit.slope - 2.0).abs() < 0.1, "slope {}", fit.slope);
    assert!((fit.intercept - 1.0).abs() < 0.1, "intercept {}", fit.intercept);
    assert!(fit.r2 > 0.99, "r2 {}", fit.r2);
    assert_eq!(fit.predictions.len(), 3);
    assert_eq!(seen.first(), Some(&1));
    assert_eq!(seen.last(), Some(&200));
}

// --- Logistic regression ---

#[tokio::test]
async fn logistic_regression_separates_clusters() {
    let mut rng = StdRng::seed_from_u64(8);
    let data = generate(Algorithm::LogisticRegression, 40, 0.1, &mut rng);
    let result = run(Algorithm::LogisticRegression, &data, &Parameters::new(0.1, 200), 8).await;

    let SimulationResult::LogisticRegression(fit) = result else {
        panic!("expected a logistic regression result");
    };
    assert!(fit.accuracy >= 0.95, "accuracy {}", fit.accuracy);
    assert!(fit.probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(fit.predictions.len(), data.len());
}

// --- K-means ---

#[tokio::test]
async fn kmeans_beats_round_robin_partition() {
    let data = three_blobs();
    let params = Parameters::new(0.01, 50).clusters(3);
    let result = run(Algorithm::KMeansClustering, &data, &params, 31).await;

    let SimulationResult::KMeansClustering(fit) = result else {
        panic!("expected a k-means result");
    };

    let round_robin: Vec<usize> = (0..data.len()).map(|i| i % 3).collect();
    let means: Vec<DataPoint> = (0..3)
        .map(|c| {
            let members: Vec<&DataPoint> = data
                .iter()
                .zip(&round_robin)
                .filter(|&(_, &a)| a == c)
                .map(|(p, _)| p)
                .collect();
            let n = members.len() as f64;
            DataPoint::new(
                members.iter().map(|p| p.x).sum::<f64>() / n,
                members.iter().map(|p| p.y).sum::<f64>() / n,
            )
        })
        .collect();
    let baseline = kmeans::inertia(&data, &means, &round_robin);

    assert!(fit.inertia < baseline, "{} >= {}", fit.inertia, baseline);
    assert!(fit.history.len() <= params.iterations);
    assert_eq!(fit.iterations, fit.history.len());
    assert_eq!(fit.clusters, 3);
    assert!((-1.0..=1.0).contains(&fit.silhouette));
}

// --- Decision tree ---

#[tokio::test]
async fn decision_tree_learns_quadrants() {
    let data = quadrant_grid();
    let result = run(Algorithm::DecisionTree, &data, &Parameters::new(0.01, 500), 0).await;

    let SimulationResult::DecisionTree(fit) = result else {
        panic!("expected a decision tree result");
    };
    assert!(fit.accuracy >= 0.9, "accuracy {}", fit.accuracy);
    assert!(fit.depth <= 10);
    assert_eq!(fit.nodes, fit.tree.node_count());
    assert!((0.0..=0.5).contains(&fit.gini));
}

// --- Shared invariants ---

#[tokio::test]
async fn every_algorithm_predicts_each_point_and_keeps_ordered_history() {
    let mut seeds = SeedManager::new(2024);
    let params = Parameters::new(0.05, 80);

    for algorithm in Algorithm::ALL {
        let data = generate(algorithm, 45, 0.2, &mut seeds.rng_for("dataset"));
        let result = run_simulation(
            algorithm,
            &data,
            &params,
            &mut NoProgress,
            &mut seeds.rng_for("trainer"),
        )
        .await
        .unwrap();

        assert_eq!(result.algorithm(), algorithm);
        assert_eq!(result.predictions_len(), data.len(), "{algorithm}");

        let iterations = result.history_iterations();
        assert!(iterations.len() <= params.iterations);
        for (expected, actual) in iterations.iter().enumerate() {
            assert_eq!(*actual, expected, "{algorithm}");
        }
    }
}

#[tokio::test]
async fn progress_is_strictly_increasing_for_every_algorithm() {
    let params = Parameters::new(0.05, 57);
    for algorithm in Algorithm::ALL {
        let data = generate(algorithm, 30, 0.2, &mut StdRng::seed_from_u64(5));
        let mut seen = Vec::new();
        let mut reporter = |i: usize| seen.push(i);
        run_simulation(
            algorithm,
            &data,
            &params,
            &mut reporter,
            &mut StdRng::seed_from_u64(6),
        )
        .await
        .unwrap();

        assert!(!seen.is_empty(), "{algorithm}");
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "{algorithm}: {seen:?}");
        assert!(seen.iter().all(|&i| (1..=params.iterations).contains(&i)));
    }
}

#[tokio::test]
async fn same_seed_same_result() {
    let data = generate(Algorithm::KMeansClustering, 30, 0.3, &mut StdRng::seed_from_u64(1));
    let params = Parameters::new(0.01, 40);
    let first = run(Algorithm::KMeansClustering, &data, &params, 99).await;
    let second = run(Algorithm::KMeansClustering, &data, &params, 99).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_dataset_and_unknown_tag_are_rejected() {
    for algorithm in Algorithm::ALL {
        let err = run_simulation(
            algorithm,
            &[],
            &Parameters::default(),
            &mut NoProgress,
            &mut StdRng::seed_from_u64(0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SimError::EmptyDataset));
    }

    let err = run_simulation_by_name(
        "neuralNetwork",
        &[DataPoint::new(0.0, 0.0)],
        &Parameters::default(),
        &mut NoProgress,
        &mut StdRng::seed_from_u64(0),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SimError::UnsupportedAlgorithm(ref tag) if tag == "neuralNetwork"));
}

#[tokio::test]
async fn simulation_yields_to_other_tasks() {
    let data = generate(Algorithm::LinearRegression, 20, 0.1, &mut StdRng::seed_from_u64(3));
    let ticker = tokio::spawn(async {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        true
    });
    let result = run(Algorithm::LinearRegression, &data, &Parameters::new(0.01, 100), 3).await;
    assert_eq!(result.predictions_len(), 20);
    assert!(ticker.await.unwrap());
}
