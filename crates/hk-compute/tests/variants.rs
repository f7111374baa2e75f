//! End-to-end behaviour of the semantic variants.

use hk_compute::backends::serial::SerialEngine;
use hk_compute::domain::{
    merge, pairwise_sum, partition, Accumulator, CheckGranularity, Domain, InnerForm,
};
use hk_compute::{
    create_backend, evaluate, evaluate_config, evaluate_with, Backend, ComputeEngine,
    HeavyComputationTask, KernelConfig, KernelError, MergeStrategy, Variant,
};
use rand::seq::SliceRandom;
use std::sync::Arc;

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_size_two_scenario() {
    // base values {0, 0, 0, 1/3}; uncorrected total (1/3) * 4950 = 1650.
    // The first pair adds 0.0 to a 0.0 accumulator and floor(0) mod 100000
    // is 0, so exactly one correction fires.
    assert_eq!(evaluate(2).unwrap(), 1645.0);
}

#[test]
fn test_single_pair_domain() {
    assert_eq!(evaluate(1).unwrap(), -5.0);
}

#[test]
fn test_scope_sensitivity_size_five() {
    let per_pair = evaluate_with(5, Variant::ClosedForm, 1).unwrap();
    let per_k = evaluate_with(5, Variant::Baseline, 1).unwrap();
    let deferred = evaluate_with(5, Variant::DeferredCorrection, 1).unwrap();

    assert_eq!(per_pair.value, 82_495.0);
    assert_eq!(per_k.value, 82_480.0);
    assert_eq!(deferred.value, 82_470.0);
    assert!(per_k.corrections > per_pair.corrections);
}

#[test]
fn test_row_and_unit_scopes_compute_other_functions() {
    let canonical = evaluate(5).unwrap();
    let row_local = evaluate_with(5, Variant::RowLocal, 1).unwrap().value;
    let flattened = evaluate_with(5, Variant::Flattened, 1).unwrap().value;

    assert_eq!(row_local, 82_475.0);
    assert!(close(flattened, 77_850.0, 1e-12));
    assert_ne!(row_local, canonical);
    assert_ne!(flattened, canonical);
}

#[test]
fn test_hoisted_loop_matches_closed_form_within_rounding() {
    let closed = evaluate(500).unwrap();
    let hoisted = evaluate_with(500, Variant::HoistedLoop, 1).unwrap().value;
    assert!(close(closed, hoisted, 1e-9));
}

#[test]
fn test_reference_size_is_deterministic() {
    let first = evaluate(500).unwrap();
    for _ in 0..3 {
        assert_eq!(evaluate(500).unwrap(), first);
    }
    assert!(close(first, 153_761_845_044.880_25, 1e-12));
}

#[test]
fn test_zero_workers_falls_back_to_serial() {
    let fallback = evaluate_with(64, Variant::Partitioned, 0).unwrap();
    let serial = evaluate_with(64, Variant::Partitioned, 1).unwrap();

    assert_eq!(fallback.backend, Backend::Serial);
    assert_eq!(fallback.workers, 1);
    assert_eq!(fallback.value, serial.value);
    assert_eq!(fallback.value, evaluate(64).unwrap());
}

#[test]
fn test_partition_granularity_changes_result() {
    // Each partition starts at 0.0 and its first pair fires a correction.
    let one = evaluate_with(5, Variant::Partitioned, 1).unwrap().value;
    let two = evaluate_with(5, Variant::Partitioned, 2).unwrap().value;
    let three = evaluate_with(5, Variant::Partitioned, 3).unwrap().value;

    assert_eq!(one, 82_495.0);
    assert_eq!(two, 82_490.0);
    assert_eq!(three, 82_485.0);
}

#[test]
fn test_partitioned_is_deterministic_per_worker_count() {
    let a = evaluate_with(200, Variant::Partitioned, 4).unwrap();
    let b = evaluate_with(200, Variant::Partitioned, 4).unwrap();
    assert_eq!(a.value, b.value);
    assert_eq!(a.partitions, 4);
}

#[test]
fn test_row_local_independent_of_worker_count() {
    let serial = evaluate_with(60, Variant::RowLocal, 1).unwrap();
    let parallel = evaluate_with(60, Variant::RowLocal, 4).unwrap();
    assert_eq!(serial.value, parallel.value);
    assert_eq!(serial.partitions, 60);
}

#[test]
fn test_flattened_worker_count_only_changes_rounding() {
    let serial = evaluate_with(20, Variant::Flattened, 1).unwrap();
    let parallel = evaluate_with(20, Variant::Flattened, 3).unwrap();
    assert_eq!(serial.corrections, parallel.corrections);
    assert!(close(serial.value, parallel.value, 1e-12));
}

#[test]
fn test_merge_strategies_agree() {
    let engine = create_backend(Backend::Cpu, 4).unwrap();
    let values: Vec<f64> = MergeStrategy::ALL
        .into_iter()
        .map(|strategy| {
            HeavyComputationTask::new(150, Variant::Partitioned)
                .with_merge(strategy)
                .execute(&engine)
                .unwrap()
                .value
        })
        .collect();

    for value in &values[1..] {
        assert!(close(values[0], *value, 1e-12));
    }
}

#[test]
fn test_merge_order_independence() {
    let engine: Arc<dyn ComputeEngine> = Arc::new(SerialEngine::new());
    let parts = partition(300, 7).unwrap();
    let domain = Domain::new(300).unwrap();
    let results = engine.map_partitions(&parts, &|part| {
        let mut acc = Accumulator::new(CheckGranularity::PerPair(InnerForm::ClosedForm));
        for i in part.range() {
            for j in 0..domain.size() {
                acc.absorb_pair(domain.base(i, j));
            }
        }
        acc.finish(*part)
    });

    let ordered = merge(&results, MergeStrategy::PostJoin);
    let mut shuffled = results.clone();
    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        shuffled.shuffle(&mut rng);
        let values: Vec<f64> = shuffled.iter().map(|r| r.value).collect();
        assert!(close(ordered, pairwise_sum(&values), 1e-12));
    }
}

#[test]
fn test_config_driven_evaluation() {
    let config = KernelConfig::default()
        .with_size(5)
        .with_variant(Variant::Partitioned)
        .with_workers(2)
        .with_merge(MergeStrategy::Locked);
    let eval = evaluate_config(&config).unwrap();
    assert_eq!(eval.value, 82_490.0);

    let invalid = KernelConfig::default().with_size(-4);
    assert_eq!(
        evaluate_config(&invalid).unwrap_err(),
        KernelError::InvalidDomain { size: -4 }
    );
}

#[test]
fn test_every_variant_rejects_empty_domain() {
    for variant in Variant::ALL {
        assert_eq!(
            evaluate_with(0, variant, 2).unwrap_err(),
            KernelError::InvalidDomain { size: 0 }
        );
    }
}
