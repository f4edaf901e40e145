//! Training on every 2-variable, 1-clause formula.
//!
//! Each of the 15 non-empty clauses over `{x1, x2, !x1, !x2}` is satisfiable.
//! After training on 12 of them, the model must call the 3 held-out
//! formulas satisfiable. A second case pairs a satisfiable and an
//! unsatisfiable 1-variable formula, which no vote bias alone can separate.

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use neurosat::{Batch, Instance, NeuroSat, NeuroSatConfig, TrainConfig, Trainer};

/// 4 つのリテラル行 (x1, x2, !x1, !x2) の非空部分集合を 1 節とする問題
fn single_clause_instances() -> Vec<Instance> {
    (1u8..16)
        .map(|mask| {
            let rows: Vec<Vec<u8>> = (0..4).map(|literal| vec![(mask >> literal) & 1]).collect();
            Instance::from_dense(2, 1, &rows).unwrap()
        })
        .collect()
}

#[test]
fn or_clause_incidence() {
    // (x1 v x2)
    let instance = Instance::from_dense(2, 1, &[vec![1], vec![1], vec![0], vec![0]]).unwrap();
    assert_eq!(instance, Instance::from_dimacs(2, &[vec![1, 2]]).unwrap());
    let batch = Batch::from_instances(&[instance], &Device::Cpu).unwrap();
    assert_eq!(batch.incidence().matrix().dims(), &[4, 1]);
    assert_eq!(
        batch.incidence().matrix().to_vec2::<f32>().unwrap(),
        vec![vec![1.0], vec![1.0], vec![0.0], vec![0.0]]
    );
}

#[test]
fn trained_model_accepts_held_out_satisfiable_formulas() {
    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let config = NeuroSatConfig { d: 8, n_msg_layers: 1, n_vote_layers: 1, n_rounds: 4 };
    let model = NeuroSat::new(config, vb).unwrap();

    let mut instances = single_clause_instances();
    assert_eq!(instances.len(), 15);
    let held_out: Vec<Instance> = instances.split_off(12);
    let train = Batch::from_instances(&instances, &device).unwrap();
    let test = Batch::from_instances(&held_out, &device).unwrap();
    let labels = vec![true; instances.len()];

    let train_config = TrainConfig { learning_rate: 1e-2, ..TrainConfig::default() };
    let mut trainer = Trainer::new(&varmap, train_config).unwrap();
    let votes_before = model.votes(&train).unwrap();
    let mut last = None;
    for _ in 0..40 {
        last = Some(trainer.step(&model, &train, &labels).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.accuracy, 1.0);
    assert!(last.smoothed_loss.is_finite());

    // バイアスだけでなく, リテラルごとの投票そのものが学習で動いている
    let votes_after = model.votes(&train).unwrap();
    let before = votes_before.flatten_all().unwrap().to_vec1::<f32>().unwrap();
    let after = votes_after.flatten_all().unwrap().to_vec1::<f32>().unwrap();
    let moved = before.iter().zip(after.iter()).map(|(a, b)| (a - b).abs()).fold(0.0, f32::max);
    assert!(moved > 1e-4, "votes moved by {}", moved);

    let logits = model.forward(&test).unwrap().to_vec1::<f32>().unwrap();
    assert_eq!(logits.len(), 3);
    assert!(logits.iter().all(|&logit| logit > 0.0), "held-out logits: {:?}", logits);

    let evaluation = trainer.evaluate(&model, &test, &[true, true, true]).unwrap();
    assert_eq!(evaluation.accuracy, 1.0);
}

#[test]
fn training_separates_satisfiable_from_unsatisfiable() {
    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let config = NeuroSatConfig { d: 8, n_msg_layers: 1, n_vote_layers: 1, n_rounds: 4 };
    let model = NeuroSat::new(config, vb).unwrap();

    // (x1) と (x1) ∧ (!x1)
    let instances = vec![
        Instance::from_dimacs(1, &[vec![1]]).unwrap(),
        Instance::from_dimacs(1, &[vec![1], vec![-1]]).unwrap(),
    ];
    let labels = [true, false];
    let batches: Vec<Batch> =
        instances.iter().map(|instance| Batch::from_instances(std::slice::from_ref(instance), &device).unwrap()).collect();

    let train_config = TrainConfig { learning_rate: 1e-2, ..TrainConfig::default() };
    let mut trainer = Trainer::new(&varmap, train_config).unwrap();
    for _ in 0..100 {
        for (batch, &label) in batches.iter().zip(labels.iter()) {
            trainer.step(&model, batch, &[label]).unwrap();
        }
    }

    let logits: Vec<f32> =
        batches.iter().map(|batch| model.forward(batch).unwrap().to_vec1::<f32>().unwrap()[0]).collect();
    assert!(logits[0] > logits[1], "logits: {:?}", logits);
}
