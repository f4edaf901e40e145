use candle_core::backprop::GradStore;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::exponential_smoother::ExponentialSmootherWithRunUpPeriod;
use super::loss::{accuracy, l2_penalty, labels_tensor, logistic_loss};
use crate::neurosat::{Batch, Error, NeuroSat, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// 損失に加える L2 正則化の係数
    pub l2_weight: f64,
    /// 勾配の全体ノルムの上限
    pub clip_norm: f64,
    /// 損失の指数平滑の時定数 (ステップ数)
    pub smoothing_time_constant: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 1e-5,
            weight_decay: 1e-10,
            l2_weight: 1e-10,
            clip_norm: 0.5,
            smoothing_time_constant: 100.0,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!("learning rate must be positive, got {}", self.learning_rate)));
        }
        if !(self.clip_norm > 0.0) {
            return Err(Error::InvalidConfig(format!("clip norm must be positive, got {}", self.clip_norm)));
        }
        if !(self.smoothing_time_constant >= 1.0) || !self.smoothing_time_constant.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "smoothing time constant must be finite and at least 1, got {}",
                self.smoothing_time_constant
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub loss: f32,
    pub smoothed_loss: f32,
    pub accuracy: f32,
    /// クリップ前の勾配ノルム
    pub grad_norm: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
}

/// モデルの外側で損失計算と最適化を受け持つ
pub struct Trainer {
    config: TrainConfig,
    vars: Vec<Var>,
    optimizer: AdamW,
    smoother: ExponentialSmootherWithRunUpPeriod<f32>,
    step_count: usize,
}

impl Trainer {
    pub fn new(varmap: &VarMap, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let vars = varmap.all_vars();
        let params = ParamsAdamW {
            lr: config.learning_rate,
            weight_decay: config.weight_decay,
            ..ParamsAdamW::default()
        };
        let optimizer = AdamW::new(vars.clone(), params)?;
        let time_constant = config.smoothing_time_constant as f32;
        Ok(Trainer {
            smoother: ExponentialSmootherWithRunUpPeriod::new(time_constant, time_constant),
            config,
            vars,
            optimizer,
            step_count: 0,
        })
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn step(&mut self, model: &NeuroSat, batch: &Batch, labels: &[bool]) -> Result<StepReport> {
        let logits = model.forward(batch)?;
        let loss = self.loss(batch, &logits, labels)?;
        let mut grads = loss.backward()?;
        let grad_norm = self.clip_gradients(&mut grads)?;
        self.optimizer.step(&grads)?;

        let loss = loss.to_scalar::<f32>()?;
        self.smoother.add(loss);
        self.step_count += 1;
        let report = StepReport {
            loss,
            smoothed_loss: self.smoother.get(),
            accuracy: accuracy(&logits, labels)?,
            grad_norm,
        };
        info!(
            step = self.step_count,
            loss = report.loss,
            smoothed_loss = report.smoothed_loss,
            accuracy = report.accuracy,
            grad_norm = report.grad_norm,
            "train step"
        );
        Ok(report)
    }

    /// パラメータを更新せずに損失と正解率を求める
    pub fn evaluate(&self, model: &NeuroSat, batch: &Batch, labels: &[bool]) -> Result<Evaluation> {
        let logits = model.forward(batch)?;
        let loss = self.loss(batch, &logits, labels)?.to_scalar::<f32>()?;
        Ok(Evaluation { loss, accuracy: accuracy(&logits, labels)? })
    }

    fn loss(&self, batch: &Batch, logits: &Tensor, labels: &[bool]) -> Result<Tensor> {
        if labels.len() != batch.n_batches() {
            return Err(Error::LabelCount { expected: batch.n_batches(), got: labels.len() });
        }
        let targets = labels_tensor(labels, logits.device())?;
        let data_loss = logistic_loss(logits, &targets)?;
        let penalty = l2_penalty(&self.vars, logits.device())?;
        Ok((data_loss + (penalty * self.config.l2_weight)?)?)
    }

    /// 全パラメータの勾配をまとめたノルムが `clip_norm` を超えないよう縮める
    fn clip_gradients(&self, grads: &mut GradStore) -> Result<f32> {
        let mut squared = 0f32;
        for var in self.vars.iter() {
            if let Some(grad) = grads.get(var) {
                squared += grad.sqr()?.sum_all()?.to_scalar::<f32>()?;
            }
        }
        let norm = squared.sqrt();
        let max_norm = self.config.clip_norm as f32;
        if norm > max_norm {
            let scale = (max_norm / (norm + 1e-6)) as f64;
            for var in self.vars.iter() {
                if let Some(grad) = grads.remove(var) {
                    grads.insert(var, (grad * scale)?);
                }
            }
        }
        Ok(norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neurosat::{Instance, NeuroSatConfig};
    use candle_core::{DType, Device};
    use candle_nn::VarBuilder;

    fn setup() -> (VarMap, NeuroSat, Batch) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = NeuroSatConfig { d: 8, n_msg_layers: 1, n_vote_layers: 1, n_rounds: 2 };
        let model = NeuroSat::new(config, vb).unwrap();
        let instances = vec![
            Instance::from_dimacs(1, &[vec![1]]).unwrap(),
            Instance::from_dimacs(1, &[vec![1], vec![-1]]).unwrap(),
            Instance::from_dimacs(1, &[vec![-1]]).unwrap(),
            Instance::from_dimacs(1, &[vec![1, -1]]).unwrap(),
        ];
        let batch = Batch::from_instances(&instances, &Device::Cpu).unwrap();
        (varmap, model, batch)
    }

    #[test]
    fn label_count_must_match_batch() {
        let (varmap, model, batch) = setup();
        let mut trainer = Trainer::new(&varmap, TrainConfig::default()).unwrap();
        let result = trainer.step(&model, &batch, &[true, false]);
        assert!(matches!(result, Err(Error::LabelCount { expected: 4, got: 2 })));
        assert_eq!(trainer.step_count(), 0);
    }

    #[test]
    fn evaluate_does_not_touch_parameters() {
        let (varmap, model, batch) = setup();
        let trainer = Trainer::new(&varmap, TrainConfig::default()).unwrap();
        let labels = [true, false, true, true];
        let before = model.forward(&batch).unwrap().to_vec1::<f32>().unwrap();
        let evaluation = trainer.evaluate(&model, &batch, &labels).unwrap();
        assert!(evaluation.loss.is_finite());
        assert_eq!(model.forward(&batch).unwrap().to_vec1::<f32>().unwrap(), before);
    }

    #[test]
    fn training_reduces_loss_on_fixed_batch() {
        let (varmap, model, batch) = setup();
        let config = TrainConfig { learning_rate: 1e-3, clip_norm: 5.0, ..TrainConfig::default() };
        let mut trainer = Trainer::new(&varmap, config).unwrap();
        let labels = [true, false, true, true];

        let initial = trainer.evaluate(&model, &batch, &labels).unwrap().loss;
        for _ in 0..30 {
            let report = trainer.step(&model, &batch, &labels).unwrap();
            assert!(report.loss.is_finite());
        }
        let trained = trainer.evaluate(&model, &batch, &labels).unwrap().loss;
        assert!(trained < initial, "loss went from {} to {}", initial, trained);
        assert_eq!(trainer.step_count(), 30);
    }

    #[test]
    fn invalid_train_config_is_rejected() {
        let varmap = VarMap::new();
        let config = TrainConfig { learning_rate: 0.0, ..TrainConfig::default() };
        assert!(matches!(Trainer::new(&varmap, config), Err(Error::InvalidConfig(_))));
        let config = TrainConfig { smoothing_time_constant: 0.5, ..TrainConfig::default() };
        assert!(matches!(Trainer::new(&varmap, config), Err(Error::InvalidConfig(_))));
    }
}
