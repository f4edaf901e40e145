use candle_core::Tensor;
use candle_nn::{Init, VarBuilder};

use super::batch::Batch;
use super::config::NeuroSatConfig;
use super::error::Result;
use super::message_passing::{MessagePassing, RoundState};
use super::vote::Vote;

/// NeuroSAT
///
/// パラメータは `VarBuilder` 経由で登録され, 呼び出し側の `VarMap` が所有する.
/// `forward` はパラメータと入力だけで決まり, 副作用を持たない.
#[derive(Clone, Debug)]
pub struct NeuroSat {
    config: NeuroSatConfig,
    l_init: Tensor,
    c_init: Tensor,
    message_passing: MessagePassing,
    vote: Vote,
}

impl NeuroSat {
    pub fn new(config: NeuroSatConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        let d = config.d;
        let normal = Init::Randn { mean: 0.0, stdev: 1.0 };
        Ok(NeuroSat {
            l_init: vb.get_with_hints((1, d), "l_init", normal)?,
            c_init: vb.get_with_hints((1, d), "c_init", normal)?,
            message_passing: MessagePassing::new(d, config.n_msg_layers, vb.clone())?,
            vote: Vote::new(d, config.n_vote_layers, vb)?,
            config,
        })
    }

    pub fn config(&self) -> &NeuroSatConfig {
        &self.config
    }

    pub fn vote_bias(&self) -> &Tensor {
        self.vote.bias()
    }

    pub fn initial_state(&self, batch: &Batch) -> Result<RoundState> {
        self.message_passing.initial_state(batch, &self.l_init, &self.c_init)
    }

    /// 初期状態から `n_rounds` ラウンド進めた状態
    pub fn run_rounds(&self, batch: &Batch, n_rounds: usize) -> Result<RoundState> {
        let initial = self.initial_state(batch)?;
        self.message_passing.run(batch, initial, n_rounds)
    }

    /// 変数ごとの (正リテラル, 負リテラル) の投票. `[n_vars, 2]`
    pub fn votes(&self, batch: &Batch) -> Result<Tensor> {
        let state = self.run_rounds(batch, self.config.n_rounds)?;
        self.vote.votes(batch, &state.literals.h)
    }

    /// 問題ごとの充足可能性ロジット. `[n_batches]`
    pub fn forward(&self, batch: &Batch) -> Result<Tensor> {
        let state = self.run_rounds(batch, self.config.n_rounds)?;
        self.vote.logits(batch, &state.literals.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neurosat::{Error, Instance};
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn small_config() -> NeuroSatConfig {
        NeuroSatConfig { d: 8, n_msg_layers: 1, n_vote_layers: 1, n_rounds: 3 }
    }

    #[test]
    fn forward_yields_one_logit_per_instance() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = NeuroSat::new(small_config(), vb).unwrap();

        let instances = vec![
            Instance::from_dimacs(3, &[vec![1, -2], vec![2, 3]]).unwrap(),
            Instance::from_dimacs(3, &[vec![-1], vec![1]]).unwrap(),
            Instance::from_dimacs(3, &[vec![1, 2, 3]]).unwrap(),
        ];
        let batch = Batch::from_instances(&instances, &Device::Cpu).unwrap();
        let logits = model.forward(&batch).unwrap();
        assert_eq!(logits.dims(), &[3]);
        assert!(logits.to_vec1::<f32>().unwrap().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn vote_bias_starts_at_zero() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = NeuroSat::new(small_config(), vb).unwrap();
        assert_eq!(model.vote_bias().to_vec1::<f32>().unwrap(), vec![0.0]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = NeuroSatConfig { d: 0, ..small_config() };
        assert!(matches!(NeuroSat::new(config, vb), Err(Error::InvalidConfig(_))));
    }
}
