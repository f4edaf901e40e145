use candle_core::Tensor;
use candle_nn::{Init, VarBuilder};

use super::batch::Batch;
use super::error::{Error, Result};
use super::mlp::Mlp;

/// リテラルごとの投票を問題ごとのロジットに集約する
#[derive(Clone, Debug)]
pub struct Vote {
    l_vote: Mlp,
    vote_bias: Tensor,
}

impl Vote {
    pub fn new(d: usize, n_vote_layers: usize, vb: VarBuilder) -> Result<Self> {
        let mut widths = vec![d; n_vote_layers];
        widths.push(1);
        Ok(Vote {
            l_vote: Mlp::new(d, &widths, vb.pp("l_vote"))?,
            vote_bias: vb.get_with_hints(1, "vote_bias", Init::Const(0.0))?,
        })
    }

    pub fn bias(&self) -> &Tensor {
        &self.vote_bias
    }

    /// 変数ごとの (正リテラル, 負リテラル) の投票. `[n_vars, 2]`
    pub fn votes(&self, batch: &Batch, literal_h: &Tensor) -> Result<Tensor> {
        let (n_lits, _) = literal_h.dims2()?;
        if n_lits != batch.n_lits() {
            return Err(Error::ShapeMismatch {
                what: "literal states",
                expected: vec![batch.n_lits()],
                got: vec![n_lits],
            });
        }
        let n_vars = batch.n_vars();
        let all_votes = self.l_vote.forward(literal_h)?;
        let positive = all_votes.narrow(0, 0, n_vars)?;
        let negative = all_votes.narrow(0, n_vars, n_vars)?;
        Ok(Tensor::cat(&[&positive, &negative], 1)?)
    }

    /// 問題ごとの全投票の平均にバイアスを足したもの. `[n_batches]`
    pub fn logits(&self, batch: &Batch, literal_h: &Tensor) -> Result<Tensor> {
        let votes = self.votes(batch, literal_h)?;
        let batched = votes.reshape((batch.n_batches(), batch.n_vars_per_instance() * 2))?;
        Ok(batched.mean(1)?.broadcast_add(&self.vote_bias)?)
    }
}
