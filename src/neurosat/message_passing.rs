use candle_core::Tensor;
use candle_nn::VarBuilder;
use tracing::trace;

use super::batch::Batch;
use super::error::Result;
use super::lstm::{LayerNormLstmCell, NodeState};
use super::mlp::Mlp;

/// 1 ラウンド分の状態. ラウンドごとに新しい値を返し, 上書きはしない
#[derive(Clone, Debug)]
pub struct RoundState {
    pub literals: NodeState,
    pub clauses: NodeState,
}

/// 節更新 → リテラル更新を交互に行うメッセージパッシング
#[derive(Clone, Debug)]
pub struct MessagePassing {
    d: usize,
    lc_msg: Mlp,
    cl_msg: Mlp,
    l_update: LayerNormLstmCell,
    c_update: LayerNormLstmCell,
}

impl MessagePassing {
    pub fn new(d: usize, n_msg_layers: usize, vb: VarBuilder) -> Result<Self> {
        let widths = vec![d; n_msg_layers + 1];
        Ok(MessagePassing {
            d,
            lc_msg: Mlp::new(d, &widths, vb.pp("lc_msg"))?,
            cl_msg: Mlp::new(d, &widths, vb.pp("cl_msg"))?,
            l_update: LayerNormLstmCell::new(2 * d, d, vb.pp("l_update"))?,
            c_update: LayerNormLstmCell::new(d, d, vb.pp("c_update"))?,
        })
    }

    /// `l_init`, `c_init` (`[1, d]`) を `1/sqrt(d)` 倍して全ノードに配る. メモリセルは 0
    pub fn initial_state(&self, batch: &Batch, l_init: &Tensor, c_init: &Tensor) -> Result<RoundState> {
        let d = self.d;
        let denom = (d as f64).sqrt();
        let device = batch.device();
        let literals = NodeState {
            h: (l_init / denom)?.broadcast_as((batch.n_lits(), d))?.contiguous()?,
            c: Tensor::zeros((batch.n_lits(), d), l_init.dtype(), device)?,
        };
        let clauses = NodeState {
            h: (c_init / denom)?.broadcast_as((batch.n_clauses(), d))?.contiguous()?,
            c: Tensor::zeros((batch.n_clauses(), d), c_init.dtype(), device)?,
        };
        Ok(RoundState { literals, clauses })
    }

    pub fn round(&self, batch: &Batch, state: RoundState) -> Result<RoundState> {
        let incidence = batch.incidence();

        let lc_msgs = incidence.to_clauses(&self.lc_msg.forward(&state.literals.h)?)?;
        let clauses = self.c_update.forward(&lc_msgs, &state.clauses)?;

        let cl_msgs = incidence.to_literals(&self.cl_msg.forward(&clauses.h)?)?;
        let flipped = batch.flip(&state.literals.h)?;
        let literal_input = Tensor::cat(&[&cl_msgs, &flipped], 1)?;
        let literals = self.l_update.forward(&literal_input, &state.literals)?;

        Ok(RoundState { literals, clauses })
    }

    pub fn run(&self, batch: &Batch, initial: RoundState, n_rounds: usize) -> Result<RoundState> {
        let mut state = initial;
        for t in 0..n_rounds {
            trace!(round = t, n_lits = batch.n_lits(), n_clauses = batch.n_clauses(), "message passing");
            state = self.round(batch, state)?;
        }
        Ok(state)
    }
}
