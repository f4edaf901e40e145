//! Layer-normalised LSTM cell.
//!
//! The gates `(i, j, f, o)` come from one bias-free affine map of
//! `[input, h]`. Each gate is layer-normalised on its own before the
//! nonlinearity, and so is the new memory cell:
//!
//! ```text
//! c' = norm_c(c * sigmoid(norm_f(f) + 1) + sigmoid(norm_i(i)) * tanh(norm_j(j)))
//! h' = tanh(c') * sigmoid(norm_o(o))
//! ```
//!
//! The cell holds no state between calls; the caller threads `(h, c)`.

use candle_core::{Tensor, D};
use candle_nn::{linear_no_bias, Init, Linear, Module, VarBuilder};

use super::error::{Error, Result};

const FORGET_BIAS: f64 = 1.0;
const NORM_EPS: f64 = 1e-5;

/// ノードの隠れ状態とメモリセル. どちらも `[n_nodes, d]`
#[derive(Clone, Debug)]
pub struct NodeState {
    pub h: Tensor,
    pub c: Tensor,
}

#[derive(Clone, Debug)]
struct LayerNorm {
    gain: Tensor,
    shift: Tensor,
}

impl LayerNorm {
    fn new(d: usize, vb: VarBuilder) -> Result<Self> {
        let gain = vb.get_with_hints(d, "gain", Init::Const(1.0))?;
        let shift = vb.get_with_hints(d, "shift", Init::Const(0.0))?;
        Ok(LayerNorm { gain, shift })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mean = x.mean_keepdim(D::Minus1)?;
        let centered = x.broadcast_sub(&mean)?;
        let variance = centered.sqr()?.mean_keepdim(D::Minus1)?;
        let normalized = centered.broadcast_div(&(variance + NORM_EPS)?.sqrt()?)?;
        Ok(normalized.broadcast_mul(&self.gain)?.broadcast_add(&self.shift)?)
    }
}

#[derive(Clone, Debug)]
pub struct LayerNormLstmCell {
    d_hidden: usize,
    gates: Linear,
    norm_i: LayerNorm,
    norm_j: LayerNorm,
    norm_f: LayerNorm,
    norm_o: LayerNorm,
    norm_c: LayerNorm,
}

impl LayerNormLstmCell {
    pub fn new(d_in: usize, d_hidden: usize, vb: VarBuilder) -> Result<Self> {
        if d_hidden == 0 {
            return Err(Error::InvalidConfig("LSTM hidden size must be positive".to_string()));
        }
        Ok(LayerNormLstmCell {
            d_hidden,
            gates: linear_no_bias(d_in + d_hidden, 4 * d_hidden, vb.pp("gates"))?,
            norm_i: LayerNorm::new(d_hidden, vb.pp("norm_i"))?,
            norm_j: LayerNorm::new(d_hidden, vb.pp("norm_j"))?,
            norm_f: LayerNorm::new(d_hidden, vb.pp("norm_f"))?,
            norm_o: LayerNorm::new(d_hidden, vb.pp("norm_o"))?,
            norm_c: LayerNorm::new(d_hidden, vb.pp("norm_c"))?,
        })
    }

    pub fn forward(&self, input: &Tensor, state: &NodeState) -> Result<NodeState> {
        let d = self.d_hidden;
        let concat = Tensor::cat(&[input, &state.h], 1)?;
        let gates = self.gates.forward(&concat)?;

        let i = self.norm_i.forward(&gates.narrow(1, 0, d)?)?;
        let j = self.norm_j.forward(&gates.narrow(1, d, d)?)?;
        let f = self.norm_f.forward(&gates.narrow(1, 2 * d, d)?)?;
        let o = self.norm_o.forward(&gates.narrow(1, 3 * d, d)?)?;

        let forget = candle_nn::ops::sigmoid(&(f + FORGET_BIAS)?)?;
        let remembered = state.c.mul(&forget)?;
        let written = candle_nn::ops::sigmoid(&i)?.mul(&j.tanh()?)?;
        let c = self.norm_c.forward(&(remembered + written)?)?;
        let h = c.tanh()?.mul(&candle_nn::ops::sigmoid(&o)?)?;
        Ok(NodeState { h, c })
    }
}
