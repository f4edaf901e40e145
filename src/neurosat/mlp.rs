use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};

use super::error::{Error, Result};

/// 負側の傾き. 出力 1 次元の投票層でも勾配が消えないようにする
const NEGATIVE_SLOPE: f64 = 0.2;

/// 全結合層の列. 各層の後 (最終層を含む) に LeakyReLU を挟む
#[derive(Clone, Debug)]
pub struct Mlp {
    layers: Vec<Linear>,
}

impl Mlp {
    /// `widths` は各層の出力幅. 出力次元は最後の幅になる
    pub fn new(d_in: usize, widths: &[usize], vb: VarBuilder) -> Result<Self> {
        if widths.is_empty() {
            return Err(Error::InvalidConfig("an MLP needs at least one layer".to_string()));
        }
        let mut layers = Vec::with_capacity(widths.len());
        let mut d = d_in;
        for (i, &width) in widths.iter().enumerate() {
            layers.push(linear(d, width, vb.pp(i.to_string()))?);
            d = width;
        }
        Ok(Mlp { layers })
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mut h = x.clone();
        for layer in self.layers.iter() {
            h = leaky_relu(&layer.forward(&h)?)?;
        }
        Ok(h)
    }
}

fn leaky_relu(x: &Tensor) -> Result<Tensor> {
    let negative = (x.neg()?.relu()? * NEGATIVE_SLOPE)?;
    Ok((x.relu()? - negative)?)
}
