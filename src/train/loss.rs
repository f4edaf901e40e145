use candle_core::{DType, Device, Tensor, Var};

use crate::neurosat::{Error, Result};

pub fn labels_tensor(labels: &[bool], device: &Device) -> Result<Tensor> {
    let values: Vec<f32> = labels.iter().map(|&label| if label { 1.0 } else { 0.0 }).collect();
    Ok(Tensor::from_vec(values, labels.len(), device)?)
}

/// ロジットに対するロジスティック損失の平均
///
/// `max(z, 0) - z * y + ln(1 + exp(-|z|))` の形で計算し, 大きな |z| でも溢れない.
pub fn logistic_loss(logits: &Tensor, labels: &Tensor) -> Result<Tensor> {
    if logits.dims() != labels.dims() {
        return Err(Error::LabelCount { expected: logits.elem_count(), got: labels.elem_count() });
    }
    let softplus = (logits.abs()?.neg()?.exp()? + 1.0)?.log()?;
    let loss = ((logits.relu()? - logits.mul(labels)?)? + softplus)?;
    Ok(loss.mean_all()?)
}

/// 全パラメータの二乗和
pub fn l2_penalty(vars: &[Var], device: &Device) -> Result<Tensor> {
    let mut total = Tensor::zeros((), DType::F32, device)?;
    for var in vars.iter() {
        total = (total + var.as_tensor().sqr()?.sum_all()?)?;
    }
    Ok(total)
}

/// `logit > 0` をラベルと比較した正解率
pub fn accuracy(logits: &Tensor, labels: &[bool]) -> Result<f32> {
    let logits = logits.to_vec1::<f32>()?;
    if logits.len() != labels.len() {
        return Err(Error::LabelCount { expected: logits.len(), got: labels.len() });
    }
    if labels.is_empty() {
        return Ok(0.0);
    }
    let correct = logits.iter().zip(labels.iter()).filter(|&(&logit, &label)| (logit > 0.0) == label).count();
    Ok(correct as f32 / labels.len() as f32)
}
