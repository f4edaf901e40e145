//! Bipartite literal/clause aggregation.
//!
//! Both directions are a single matrix product against the 0/1 incidence
//! matrix, so a node with no incident edges receives the zero vector.

use candle_core::{DType, Tensor};

use super::error::{Error, Result};

/// `[n_lits, n_clauses]` の incidence 行列と, その転置
#[derive(Clone, Debug)]
pub struct Incidence {
    x: Tensor,
    x_t: Tensor,
}

impl Incidence {
    pub fn new(x: Tensor) -> Result<Self> {
        let (n_lits, n_clauses) = x.dims2()?;
        if n_lits % 2 != 0 {
            return Err(Error::OddLiteralCount(n_lits));
        }
        if n_lits == 0 || n_clauses == 0 {
            return Err(Error::EmptyBatch);
        }
        if x.dtype() != DType::F32 {
            return Err(Error::InvalidIncidence(format!("expected dtype f32, got {:?}", x.dtype())));
        }
        let entries = x.flatten_all()?.to_vec1::<f32>()?;
        if let Some(entry) = entries.iter().find(|&&entry| entry != 0.0 && entry != 1.0) {
            return Err(Error::InvalidIncidence(format!("entry {} is neither 0 nor 1", entry)));
        }
        let x = x.contiguous()?;
        let x_t = x.t()?.contiguous()?;
        Ok(Incidence { x, x_t })
    }

    #[inline(always)]
    pub fn n_lits(&self) -> usize {
        self.x.dims()[0]
    }

    #[inline(always)]
    pub fn n_vars(&self) -> usize {
        self.n_lits() / 2
    }

    #[inline(always)]
    pub fn n_clauses(&self) -> usize {
        self.x.dims()[1]
    }

    pub fn matrix(&self) -> &Tensor {
        &self.x
    }

    /// リテラル → 節: `x^T @ literal_messages`, 結果は `[n_clauses, d]`
    pub fn to_clauses(&self, literal_messages: &Tensor) -> Result<Tensor> {
        self.check_rows("literal messages", literal_messages, self.n_lits())?;
        Ok(self.x_t.matmul(literal_messages)?)
    }

    /// 節 → リテラル: `x @ clause_messages`, 結果は `[n_lits, d]`
    pub fn to_literals(&self, clause_messages: &Tensor) -> Result<Tensor> {
        self.check_rows("clause messages", clause_messages, self.n_clauses())?;
        Ok(self.x.matmul(clause_messages)?)
    }

    fn check_rows(&self, what: &'static str, messages: &Tensor, rows: usize) -> Result<()> {
        let (n, d) = messages.dims2()?;
        if n != rows {
            return Err(Error::ShapeMismatch { what, expected: vec![rows, d], got: vec![n, d] });
        }
        Ok(())
    }
}
