use candle_core::{Device, Tensor};
use num::Integer;
use tracing::debug;

use super::error::{Error, Result};
use super::incidence::Incidence;
use super::instance::Instance;
use super::types::{complement_node, VariableSize};

/// 複数の問題を 1 つの incidence 行列に詰めたもの
///
/// リテラル行は「全問題の正リテラル」「全問題の負リテラル」の順に並び,
/// それぞれの中では問題の順に `n_vars_per_instance` 行ずつ連続する.
/// 節の列は問題の順に連結される.
#[derive(Clone, Debug)]
pub struct Batch {
    incidence: Incidence,
    n_batches: usize,
    complements: Tensor,
}

impl Batch {
    pub fn from_instances(instances: &[Instance], device: &Device) -> Result<Self> {
        let first = instances.first().ok_or(Error::EmptyBatch)?;
        let vars_per_instance = first.n_vars();
        for instance in instances.iter() {
            if instance.n_vars() != vars_per_instance {
                return Err(Error::ShapeMismatch {
                    what: "variables per instance",
                    expected: vec![vars_per_instance],
                    got: vec![instance.n_vars()],
                });
            }
        }

        let n_vars = vars_per_instance * instances.len();
        let n_lits = 2 * n_vars;
        let n_clauses: usize = instances.iter().map(|instance| instance.n_clauses()).sum();
        if n_vars == 0 || n_clauses == 0 {
            return Err(Error::EmptyBatch);
        }

        let mut data = vec![0f32; n_lits * n_clauses];
        let mut clause_offset = 0;
        for (b, instance) in instances.iter().enumerate() {
            let base = b * vars_per_instance;
            instance.scatter_into(&mut data, n_clauses, clause_offset, |node| {
                if node < vars_per_instance {
                    base + node
                } else {
                    n_vars + base + (node - vars_per_instance)
                }
            });
            clause_offset += instance.n_clauses();
        }
        debug!(n_batches = instances.len(), n_vars, n_clauses, "packed batch");

        let x = Tensor::from_vec(data, (n_lits, n_clauses), device)?;
        Self::from_incidence(x, instances.len())
    }

    /// 詰め済みの `[n_lits, n_clauses]` 行列から構築する
    pub fn from_incidence(x: Tensor, n_batches: usize) -> Result<Self> {
        let incidence = Incidence::new(x)?;
        let n_vars = incidence.n_vars();
        if n_batches == 0 {
            return Err(Error::EmptyBatch);
        }
        let (_, rest) = n_vars.div_rem(&n_batches);
        if rest != 0 {
            return Err(Error::UnevenBatch { n_vars, n_batches });
        }
        let complements = complement_indices(n_vars, incidence.matrix().device())?;
        Ok(Batch { incidence, n_batches, complements })
    }

    #[inline(always)]
    pub fn n_batches(&self) -> usize {
        self.n_batches
    }

    #[inline(always)]
    pub fn n_vars(&self) -> VariableSize {
        self.incidence.n_vars()
    }

    #[inline(always)]
    pub fn n_vars_per_instance(&self) -> VariableSize {
        self.n_vars() / self.n_batches
    }

    #[inline(always)]
    pub fn n_lits(&self) -> usize {
        self.incidence.n_lits()
    }

    #[inline(always)]
    pub fn n_clauses(&self) -> usize {
        self.incidence.n_clauses()
    }

    pub fn incidence(&self) -> &Incidence {
        &self.incidence
    }

    pub fn device(&self) -> &Device {
        self.incidence.matrix().device()
    }

    /// 各リテラルの行を相補リテラルの行で置き換える
    pub fn flip(&self, literal_states: &Tensor) -> Result<Tensor> {
        Ok(literal_states.index_select(&self.complements, 0)?)
    }
}

/// 行 `i` に相補リテラルの行番号を持つ置換
fn complement_indices(n_vars: VariableSize, device: &Device) -> Result<Tensor> {
    let ids: Vec<u32> = (0..2 * n_vars).map(|literal| complement_node(literal, n_vars) as u32).collect();
    Ok(Tensor::from_vec(ids, 2 * n_vars, device)?)
}
