use candle_core::{Device, Tensor};

use super::error::{Error, Result};
use super::types::{complement_node, ClauseSize, Literal, VariableSize};

/// 1 つの SAT 問題. リテラルと節の二部グラフとして保持する
///
/// 変数 `i` の正リテラルはノード `i`, 負リテラルはノード `i + n_vars`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    n_vars: VariableSize,
    // 節ごとに含まれるリテラルノード (昇順, 重複なし)
    clauses: Vec<Vec<usize>>,
}

impl Instance {
    pub fn from_clauses(n_vars: VariableSize, clauses: &[Vec<Literal>]) -> Result<Self> {
        let mut nodes = Vec::with_capacity(clauses.len());
        for clause in clauses.iter() {
            let mut clause_nodes = Vec::with_capacity(clause.len());
            for literal in clause.iter() {
                if literal.index >= n_vars {
                    return Err(Error::LiteralOutOfRange { index: literal.index, n_vars });
                }
                clause_nodes.push(literal.node_index(n_vars));
            }
            clause_nodes.sort_unstable();
            clause_nodes.dedup();
            nodes.push(clause_nodes);
        }
        Ok(Instance { n_vars, clauses: nodes })
    }

    /// DIMACS の節 (`[1, -2]` など, 終端の 0 は含めない) から構築する
    pub fn from_dimacs(n_vars: VariableSize, clauses: &[Vec<i64>]) -> Result<Self> {
        let clauses = clauses
            .iter()
            .map(|clause| clause.iter().map(|&value| Literal::from_dimacs(value)).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Self::from_clauses(n_vars, &clauses)
    }

    /// `[2 * n_vars, n_clauses]` の 0/1 行列から構築する. 0 以外の要素は所属とみなす
    pub fn from_dense(n_vars: VariableSize, n_clauses: ClauseSize, rows: &[Vec<u8>]) -> Result<Self> {
        let n_lits = 2 * n_vars;
        if rows.len() != n_lits {
            return Err(Error::ShapeMismatch {
                what: "incidence rows",
                expected: vec![n_lits, n_clauses],
                got: vec![rows.len(), rows.first().map_or(0, |row| row.len())],
            });
        }
        let mut clauses = vec![Vec::new(); n_clauses];
        for (literal, row) in rows.iter().enumerate() {
            if row.len() != n_clauses {
                return Err(Error::ShapeMismatch {
                    what: "incidence row",
                    expected: vec![n_clauses],
                    got: vec![row.len()],
                });
            }
            for (clause, &entry) in row.iter().enumerate() {
                if entry != 0 {
                    clauses[clause].push(literal);
                }
            }
        }
        Ok(Instance { n_vars, clauses })
    }

    #[inline(always)]
    pub fn n_vars(&self) -> VariableSize {
        self.n_vars
    }

    #[inline(always)]
    pub fn n_lits(&self) -> usize {
        2 * self.n_vars
    }

    #[inline(always)]
    pub fn n_clauses(&self) -> ClauseSize {
        self.clauses.len()
    }

    pub fn n_edges(&self) -> usize {
        self.clauses.iter().map(|clause| clause.len()).sum()
    }

    pub fn contains(&self, literal: Literal, clause: ClauseSize) -> bool {
        literal.index < self.n_vars
            && self
                .clauses
                .get(clause)
                .map_or(false, |nodes| nodes.binary_search(&literal.node_index(self.n_vars)).is_ok())
    }

    /// 全リテラルを相補リテラルに置き換えた問題
    pub fn flipped(&self) -> Self {
        let clauses = self
            .clauses
            .iter()
            .map(|clause| {
                let mut flipped: Vec<usize> = clause.iter().map(|&node| complement_node(node, self.n_vars)).collect();
                flipped.sort_unstable();
                flipped
            })
            .collect();
        Instance { n_vars: self.n_vars, clauses }
    }

    /// 行番号を `row_of` で写しながら row-major の行列 `out` (列数 `n_cols`) に書き込む
    pub(crate) fn scatter_into<F>(&self, out: &mut [f32], n_cols: usize, clause_offset: usize, row_of: F)
    where
        F: Fn(usize) -> usize,
    {
        for (clause, nodes) in self.clauses.iter().enumerate() {
            for &node in nodes.iter() {
                out[row_of(node) * n_cols + clause_offset + clause] = 1.0;
            }
        }
    }

    /// 単独の incidence 行列 `[2 * n_vars, n_clauses]`
    pub fn incidence(&self, device: &Device) -> Result<Tensor> {
        let n_cols = self.n_clauses();
        let mut data = vec![0f32; self.n_lits() * n_cols];
        self.scatter_into(&mut data, n_cols, 0, |node| node);
        Ok(Tensor::from_vec(data, (self.n_lits(), n_cols), device)?)
    }
}
