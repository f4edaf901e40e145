use super::error::{Error, Result};

pub type VariableSize = usize;

pub type ClauseSize = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub sign: bool,
    pub index: VariableSize,
}

impl Literal {
    pub fn positive(index: VariableSize) -> Self {
        Literal { sign: true, index }
    }

    pub fn negative(index: VariableSize) -> Self {
        Literal { sign: false, index }
    }

    /// DIMACS 形式の整数 (1 始まり, 負なら否定) から変換する
    pub fn from_dimacs(value: i64) -> Result<Self> {
        if value == 0 {
            return Err(Error::InvalidLiteral(value));
        }
        Ok(Literal { sign: value > 0, index: (value.unsigned_abs() - 1) as VariableSize })
    }

    pub fn complement(&self) -> Self {
        Literal { sign: !self.sign, index: self.index }
    }

    /// incidence 行列上の行番号. 正リテラルが [0, n_vars), 負リテラルが [n_vars, 2 * n_vars)
    #[inline(always)]
    pub fn node_index(&self, n_vars: VariableSize) -> usize {
        if self.sign {
            self.index
        } else {
            self.index + n_vars
        }
    }
}

/// リテラルノード `literal` の相補リテラルのノード番号
#[inline(always)]
pub fn complement_node(literal: usize, n_vars: VariableSize) -> usize {
    debug_assert!(literal < 2 * n_vars);
    if literal < n_vars {
        literal + n_vars
    } else {
        literal - n_vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimacs_literals() {
        assert_eq!(Literal::from_dimacs(3).unwrap(), Literal::positive(2));
        assert_eq!(Literal::from_dimacs(-1).unwrap(), Literal::negative(0));
        assert!(matches!(Literal::from_dimacs(0), Err(Error::InvalidLiteral(0))));
    }

    #[test]
    fn node_indices_pair_up() {
        let n_vars = 5;
        for index in 0..n_vars {
            let p = Literal::positive(index).node_index(n_vars);
            let n = Literal::negative(index).node_index(n_vars);
            assert_eq!(complement_node(p, n_vars), n);
            assert_eq!(complement_node(n, n_vars), p);
            assert_eq!(Literal::positive(index).complement(), Literal::negative(index));
        }
    }
}
