use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// モデル構築時に固定されるハイパーパラメータ
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuroSatConfig {
    /// 埋め込み次元
    pub d: usize,
    /// メッセージ MLP の隠れ層数 (出力層を除く)
    pub n_msg_layers: usize,
    /// 投票 MLP の隠れ層数 (出力層を除く)
    pub n_vote_layers: usize,
    /// メッセージパッシングのラウンド数
    pub n_rounds: usize,
}

impl Default for NeuroSatConfig {
    fn default() -> Self {
        NeuroSatConfig { d: 128, n_msg_layers: 3, n_vote_layers: 3, n_rounds: 26 }
    }
}

impl NeuroSatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.d == 0 {
            return Err(Error::InvalidConfig("embedding dimension d must be positive".to_string()));
        }
        Ok(())
    }
}
