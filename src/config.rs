//! 战斗配置：随机种子、敌方回合节奏、玩家基础数值与手牌扇形布局参数。

use serde::{Deserialize, Serialize};

use crate::game::CombatError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CombatConfig {
    /// 敌方 AI 随机数种子，缺省时使用系统熵。
    pub seed: Option<u64>,
    pub timing: TurnTiming,
    pub player: PlayerConfig,
    pub layout: HandLayoutConfig,
}

impl CombatConfig {
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        serde_json::from_str(json).map_err(|error| CombatError::Data {
            message: format!("invalid combat config: {error}"),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// 敌人逐个行动之间的延迟（毫秒）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TurnTiming {
    pub enemy_action_ms: u32,
    pub error_ms: u32,
    pub skipped_ms: u32,
}

impl Default for TurnTiming {
    fn default() -> Self {
        Self {
            enemy_action_ms: 600,
            error_ms: 100,
            skipped_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_integrity: u32,
    pub max_energy: u32,
    pub hand_size: usize,
    pub max_hand_size: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_integrity: 70,
            max_energy: 3,
            hand_size: 5,
            max_hand_size: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HandLayoutConfig {
    pub card_width: f64,
    /// 单张手牌时的重叠比例。
    pub min_overlap: f64,
    /// 手牌达到 `max_hand_size` 时的重叠比例。
    pub max_overlap: f64,
    pub max_hand_size: usize,
    pub arc_per_card: f64,
    pub max_arc_degrees: f64,
    pub arc_lift: f64,
}

impl Default for HandLayoutConfig {
    fn default() -> Self {
        Self {
            card_width: 140.0,
            min_overlap: 0.1,
            max_overlap: 0.55,
            max_hand_size: 10,
            arc_per_card: 4.0,
            max_arc_degrees: 30.0,
            arc_lift: 24.0,
        }
    }
}
