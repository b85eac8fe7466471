//! 状态效果：静态定义表、每个战斗单位的状态集合与回合结算。

use serde::{Deserialize, Serialize};

use super::state::{Element, EnemyId};

pub const WEAK_FACTOR: f64 = 0.75;
pub const FRAIL_FACTOR: f64 = 0.75;
pub const VULNERABLE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusId {
    Strength,
    Dexterity,
    Weak,
    Vulnerable,
    Frail,
    Poison,
    Regen,
    Stun,
    Thorns,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Buff,
    Debuff,
    Internal,
}

/// 状态效果的静态元数据（名称、图标、叠加规则）。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusDefinition {
    pub id: StatusId,
    pub name: &'static str,
    pub kind: StatusKind,
    pub icon: &'static str,
    /// 数值累加（力量、中毒）。
    pub stacking: bool,
    /// 按回合倒数（虚弱、易伤）。
    pub duration_based: bool,
    pub persists: bool,
    pub description: &'static str,
}

const DEFINITIONS: [StatusDefinition; 9] = [
    StatusDefinition {
        id: StatusId::Strength,
        name: "Strength",
        kind: StatusKind::Buff,
        icon: "💪",
        stacking: true,
        duration_based: false,
        persists: false,
        description: "Increases attack damage by the stacked amount.",
    },
    StatusDefinition {
        id: StatusId::Dexterity,
        name: "Dexterity",
        kind: StatusKind::Buff,
        icon: "🛡️",
        stacking: true,
        duration_based: false,
        persists: false,
        description: "Increases block gained by the stacked amount.",
    },
    StatusDefinition {
        id: StatusId::Weak,
        name: "Weak",
        kind: StatusKind::Debuff,
        icon: "🥀",
        stacking: false,
        duration_based: true,
        persists: false,
        description: "Deals 25% less attack damage.",
    },
    StatusDefinition {
        id: StatusId::Vulnerable,
        name: "Vulnerable",
        kind: StatusKind::Debuff,
        icon: "💔",
        stacking: false,
        duration_based: true,
        persists: false,
        description: "Takes 50% more damage from attacks.",
    },
    StatusDefinition {
        id: StatusId::Frail,
        name: "Frail",
        kind: StatusKind::Debuff,
        icon: "🍂",
        stacking: false,
        duration_based: true,
        persists: false,
        description: "Gains 25% less block.",
    },
    StatusDefinition {
        id: StatusId::Poison,
        name: "Poison",
        kind: StatusKind::Debuff,
        icon: "☠️",
        stacking: true,
        duration_based: false,
        persists: false,
        description: "Loses HP equal to the amount at turn start, then the amount drops by 1.",
    },
    StatusDefinition {
        id: StatusId::Regen,
        name: "Regen",
        kind: StatusKind::Buff,
        icon: "🌱",
        stacking: true,
        duration_based: false,
        persists: false,
        description: "Heals HP equal to the amount at turn start, then the amount drops by 1.",
    },
    StatusDefinition {
        id: StatusId::Stun,
        name: "Stun",
        kind: StatusKind::Debuff,
        icon: "💫",
        stacking: false,
        duration_based: true,
        persists: false,
        description: "Skips the next action.",
    },
    StatusDefinition {
        id: StatusId::Thorns,
        name: "Thorns",
        kind: StatusKind::Buff,
        icon: "🌵",
        stacking: true,
        duration_based: false,
        persists: false,
        description: "Deals the stacked amount back to attackers.",
    },
];

pub fn status_definition(id: StatusId) -> &'static StatusDefinition {
    // DEFINITIONS 按 StatusId 声明顺序排列。
    &DEFINITIONS[id as usize]
}

pub fn all_definitions() -> &'static [StatusDefinition] {
    &DEFINITIONS
}

/// 施加状态的来源。只有带元素的来源会触发持续时间抗性。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StatusSource {
    Player {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<Element>,
    },
    Enemy {
        instance_id: EnemyId,
    },
    Environment,
}

impl StatusSource {
    pub fn element(&self) -> Option<Element> {
        match self {
            StatusSource::Player { element } => *element,
            StatusSource::Enemy { .. } | StatusSource::Environment => None,
        }
    }
}

/// 意图或卡牌携带的状态负载。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusApplication {
    pub id: StatusId,
    #[serde(default)]
    pub amount: i32,
    #[serde(default)]
    pub duration: u32,
}

impl StatusApplication {
    pub fn stacks(id: StatusId, amount: i32) -> Self {
        Self {
            id,
            amount,
            duration: 0,
        }
    }

    pub fn turns(id: StatusId, duration: u32) -> Self {
        Self {
            id,
            amount: 0,
            duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusInstance {
    pub id: StatusId,
    pub duration: u32,
    pub amount: i32,
    pub source: StatusSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    DamageDealt,
    BlockGained,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TickPhase {
    Start,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub damage: u32,
    pub healing: u32,
    pub expired: Vec<StatusId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSet {
    #[serde(default)]
    entries: Vec<StatusInstance>,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 叠加型累加数值，持续型刷新为较长的剩余回合。
    /// `duration_multiplier` 为目标对来源元素的抗性倍率。
    pub fn apply(
        &mut self,
        application: StatusApplication,
        source: StatusSource,
        duration_multiplier: f64,
    ) -> Option<StatusInstance> {
        let definition = status_definition(application.id);

        let duration = if definition.duration_based && application.duration > 0 {
            let scaled = (application.duration as f64 * duration_multiplier.max(0.0)).floor();
            (scaled as u32).max(1)
        } else {
            0
        };
        let amount = if definition.stacking {
            application.amount
        } else {
            0
        };

        if duration == 0 && amount == 0 {
            return None;
        }

        if let Some(pos) = self.position(application.id) {
            let existing = &mut self.entries[pos];
            existing.amount = existing.amount.saturating_add(amount);
            existing.duration = existing.duration.max(duration);
            existing.source = source;
            if definition.stacking && !definition.duration_based && existing.amount == 0 {
                self.entries.remove(pos);
                return None;
            }
            return self.entries.get(pos).cloned();
        }

        self.entries.push(StatusInstance {
            id: application.id,
            duration,
            amount,
            source,
        });
        self.entries.last().cloned()
    }

    pub fn remove(&mut self, id: StatusId) -> Option<StatusInstance> {
        let pos = self.position(id)?;
        Some(self.entries.remove(pos))
    }

    pub fn has(&self, id: StatusId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: StatusId) -> Option<&StatusInstance> {
        self.entries.iter().find(|status| status.id == id)
    }

    pub fn amount(&self, id: StatusId) -> i32 {
        self.get(id).map(|status| status.amount).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusInstance> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 去掉所有非持久状态，战斗结束时调用。
    pub fn clear_combat_only(&mut self) {
        self.entries
            .retain(|status| status_definition(status.id).persists);
    }

    pub fn remove_debuffs(&mut self) -> Vec<StatusId> {
        let mut removed = Vec::new();
        self.entries.retain(|status| {
            let debuff = status_definition(status.id).kind == StatusKind::Debuff;
            if debuff {
                removed.push(status.id);
            }
            !debuff
        });
        removed
    }

    /// 出手数值修正：虚弱先乘 0.75 再加力量；格挡先加敏捷再受脆弱影响。
    pub fn apply_modifiers(&self, kind: ModifierKind, base: u32) -> u32 {
        let mut value = base as i64;
        match kind {
            ModifierKind::DamageDealt => {
                if self.has(StatusId::Weak) {
                    value = (value as f64 * WEAK_FACTOR).floor() as i64;
                }
                value += self.amount(StatusId::Strength) as i64;
            }
            ModifierKind::BlockGained => {
                value += self.amount(StatusId::Dexterity) as i64;
                if self.has(StatusId::Frail) {
                    value = (value as f64 * FRAIL_FACTOR).floor() as i64;
                }
            }
        }
        value.clamp(0, u32::MAX as i64) as u32
    }

    pub fn tick(&mut self, phase: TickPhase) -> TickReport {
        let mut report = TickReport::default();

        match phase {
            TickPhase::Start => {
                for status in &mut self.entries {
                    match status.id {
                        StatusId::Poison => {
                            report.damage = report.damage.saturating_add(status.amount.max(0) as u32);
                            status.amount = status.amount.saturating_sub(1);
                        }
                        StatusId::Regen => {
                            report.healing = report.healing.saturating_add(status.amount.max(0) as u32);
                            status.amount = status.amount.saturating_sub(1);
                        }
                        _ => {}
                    }
                }
                self.entries.retain(|status| {
                    let decaying = matches!(status.id, StatusId::Poison | StatusId::Regen);
                    if decaying && status.amount <= 0 {
                        report.expired.push(status.id);
                        false
                    } else {
                        true
                    }
                });
            }
            TickPhase::End => {
                for status in &mut self.entries {
                    if status_definition(status.id).duration_based {
                        status.duration = status.duration.saturating_sub(1);
                    }
                }
                self.entries.retain(|status| {
                    let expired =
                        status_definition(status.id).duration_based && status.duration == 0;
                    if expired {
                        report.expired.push(status.id);
                    }
                    !expired
                });
            }
        }

        report
    }

    fn position(&self, id: StatusId) -> Option<usize> {
        self.entries.iter().position(|status| status.id == id)
    }
}
