//! 战斗中共享的基础类型与事件日志。

use serde::{Deserialize, Serialize};

use super::effects::CardEffect;
use super::enemy::IntentAction;
use super::player::ArtifactTrigger;
use super::status::StatusId;

/// 手牌中卡牌实例的唯一标识。
pub type CardId = u32;
/// 敌人实例标识，由战斗管理器递增分配。
pub type EnemyId = u32;

/// 人格元素，决定伤害的弱点与抗性。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Attraction,
    Interaction,
    Sensory,
    Psychological,
    Cognitive,
    Relational,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Attack,
    Skill,
    Power,
}

impl Default for CardType {
    fn default() -> Self {
        CardType::Skill
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Enemy,
    #[serde(rename = "self")]
    SelfTarget,
    None,
    AllEnemies,
}

impl Default for TargetType {
    fn default() -> Self {
        TargetType::None
    }
}

/// 战斗中使用的卡牌数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    #[serde(default)]
    pub id: CardId,
    pub key: String,
    pub name: String,
    pub cost: u32,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    #[serde(default)]
    pub target: TargetType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<CardEffect>,
    #[serde(default)]
    pub unplayable: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Card {
    pub fn new(
        id: CardId,
        key: impl Into<String>,
        name: impl Into<String>,
        cost: u32,
        card_type: CardType,
        target: TargetType,
        effects: Vec<CardEffect>,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            cost,
            card_type,
            element: None,
            target,
            effects,
            unplayable: false,
            description: String::new(),
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn requires_target(&self) -> bool {
        self.target == TargetType::Enemy
    }
}

/// 伤害、格挡与状态事件的承受方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Combatant {
    Player,
    Enemy { enemy_id: EnemyId },
}

/// 拖拽出牌时的落点。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DropZone {
    Enemy { enemy_id: EnemyId },
    Player,
    PlayArea,
}

impl DropZone {
    pub fn enemy_id(&self) -> Option<EnemyId> {
        match self {
            DropZone::Enemy { enemy_id } => Some(*enemy_id),
            DropZone::Player | DropZone::PlayArea => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CombatPhase {
    Idle,
    PlayerTurn,
    EnemyTurn { next_index: usize },
    Ended { victory: bool },
}

impl Default for CombatPhase {
    fn default() -> Self {
        CombatPhase::Idle
    }
}

impl CombatPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, CombatPhase::PlayerTurn | CombatPhase::EnemyTurn { .. })
    }
}

/// 每个玩家回合开始时清零的计数器。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnCounters {
    pub cards_played: u32,
    pub attacks_played: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_card_type: Option<CardType>,
}

impl TurnCounters {
    pub fn record(&mut self, card_type: CardType) {
        self.cards_played += 1;
        if card_type == CardType::Attack {
            self.attacks_played += 1;
        }
        self.last_card_type = Some(card_type);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CombatEvent {
    CombatStarted {
        enemies: Vec<EnemyId>,
    },
    EnemySpawned {
        enemy_id: EnemyId,
        template_id: String,
        name: String,
    },
    SpawnRejected {
        requested: String,
    },
    TurnStarted {
        turn: u32,
    },
    PlayerTurnEnded {
        turn: u32,
    },
    EnemyTurnStarted {
        turn: u32,
    },
    IntentDeclared {
        enemy_id: EnemyId,
        action: IntentAction,
    },
    CardPlayed {
        card_id: CardId,
        key: String,
        card_type: CardType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<EnemyId>,
    },
    DamageDealt {
        target: Combatant,
        amount: u32,
        blocked: u32,
        hp_lost: u32,
    },
    BlockGained {
        target: Combatant,
        amount: u32,
    },
    Healed {
        target: Combatant,
        amount: u32,
    },
    StatusApplied {
        target: Combatant,
        status: StatusId,
        amount: i32,
        duration: u32,
    },
    StatusesCleansed {
        target: Combatant,
        removed: Vec<StatusId>,
    },
    StatusTicked {
        target: Combatant,
        damage: u32,
        healing: u32,
        expired: Vec<StatusId>,
    },
    CardsDrawn {
        count: u32,
    },
    EnergyGained {
        amount: u32,
    },
    ArtifactTriggered {
        artifact_id: String,
        trigger: ArtifactTrigger,
    },
    EnemyStunned {
        enemy_id: EnemyId,
    },
    EnemyActed {
        enemy_id: EnemyId,
        action: IntentAction,
    },
    EnemyDefeated {
        enemy_id: EnemyId,
    },
    FailureRecovered {
        context: String,
        message: String,
    },
    CombatEnded {
        victory: bool,
    },
}
