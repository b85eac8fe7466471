//! 战斗核心逻辑：状态效果、敌人、玩家、卡牌效果与回合状态机。

pub mod data;
pub mod effects;
pub mod enemy;
pub mod hooks;
pub mod player;
pub mod rules;
pub mod state;
pub mod status;

pub use data::{default_card_library, default_registry, CardLibrary, EnemyFactory, TemplateRegistry};
pub use effects::{resolve_card_effects, CardEffect, EffectContext, EffectResolution, EffectTarget};
pub use enemy::{
    DamageOutcome, Enemy, EnemyTemplate, Intent, IntentAction, IntentCondition, SpecialEffect,
};
pub use hooks::{
    Clock, CombatHost, CombatUi, FeedbackLevel, ImmediateClock, OutcomeSlot, UiCommand, UiQueue,
};
pub use player::{Artifact, ArtifactTrigger, CombatPlayer, PlayedCard, Player};
pub use rules::{CombatError, CombatManager, EnemyStep};
pub use state::{
    Card, CardId, CardType, CombatEvent, CombatPhase, Combatant, DropZone, Element, EnemyId,
    TargetType,
};
pub use status::{StatusApplication, StatusDefinition, StatusId, StatusKind, StatusSet, StatusSource};
