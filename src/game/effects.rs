//! 卡牌与遗物效果的结算。

use serde::{Deserialize, Serialize};

use super::enemy::{status_event, Enemy};
use super::player::CombatPlayer;
use super::state::{CardId, CombatEvent, Combatant, Element, EnemyId};
use super::status::{ModifierKind, StatusApplication, StatusId, StatusSource};

fn default_hits() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    /// 出牌时选中的敌人。
    Target,
    #[serde(rename = "self")]
    SelfTarget,
    AllEnemies,
}

impl Default for EffectTarget {
    fn default() -> Self {
        EffectTarget::Target
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardEffect {
    Damage {
        amount: u32,
        #[serde(default = "default_hits")]
        hits: u32,
    },
    DamageAll {
        amount: u32,
    },
    Block {
        amount: u32,
    },
    ApplyStatus {
        status: StatusApplication,
        #[serde(default)]
        target: EffectTarget,
    },
    Draw {
        count: u32,
    },
    GainEnergy {
        amount: u32,
    },
    Heal {
        amount: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EffectSource {
    Card { card_id: CardId },
    Artifact { artifact_id: String },
}

/// 结算一组效果时的上下文：来源、元素与选中的敌人。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectContext {
    pub source: EffectSource,
    #[serde(default)]
    pub element: Option<Element>,
    #[serde(default)]
    pub target: Option<EnemyId>,
}

impl EffectContext {
    pub fn card(card_id: CardId, element: Option<Element>) -> Self {
        Self {
            source: EffectSource::Card { card_id },
            element,
            target: None,
        }
    }

    pub fn artifact(artifact_id: impl Into<String>) -> Self {
        Self {
            source: EffectSource::Artifact {
                artifact_id: artifact_id.into(),
            },
            element: None,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Option<EnemyId>) -> Self {
        self.target = target;
        self
    }

    fn status_source(&self) -> StatusSource {
        StatusSource::Player {
            element: self.element,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EffectResolution {
    pub events: Vec<CombatEvent>,
}

impl EffectResolution {
    pub fn merge(&mut self, mut other: EffectResolution) {
        self.events.append(&mut other.events);
    }
}

impl CardEffect {
    pub fn apply<P: CombatPlayer + ?Sized>(
        &self,
        ctx: &EffectContext,
        player: &mut P,
        enemies: &mut [Enemy],
    ) -> EffectResolution {
        let mut events = Vec::new();

        match *self {
            CardEffect::Damage { amount, hits } => {
                let value = player.apply_modifiers(ModifierKind::DamageDealt, amount);
                if let Some(enemy) = target_enemy(ctx, enemies) {
                    for _ in 0..hits {
                        if !enemy.is_alive() || player.current_integrity() == 0 {
                            break;
                        }
                        strike_enemy(enemy, value, ctx.element, player, &mut events);
                    }
                }
            }
            CardEffect::DamageAll { amount } => {
                let value = player.apply_modifiers(ModifierKind::DamageDealt, amount);
                for enemy in enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
                    // 荆棘反伤致死后不再出手
                    if player.current_integrity() == 0 {
                        break;
                    }
                    strike_enemy(enemy, value, ctx.element, player, &mut events);
                }
            }
            CardEffect::Block { amount } => {
                let gained = player.gain_block(amount);
                events.push(CombatEvent::BlockGained {
                    target: Combatant::Player,
                    amount: gained,
                });
            }
            CardEffect::ApplyStatus { status, target } => match target {
                EffectTarget::SelfTarget => {
                    if let Some(applied) = player.apply_status(status, ctx.status_source()) {
                        events.push(status_event(Combatant::Player, &applied));
                    }
                }
                EffectTarget::Target => {
                    if let Some(enemy) = target_enemy(ctx, enemies) {
                        debuff_enemy(enemy, status, ctx, &mut events);
                    }
                }
                EffectTarget::AllEnemies => {
                    for enemy in enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
                        debuff_enemy(enemy, status, ctx, &mut events);
                    }
                }
            },
            CardEffect::Draw { count } => {
                let drawn = player.draw_cards(count);
                events.push(CombatEvent::CardsDrawn { count: drawn });
            }
            CardEffect::GainEnergy { amount } => {
                player.gain_energy(amount);
                events.push(CombatEvent::EnergyGained { amount });
            }
            CardEffect::Heal { amount } => {
                let healed = player.heal(amount);
                events.push(CombatEvent::Healed {
                    target: Combatant::Player,
                    amount: healed,
                });
            }
        }

        EffectResolution { events }
    }
}

pub fn resolve_card_effects<P: CombatPlayer + ?Sized>(
    effects: &[CardEffect],
    ctx: &EffectContext,
    player: &mut P,
    enemies: &mut [Enemy],
) -> EffectResolution {
    let mut resolution = EffectResolution::default();
    for effect in effects {
        resolution.merge(effect.apply(ctx, player, enemies));
    }
    resolution
}

fn target_enemy<'a>(ctx: &EffectContext, enemies: &'a mut [Enemy]) -> Option<&'a mut Enemy> {
    let target = ctx.target?;
    enemies
        .iter_mut()
        .find(|enemy| enemy.instance_id == target && enemy.is_alive())
}

fn strike_enemy<P: CombatPlayer + ?Sized>(
    enemy: &mut Enemy,
    value: u32,
    element: Option<Element>,
    player: &mut P,
    events: &mut Vec<CombatEvent>,
) {
    let outcome = enemy.take_damage(value, element);
    events.push(CombatEvent::DamageDealt {
        target: Combatant::Enemy {
            enemy_id: enemy.instance_id,
        },
        amount: outcome.modified,
        blocked: outcome.blocked,
        hp_lost: outcome.hp_lost,
    });

    let thorns = enemy.status_amount(StatusId::Thorns).max(0) as u32;
    if thorns > 0 {
        let recoil = player.take_damage(thorns, None);
        events.push(CombatEvent::DamageDealt {
            target: Combatant::Player,
            amount: recoil.modified,
            blocked: recoil.blocked,
            hp_lost: recoil.hp_lost,
        });
    }
}

fn debuff_enemy(
    enemy: &mut Enemy,
    status: StatusApplication,
    ctx: &EffectContext,
    events: &mut Vec<CombatEvent>,
) {
    if let Some(applied) = enemy.apply_status(status, ctx.status_source()) {
        events.push(status_event(
            Combatant::Enemy {
                enemy_id: enemy.instance_id,
            },
            &applied,
        ));
    }
}
