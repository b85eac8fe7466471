//! 敌人模板与实例：意图、伤害结算与敌方行动。

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::player::CombatPlayer;
use super::rules::CombatError;
use super::state::{CombatEvent, Combatant, Element, EnemyId};
use super::status::{
    ModifierKind, StatusApplication, StatusId, StatusInstance, StatusSet, StatusSource, TickPhase,
    TickReport, VULNERABLE_FACTOR,
};
use crate::ai::{select_intent, AiBehavior, IntentCursor};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecialEffect {
    Heal { amount: u32 },
    /// 移除自身所有减益。
    Cleanse,
    /// 造成伤害并按实际扣除的生命回复自身。
    Siphon { amount: u32 },
}

/// 敌人下回合的行动。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentAction {
    Attack {
        value: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<StatusApplication>,
    },
    MultiAttack {
        value: u32,
        count: u32,
    },
    Block {
        value: u32,
    },
    AttackBlock {
        attack: u32,
        block: u32,
    },
    Debuff {
        status: StatusApplication,
    },
    #[serde(alias = "power_up")]
    Buff {
        status: StatusApplication,
    },
    Special {
        effect: SpecialEffect,
    },
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentCondition {
    WasDamaged,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Intent {
    #[serde(flatten)]
    pub action: IntentAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<IntentCondition>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl Intent {
    pub fn new(action: IntentAction) -> Self {
        Self {
            action,
            description: None,
            condition: None,
            weight: default_weight(),
        }
    }

    pub fn with_condition(mut self, condition: IntentCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 不可变的敌人模板，由数据文件加载后在实例间共享。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnemyTemplate {
    pub id: String,
    pub name: String,
    pub max_hp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    pub intents: Vec<Intent>,
    /// 受到该元素伤害时的倍率（小于 1）。
    #[serde(default)]
    pub resistances: HashMap<Element, f64>,
    /// 受到该元素伤害时的倍率（大于 1）。
    #[serde(default)]
    pub weaknesses: HashMap<Element, f64>,
    #[serde(default)]
    pub ai_behavior: AiBehavior,
    #[serde(default)]
    pub boss: bool,
}

impl EnemyTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_hp: u32, intents: Vec<Intent>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_hp,
            element: None,
            intents,
            resistances: HashMap::new(),
            weaknesses: HashMap::new(),
            ai_behavior: AiBehavior::default(),
            boss: false,
        }
    }

    pub fn with_behavior(mut self, behavior: AiBehavior) -> Self {
        self.ai_behavior = behavior;
        self
    }

    pub fn with_resistance(mut self, element: Element, multiplier: f64) -> Self {
        self.resistances.insert(element, multiplier);
        self
    }

    pub fn with_weakness(mut self, element: Element, multiplier: f64) -> Self {
        self.weaknesses.insert(element, multiplier);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DamageOutcome {
    pub incoming: u32,
    pub modified: u32,
    pub blocked: u32,
    pub hp_lost: u32,
    pub defeated: bool,
    /// 荆棘反弹给攻击者的伤害。
    #[serde(default)]
    pub retaliation: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct IntentValue {
    pub base: u32,
    pub value: u32,
    pub hits: u32,
}

/// 意图数值经过状态修正后的结果，模拟与界面共用。
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct IntentValues {
    pub attack: Option<IntentValue>,
    pub block: Option<IntentValue>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnemyTurnReport {
    pub enemy_id: EnemyId,
    pub stunned: bool,
    pub action: Option<IntentAction>,
    pub events: Vec<CombatEvent>,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub instance_id: EnemyId,
    template: Arc<EnemyTemplate>,
    pub current_hp: u32,
    pub current_block: u32,
    pub statuses: StatusSet,
    pub current_intent: Option<Intent>,
    pub intent_cycle_index: usize,
    pub was_damaged_last_turn: bool,
}

impl Enemy {
    pub fn from_template(instance_id: EnemyId, template: Arc<EnemyTemplate>) -> Self {
        Self {
            instance_id,
            current_hp: template.max_hp,
            template,
            current_block: 0,
            statuses: StatusSet::new(),
            current_intent: None,
            intent_cycle_index: 0,
            was_damaged_last_turn: false,
        }
    }

    /// 模板缺失时的 1 血占位敌人。
    pub fn error_enemy(instance_id: EnemyId, requested_id: &str) -> Self {
        let template = EnemyTemplate::new(
            requested_id,
            "Error Enemy",
            1,
            vec![Intent::new(IntentAction::None).with_description("Glitching")],
        );
        let mut enemy = Self::from_template(instance_id, Arc::new(template));
        enemy.current_intent = enemy.template.intents.first().cloned();
        enemy
    }

    pub fn template(&self) -> &EnemyTemplate {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn max_hp(&self) -> u32 {
        self.template.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn determine_next_intent<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&Intent> {
        let chosen = select_intent(
            self.template.ai_behavior,
            &self.template.intents,
            IntentCursor {
                cycle_index: &mut self.intent_cycle_index,
                was_damaged: self.was_damaged_last_turn,
            },
            rng,
        );
        self.was_damaged_last_turn = false;
        self.current_intent = chosen.and_then(|index| self.template.intents.get(index).cloned());
        self.current_intent.as_ref()
    }

    /// 反应型敌人被击中且存在条件意图时，需要在行动前重新决定意图。
    pub fn has_pending_reaction(&self) -> bool {
        self.template.ai_behavior == AiBehavior::ReactivePattern
            && self.was_damaged_last_turn
            && self
                .template
                .intents
                .iter()
                .any(|intent| intent.condition.is_some())
    }

    pub fn begin_turn(&mut self) {
        self.current_block = 0;
    }

    pub fn execute_turn<P, R>(
        &mut self,
        player: &mut P,
        rng: &mut R,
    ) -> Result<EnemyTurnReport, CombatError>
    where
        P: CombatPlayer + ?Sized,
        R: Rng + ?Sized,
    {
        let me = Combatant::Enemy {
            enemy_id: self.instance_id,
        };
        let mut report = EnemyTurnReport {
            enemy_id: self.instance_id,
            stunned: false,
            action: None,
            events: Vec::new(),
        };

        if self.statuses.remove(StatusId::Stun).is_some() {
            report.stunned = true;
            report.events.push(CombatEvent::EnemyStunned {
                enemy_id: self.instance_id,
            });
            self.queue_next_intent(rng, &mut report.events);
            return Ok(report);
        }

        let tick = self.tick_status_effects(TickPhase::Start);
        push_tick(&mut report.events, me, tick);
        if !self.is_alive() {
            return Ok(report);
        }

        let intent = self
            .current_intent
            .clone()
            .ok_or(CombatError::MissingIntent {
                enemy_id: self.instance_id,
            })?;
        report.events.push(CombatEvent::EnemyActed {
            enemy_id: self.instance_id,
            action: intent.action,
        });
        self.perform(&intent.action, player, &mut report.events);
        report.action = Some(intent.action);

        if self.is_alive() {
            let tick = self.tick_status_effects(TickPhase::End);
            push_tick(&mut report.events, me, tick);
        }
        self.queue_next_intent(rng, &mut report.events);

        Ok(report)
    }

    fn queue_next_intent<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<CombatEvent>) {
        let enemy_id = self.instance_id;
        if let Some(intent) = self.determine_next_intent(rng) {
            events.push(CombatEvent::IntentDeclared {
                enemy_id,
                action: intent.action,
            });
        }
    }

    fn perform<P: CombatPlayer + ?Sized>(
        &mut self,
        action: &IntentAction,
        player: &mut P,
        events: &mut Vec<CombatEvent>,
    ) {
        let values = self.intent_values(action);
        match action {
            IntentAction::Attack { status, .. } => {
                if let Some(attack) = values.attack {
                    self.strike(attack, player, events);
                }
                if let Some(status) = status {
                    self.debuff_player(*status, player, events);
                }
            }
            IntentAction::MultiAttack { .. } => {
                if let Some(attack) = values.attack {
                    self.strike(attack, player, events);
                }
            }
            IntentAction::Block { value } => self.block(*value, events),
            IntentAction::AttackBlock { block, .. } => {
                if let Some(attack) = values.attack {
                    self.strike(attack, player, events);
                }
                if self.is_alive() {
                    self.block(*block, events);
                }
            }
            IntentAction::Debuff { status } => self.debuff_player(*status, player, events),
            IntentAction::Buff { status } => {
                let source = StatusSource::Enemy {
                    instance_id: self.instance_id,
                };
                if let Some(applied) = self.apply_status(*status, source) {
                    events.push(status_event(
                        Combatant::Enemy {
                            enemy_id: self.instance_id,
                        },
                        &applied,
                    ));
                }
            }
            IntentAction::Special { effect } => self.special(*effect, values, player, events),
            IntentAction::None => {}
        }
    }

    fn strike<P: CombatPlayer + ?Sized>(
        &mut self,
        attack: IntentValue,
        player: &mut P,
        events: &mut Vec<CombatEvent>,
    ) {
        for _ in 0..attack.hits {
            if !self.is_alive() || player.current_integrity() == 0 {
                break;
            }
            let outcome = player.take_damage(attack.value, Some(self.instance_id));
            events.push(damage_event(Combatant::Player, &outcome));
            self.suffer_retaliation(&outcome, events);
        }
    }

    /// 玩家荆棘反弹的伤害。
    fn suffer_retaliation(&mut self, outcome: &DamageOutcome, events: &mut Vec<CombatEvent>) {
        if outcome.retaliation == 0 {
            return;
        }
        let thorns = self.take_damage(outcome.retaliation, None);
        events.push(damage_event(
            Combatant::Enemy {
                enemy_id: self.instance_id,
            },
            &thorns,
        ));
    }

    fn block(&mut self, base: u32, events: &mut Vec<CombatEvent>) {
        let gained = self.gain_block(base);
        events.push(CombatEvent::BlockGained {
            target: Combatant::Enemy {
                enemy_id: self.instance_id,
            },
            amount: gained,
        });
    }

    fn debuff_player<P: CombatPlayer + ?Sized>(
        &self,
        status: StatusApplication,
        player: &mut P,
        events: &mut Vec<CombatEvent>,
    ) {
        let source = StatusSource::Enemy {
            instance_id: self.instance_id,
        };
        if let Some(applied) = player.apply_status(status, source) {
            events.push(status_event(Combatant::Player, &applied));
        }
    }

    fn special<P: CombatPlayer + ?Sized>(
        &mut self,
        effect: SpecialEffect,
        values: IntentValues,
        player: &mut P,
        events: &mut Vec<CombatEvent>,
    ) {
        let me = Combatant::Enemy {
            enemy_id: self.instance_id,
        };
        match effect {
            SpecialEffect::Heal { amount } => {
                let healed = self.heal(amount);
                events.push(CombatEvent::Healed {
                    target: me,
                    amount: healed,
                });
            }
            SpecialEffect::Cleanse => {
                let removed = self.statuses.remove_debuffs();
                events.push(CombatEvent::StatusesCleansed { target: me, removed });
            }
            SpecialEffect::Siphon { .. } => {
                let Some(attack) = values.attack else {
                    return;
                };
                let outcome = player.take_damage(attack.value, Some(self.instance_id));
                events.push(damage_event(Combatant::Player, &outcome));
                let healed = self.heal(outcome.hp_lost);
                events.push(CombatEvent::Healed {
                    target: me,
                    amount: healed,
                });
                self.suffer_retaliation(&outcome, events);
            }
        }
    }

    /// 易伤 ×1.5 → 弱点倍率 → 抗性倍率，每步向下取整；格挡先于生命扣除。
    pub fn take_damage(&mut self, amount: u32, element: Option<Element>) -> DamageOutcome {
        let mut modified = amount as f64;
        if self.statuses.has(StatusId::Vulnerable) {
            modified = (modified * VULNERABLE_FACTOR).floor();
        }
        if let Some(element) = element {
            if let Some(multiplier) = self.template.weaknesses.get(&element) {
                modified = (modified * multiplier).floor();
            }
            if let Some(multiplier) = self.template.resistances.get(&element) {
                modified = (modified * multiplier).floor();
            }
        }
        let modified = modified.max(0.0) as u32;

        let blocked = modified.min(self.current_block);
        self.current_block -= blocked;
        let hp_lost = (modified - blocked).min(self.current_hp);
        self.current_hp -= hp_lost;

        if modified > 0 {
            self.was_damaged_last_turn = true;
        }

        DamageOutcome {
            incoming: amount,
            modified,
            blocked,
            hp_lost,
            defeated: !self.is_alive(),
            retaliation: 0,
        }
    }

    /// 无视格挡的生命流失（中毒）。
    pub fn lose_hp(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current_hp);
        self.current_hp -= lost;
        lost
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_hp().saturating_sub(self.current_hp));
        self.current_hp += healed;
        healed
    }

    pub fn gain_block(&mut self, amount: u32) -> u32 {
        let gained = self.apply_modifiers(ModifierKind::BlockGained, amount);
        self.current_block = self.current_block.saturating_add(gained);
        gained
    }

    pub fn apply_status(
        &mut self,
        application: StatusApplication,
        source: StatusSource,
    ) -> Option<StatusInstance> {
        let multiplier = self.duration_multiplier(&source);
        self.statuses.apply(application, source, multiplier)
    }

    /// 来源带元素且本敌人对该元素有抗性时缩短持续时间。
    pub fn duration_multiplier(&self, source: &StatusSource) -> f64 {
        source
            .element()
            .and_then(|element| self.template.resistances.get(&element).copied())
            .unwrap_or(1.0)
    }

    pub fn remove_status(&mut self, id: StatusId) -> Option<StatusInstance> {
        self.statuses.remove(id)
    }

    pub fn has_status(&self, id: StatusId) -> bool {
        self.statuses.has(id)
    }

    pub fn status_amount(&self, id: StatusId) -> i32 {
        self.statuses.amount(id)
    }

    pub fn tick_status_effects(&mut self, phase: TickPhase) -> TickReport {
        let mut report = self.statuses.tick(phase);
        report.damage = self.lose_hp(report.damage);
        report.healing = self.heal(report.healing);
        report
    }

    pub fn apply_modifiers(&self, kind: ModifierKind, base: u32) -> u32 {
        self.statuses.apply_modifiers(kind, base)
    }

    pub fn intent_values(&self, action: &IntentAction) -> IntentValues {
        let attack = |base: u32, hits: u32| IntentValue {
            base,
            value: self.apply_modifiers(ModifierKind::DamageDealt, base),
            hits,
        };
        let block = |base: u32| IntentValue {
            base,
            value: self.apply_modifiers(ModifierKind::BlockGained, base),
            hits: 1,
        };

        match action {
            IntentAction::Attack { value, .. } => IntentValues {
                attack: Some(attack(*value, 1)),
                block: None,
            },
            IntentAction::MultiAttack { value, count } => IntentValues {
                attack: Some(attack(*value, *count)),
                block: None,
            },
            IntentAction::Block { value } => IntentValues {
                attack: None,
                block: Some(block(*value)),
            },
            IntentAction::AttackBlock {
                attack: damage,
                block: armor,
            } => IntentValues {
                attack: Some(attack(*damage, 1)),
                block: Some(block(*armor)),
            },
            IntentAction::Special {
                effect: SpecialEffect::Siphon { amount },
            } => IntentValues {
                attack: Some(attack(*amount, 1)),
                block: None,
            },
            IntentAction::Debuff { .. }
            | IntentAction::Buff { .. }
            | IntentAction::Special { .. }
            | IntentAction::None => IntentValues::default(),
        }
    }
}

fn damage_event(target: Combatant, outcome: &DamageOutcome) -> CombatEvent {
    CombatEvent::DamageDealt {
        target,
        amount: outcome.modified,
        blocked: outcome.blocked,
        hp_lost: outcome.hp_lost,
    }
}

pub(crate) fn status_event(target: Combatant, applied: &StatusInstance) -> CombatEvent {
    CombatEvent::StatusApplied {
        target,
        status: applied.id,
        amount: applied.amount,
        duration: applied.duration,
    }
}

pub(crate) fn push_tick(events: &mut Vec<CombatEvent>, target: Combatant, tick: TickReport) {
    if tick.damage > 0 || tick.healing > 0 || !tick.expired.is_empty() {
        events.push(CombatEvent::StatusTicked {
            target,
            damage: tick.damage,
            healing: tick.healing,
            expired: tick.expired,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::game::player::Player;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn attack(value: u32) -> Intent {
        Intent::new(IntentAction::Attack {
            value,
            status: None,
        })
    }

    fn dummy(max_hp: u32, intents: Vec<Intent>) -> Enemy {
        Enemy::from_template(1, Arc::new(EnemyTemplate::new("dummy", "Dummy", max_hp, intents)))
    }

    fn player() -> Player {
        Player::new(PlayerConfig::default(), Vec::new(), Some(3))
    }

    #[test]
    fn hp_never_drops_below_zero() {
        let mut enemy = dummy(25, vec![attack(5)]);
        let outcome = enemy.take_damage(30, None);

        assert_eq!(enemy.current_hp, 0);
        assert_eq!(outcome.hp_lost, 25);
        assert!(outcome.defeated);
        assert!(!enemy.is_alive());
    }

    #[test]
    fn block_is_consumed_before_hp() {
        let mut enemy = dummy(20, vec![attack(5)]);
        enemy.current_block = 4;

        let outcome = enemy.take_damage(10, None);

        assert_eq!(outcome.blocked, 4);
        assert_eq!(outcome.hp_lost, 6);
        assert_eq!(outcome.blocked + outcome.hp_lost, outcome.modified);
        assert_eq!(enemy.current_block, 0);
        assert_eq!(enemy.current_hp, 14);

        enemy.current_block = 12;
        let absorbed = enemy.take_damage(10, None);
        assert_eq!((absorbed.blocked, absorbed.hp_lost), (10, 0));
        assert_eq!(enemy.current_block, 2);
    }

    #[test]
    fn vulnerable_applies_before_resistance() {
        let template = EnemyTemplate::new("stoic", "Stoic", 40, vec![attack(5)])
            .with_resistance(Element::Cognitive, 0.75);
        let mut enemy = Enemy::from_template(1, Arc::new(template));
        enemy.apply_status(
            StatusApplication::turns(StatusId::Vulnerable, 2),
            StatusSource::Environment,
        );

        let outcome = enemy.take_damage(10, Some(Element::Cognitive));

        // floor(floor(10 * 1.5) * 0.75) = 11, the reverse order would give 10
        assert_eq!(outcome.modified, 11);
        assert_eq!(enemy.current_hp, 29);
    }

    #[test]
    fn weakness_amplifies_matching_element_only() {
        let template = EnemyTemplate::new("fragile", "Fragile", 40, vec![attack(5)])
            .with_weakness(Element::Sensory, 1.5);
        let mut enemy = Enemy::from_template(1, Arc::new(template));

        assert_eq!(enemy.take_damage(7, Some(Element::Sensory)).modified, 10);
        assert_eq!(enemy.take_damage(7, Some(Element::Relational)).modified, 7);
        assert_eq!(enemy.take_damage(7, None).modified, 7);
    }

    #[test]
    fn landing_damage_marks_enemy_for_reactive_ai() {
        let mut enemy = dummy(20, vec![attack(5)]);
        enemy.take_damage(0, None);
        assert!(!enemy.was_damaged_last_turn);
        enemy.take_damage(3, None);
        assert!(enemy.was_damaged_last_turn);
    }

    #[test]
    fn reactive_enemy_consumes_damage_flag_once() {
        let template = EnemyTemplate::new(
            "shadow",
            "Shadow",
            30,
            vec![
                attack(5),
                attack(14).with_condition(IntentCondition::WasDamaged),
                attack(7).with_condition(IntentCondition::WasDamaged),
            ],
        )
        .with_behavior(AiBehavior::ReactivePattern);
        let mut enemy = Enemy::from_template(1, Arc::new(template));
        let mut rng = SmallRng::seed_from_u64(5);

        enemy.take_damage(4, None);
        assert!(enemy.has_pending_reaction());
        let reaction = enemy.determine_next_intent(&mut rng).map(|intent| intent.action);

        assert_eq!(
            reaction,
            Some(IntentAction::Attack {
                value: 14,
                status: None
            })
        );
        assert!(!enemy.was_damaged_last_turn);
        let routine = enemy.determine_next_intent(&mut rng).map(|intent| intent.action);
        assert_eq!(
            routine,
            Some(IntentAction::Attack {
                value: 5,
                status: None
            })
        );
    }

    #[test]
    fn poison_ticks_three_two_one_then_expires() {
        let mut enemy = dummy(25, vec![attack(5)]);
        enemy.current_block = 10;
        enemy.apply_status(
            StatusApplication::stacks(StatusId::Poison, 3),
            StatusSource::Environment,
        );

        let damage: Vec<u32> = (0..3)
            .map(|_| enemy.tick_status_effects(TickPhase::Start).damage)
            .collect();

        assert_eq!(damage, vec![3, 2, 1]);
        assert_eq!(enemy.current_hp, 19, "poison ignores block");
        assert!(!enemy.has_status(StatusId::Poison));
    }

    #[test]
    fn elemental_resistance_shortens_status_duration() {
        let template = EnemyTemplate::new("calm", "Calm", 30, vec![attack(5)])
            .with_resistance(Element::Psychological, 0.5);
        let mut enemy = Enemy::from_template(1, Arc::new(template));

        let shortened = enemy.apply_status(
            StatusApplication::turns(StatusId::Weak, 3),
            StatusSource::Player {
                element: Some(Element::Psychological),
            },
        );
        assert_eq!(shortened.map(|status| status.duration), Some(1));

        enemy.remove_status(StatusId::Weak);
        let plain = enemy.apply_status(
            StatusApplication::turns(StatusId::Weak, 3),
            StatusSource::Player { element: None },
        );
        assert_eq!(plain.map(|status| status.duration), Some(3));
    }

    #[test]
    fn weak_and_strength_shape_outgoing_attack() {
        let mut enemy = dummy(30, vec![attack(10)]);
        enemy.apply_status(StatusApplication::turns(StatusId::Weak, 2), StatusSource::Environment);
        enemy.apply_status(
            StatusApplication::stacks(StatusId::Strength, 3),
            StatusSource::Environment,
        );

        let values = enemy.intent_values(&IntentAction::Attack {
            value: 10,
            status: None,
        });
        assert_eq!(values.attack.map(|attack| (attack.base, attack.value)), Some((10, 10)));

        let mut rng = SmallRng::seed_from_u64(1);
        let mut player = player();
        enemy.determine_next_intent(&mut rng);
        enemy.execute_turn(&mut player, &mut rng).expect("turn should run");

        assert_eq!(player.current_integrity(), 60);
    }

    #[test]
    fn stunned_enemy_skips_action_but_queues_next_intent() {
        let mut enemy = dummy(30, vec![attack(6), attack(9)]);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut player = player();
        enemy.determine_next_intent(&mut rng);
        enemy.apply_status(StatusApplication::turns(StatusId::Stun, 1), StatusSource::Environment);

        let report = enemy.execute_turn(&mut player, &mut rng).expect("turn should run");

        assert!(report.stunned);
        assert_eq!(report.action, None);
        assert!(!enemy.has_status(StatusId::Stun));
        assert_eq!(player.current_integrity(), 70);
        assert_eq!(
            enemy.current_intent.map(|intent| intent.action),
            Some(IntentAction::Attack {
                value: 9,
                status: None
            })
        );
    }

    #[test]
    fn debuff_intent_lands_on_player() {
        let intents = vec![Intent::new(IntentAction::Debuff {
            status: StatusApplication::turns(StatusId::Frail, 2),
        })];
        let mut enemy = dummy(30, intents);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut player = player();
        enemy.determine_next_intent(&mut rng);

        enemy.execute_turn(&mut player, &mut rng).expect("turn should run");

        assert!(player.statuses().has(StatusId::Frail));
    }

    #[test]
    fn siphon_heals_by_hp_drained() {
        let intents = vec![Intent::new(IntentAction::Special {
            effect: SpecialEffect::Siphon { amount: 6 },
        })];
        let mut enemy = dummy(30, intents);
        enemy.current_hp = 20;
        let mut rng = SmallRng::seed_from_u64(1);
        let mut player = player();
        player.gain_block(2);
        enemy.determine_next_intent(&mut rng);

        enemy.execute_turn(&mut player, &mut rng).expect("turn should run");

        assert_eq!(player.current_integrity(), 66);
        assert_eq!(enemy.current_hp, 24);
    }

    #[test]
    fn player_thorns_answer_a_siphon() {
        let intents = vec![Intent::new(IntentAction::Special {
            effect: SpecialEffect::Siphon { amount: 6 },
        })];
        let mut enemy = dummy(30, intents);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut player = player();
        player.apply_status(
            StatusApplication::stacks(StatusId::Thorns, 3),
            StatusSource::Environment,
        );
        enemy.determine_next_intent(&mut rng);

        let report = enemy.execute_turn(&mut player, &mut rng).expect("turn should run");

        assert_eq!(player.current_integrity(), 64);
        assert_eq!(enemy.current_hp, 27);
        assert!(report.events.contains(&CombatEvent::DamageDealt {
            target: Combatant::Enemy { enemy_id: 1 },
            amount: 3,
            blocked: 0,
            hp_lost: 3,
        }));
    }

    #[test]
    fn block_gain_saturates() {
        let mut enemy = dummy(30, vec![attack(5)]);
        enemy.current_block = u32::MAX - 1;
        enemy.gain_block(10);
        assert_eq!(enemy.current_block, u32::MAX);
    }

    #[test]
    fn missing_intent_is_reported_as_error() {
        let mut enemy = dummy(30, Vec::new());
        let mut rng = SmallRng::seed_from_u64(1);
        let mut player = player();

        let error = enemy
            .execute_turn(&mut player, &mut rng)
            .expect_err("no intent to execute");
        assert_eq!(error, CombatError::MissingIntent { enemy_id: 1 });
    }

    #[test]
    fn error_enemy_is_a_one_hp_placeholder() {
        let enemy = Enemy::error_enemy(4, "missing_id");

        assert_eq!(enemy.name(), "Error Enemy");
        assert_eq!(enemy.current_hp, 1);
        assert_eq!(enemy.template().id, "missing_id");
        assert_eq!(
            enemy.current_intent.map(|intent| intent.action),
            Some(IntentAction::None)
        );
    }

    #[test]
    fn begin_turn_clears_block() {
        let mut enemy = dummy(30, vec![attack(5)]);
        enemy.gain_block(8);
        enemy.begin_turn();
        assert_eq!(enemy.current_block, 0);
    }

    #[test]
    fn intent_json_uses_flat_tagged_shape() {
        let intent: Intent = serde_json::from_str(
            r#"{ "type": "power_up", "status": { "id": "strength", "amount": 2 }, "weight": 3 }"#,
        )
        .expect("intent should parse");

        assert_eq!(
            intent.action,
            IntentAction::Buff {
                status: StatusApplication::stacks(StatusId::Strength, 2)
            }
        );
        assert_eq!(intent.weight, 3);
        assert_eq!(intent.condition, None);
    }
}
