//! 玩家接口与默认玩家实现：牌堆、能量、格挡与遗物。

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::effects::{resolve_card_effects, CardEffect, EffectContext};
use super::enemy::{push_tick, DamageOutcome, Enemy};
use super::rules::CombatError;
use super::state::{Card, CardId, CardType, CombatEvent, Combatant, EnemyId};
use super::status::{
    ModifierKind, StatusApplication, StatusId, StatusInstance, StatusSet, StatusSource, TickPhase,
    VULNERABLE_FACTOR,
};
use crate::config::PlayerConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactTrigger {
    OnCombatStart,
    OnTurnStart,
    OnTurnEnd,
    OnCardPlay,
    OnEnemySpawn,
    OnCombatEnd,
    OnVictory,
}

/// 遗物：在指定时机结算一组卡牌效果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub trigger: ArtifactTrigger,
    #[serde(default)]
    pub effects: Vec<CardEffect>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Artifact {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        trigger: ArtifactTrigger,
        effects: Vec<CardEffect>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger,
            effects,
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayedCard {
    pub card: Card,
    pub target: Option<EnemyId>,
    pub events: Vec<CombatEvent>,
}

/// 战斗管理器依赖的玩家接口。
pub trait CombatPlayer {
    fn start_combat(&mut self) -> Result<Vec<CombatEvent>, CombatError>;

    fn start_turn(&mut self, enemies: &mut [Enemy]) -> Result<Vec<CombatEvent>, CombatError>;

    fn end_turn(&mut self, enemies: &mut [Enemy]) -> Result<Vec<CombatEvent>, CombatError>;

    fn play_card(
        &mut self,
        card_id: CardId,
        target: Option<EnemyId>,
        enemies: &mut [Enemy],
    ) -> Result<PlayedCard, CombatError>;

    /// `attacker` 为 `None` 时不触发荆棘。
    fn take_damage(&mut self, amount: u32, attacker: Option<EnemyId>) -> DamageOutcome;

    fn gain_block(&mut self, amount: u32) -> u32;

    fn heal(&mut self, amount: u32) -> u32;

    fn gain_energy(&mut self, amount: u32);

    fn draw_cards(&mut self, count: u32) -> u32;

    fn apply_status(
        &mut self,
        application: StatusApplication,
        source: StatusSource,
    ) -> Option<StatusInstance>;

    fn statuses(&self) -> &StatusSet;

    fn apply_modifiers(&self, kind: ModifierKind, base: u32) -> u32 {
        self.statuses().apply_modifiers(kind, base)
    }

    fn current_integrity(&self) -> u32;

    fn max_integrity(&self) -> u32;

    fn block(&self) -> u32;

    fn energy(&self) -> u32;

    fn max_energy(&self) -> u32;

    fn hand(&self) -> &[Card];

    fn draw_pile_len(&self) -> usize {
        0
    }

    fn discard_pile_len(&self) -> usize {
        0
    }

    fn trigger_artifacts(
        &mut self,
        trigger: ArtifactTrigger,
        enemies: &mut [Enemy],
    ) -> Result<Vec<CombatEvent>, CombatError>;

    fn cleanup_combat_statuses(&mut self);
}

/// 玩家状态，包括牌堆、能量与遗物。生命值称为“完整度”。
#[derive(Debug, Clone)]
pub struct Player {
    config: PlayerConfig,
    integrity: u32,
    block: u32,
    energy: u32,
    statuses: StatusSet,
    draw_pile: Vec<Card>,
    hand: Vec<Card>,
    discard_pile: Vec<Card>,
    powers: Vec<Card>,
    artifacts: Vec<Artifact>,
    rng: SmallRng,
}

impl Player {
    pub fn new(config: PlayerConfig, deck: Vec<Card>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            integrity: config.max_integrity,
            config,
            block: 0,
            energy: 0,
            statuses: StatusSet::new(),
            draw_pile: deck,
            hand: Vec::new(),
            discard_pile: Vec::new(),
            powers: Vec::new(),
            artifacts: Vec::new(),
            rng,
        }
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_integrity(mut self, integrity: u32) -> Self {
        self.integrity = integrity.min(self.config.max_integrity);
        self
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn deck_size(&self) -> usize {
        self.draw_pile.len() + self.hand.len() + self.discard_pile.len() + self.powers.len()
    }

    fn reshuffle_discard(&mut self) {
        self.draw_pile.append(&mut self.discard_pile);
        self.draw_pile.shuffle(&mut self.rng);
    }
}

impl CombatPlayer for Player {
    fn start_combat(&mut self) -> Result<Vec<CombatEvent>, CombatError> {
        self.draw_pile.append(&mut self.hand);
        self.draw_pile.append(&mut self.discard_pile);
        self.draw_pile.append(&mut self.powers);
        self.draw_pile.shuffle(&mut self.rng);
        self.block = 0;
        self.energy = 0;
        self.statuses.clear_combat_only();
        Ok(Vec::new())
    }

    fn start_turn(&mut self, enemies: &mut [Enemy]) -> Result<Vec<CombatEvent>, CombatError> {
        let mut events = Vec::new();
        self.block = 0;
        self.energy = self.config.max_energy;

        let mut tick = self.statuses.tick(TickPhase::Start);
        tick.damage = tick.damage.min(self.integrity);
        self.integrity -= tick.damage;
        tick.healing = self.heal(tick.healing);
        push_tick(&mut events, Combatant::Player, tick);
        if self.integrity == 0 {
            return Ok(events);
        }

        let missing = self.config.hand_size.saturating_sub(self.hand.len()) as u32;
        let drawn = self.draw_cards(missing);
        events.push(CombatEvent::CardsDrawn { count: drawn });

        events.extend(self.trigger_artifacts(ArtifactTrigger::OnTurnStart, enemies)?);
        Ok(events)
    }

    fn end_turn(&mut self, enemies: &mut [Enemy]) -> Result<Vec<CombatEvent>, CombatError> {
        let mut events = Vec::new();
        self.discard_pile.append(&mut self.hand);

        let tick = self.statuses.tick(TickPhase::End);
        push_tick(&mut events, Combatant::Player, tick);

        events.extend(self.trigger_artifacts(ArtifactTrigger::OnTurnEnd, enemies)?);
        Ok(events)
    }

    fn play_card(
        &mut self,
        card_id: CardId,
        target: Option<EnemyId>,
        enemies: &mut [Enemy],
    ) -> Result<PlayedCard, CombatError> {
        let index = self
            .hand
            .iter()
            .position(|card| card.id == card_id)
            .ok_or(CombatError::CardNotFound { card_id })?;

        let card = &self.hand[index];
        if card.unplayable {
            return Err(CombatError::Unplayable { card_id });
        }
        if card.cost > self.energy {
            return Err(CombatError::InsufficientEnergy {
                required: card.cost,
                available: self.energy,
            });
        }

        let card = self.hand.remove(index);
        self.energy -= card.cost;

        let ctx = EffectContext::card(card.id, card.element).with_target(target);
        let mut events = resolve_card_effects(&card.effects, &ctx, self, enemies).events;

        if card.card_type == CardType::Power {
            self.powers.push(card.clone());
        } else {
            self.discard_pile.push(card.clone());
        }

        events.extend(self.trigger_artifacts(ArtifactTrigger::OnCardPlay, enemies)?);

        Ok(PlayedCard {
            card,
            target,
            events,
        })
    }

    fn take_damage(&mut self, amount: u32, attacker: Option<EnemyId>) -> DamageOutcome {
        let mut modified = amount;
        if self.statuses.has(StatusId::Vulnerable) {
            modified = (modified as f64 * VULNERABLE_FACTOR).floor() as u32;
        }

        let blocked = modified.min(self.block);
        self.block -= blocked;
        let hp_lost = (modified - blocked).min(self.integrity);
        self.integrity -= hp_lost;

        let retaliation = match attacker {
            Some(_) => self.statuses.amount(StatusId::Thorns).max(0) as u32,
            None => 0,
        };

        DamageOutcome {
            incoming: amount,
            modified,
            blocked,
            hp_lost,
            defeated: self.integrity == 0,
            retaliation,
        }
    }

    fn gain_block(&mut self, amount: u32) -> u32 {
        let gained = self.apply_modifiers(ModifierKind::BlockGained, amount);
        self.block = self.block.saturating_add(gained);
        gained
    }

    fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.config.max_integrity.saturating_sub(self.integrity));
        self.integrity += healed;
        healed
    }

    fn gain_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_add(amount);
    }

    fn draw_cards(&mut self, count: u32) -> u32 {
        let mut drawn = 0;
        for _ in 0..count {
            if self.hand.len() >= self.config.max_hand_size {
                break;
            }
            if self.draw_pile.is_empty() {
                self.reshuffle_discard();
            }
            match self.draw_pile.pop() {
                Some(card) => {
                    self.hand.push(card);
                    drawn += 1;
                }
                None => break,
            }
        }
        drawn
    }

    fn apply_status(
        &mut self,
        application: StatusApplication,
        source: StatusSource,
    ) -> Option<StatusInstance> {
        self.statuses.apply(application, source, 1.0)
    }

    fn statuses(&self) -> &StatusSet {
        &self.statuses
    }

    fn current_integrity(&self) -> u32 {
        self.integrity
    }

    fn max_integrity(&self) -> u32 {
        self.config.max_integrity
    }

    fn block(&self) -> u32 {
        self.block
    }

    fn energy(&self) -> u32 {
        self.energy
    }

    fn max_energy(&self) -> u32 {
        self.config.max_energy
    }

    fn hand(&self) -> &[Card] {
        &self.hand
    }

    fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    fn trigger_artifacts(
        &mut self,
        trigger: ArtifactTrigger,
        enemies: &mut [Enemy],
    ) -> Result<Vec<CombatEvent>, CombatError> {
        let triggered: Vec<Artifact> = self
            .artifacts
            .iter()
            .filter(|artifact| artifact.trigger == trigger)
            .cloned()
            .collect();

        let mut events = Vec::new();
        for artifact in triggered {
            events.push(CombatEvent::ArtifactTriggered {
                artifact_id: artifact.id.clone(),
                trigger,
            });
            let ctx = EffectContext::artifact(artifact.id.as_str());
            events.extend(resolve_card_effects(&artifact.effects, &ctx, self, enemies).events);
        }
        Ok(events)
    }

    fn cleanup_combat_statuses(&mut self) {
        self.statuses.clear_combat_only();
        self.block = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::effects::EffectTarget;
    use crate::game::enemy::{EnemyTemplate, Intent, IntentAction};
    use crate::game::state::{Element, TargetType};
    use std::sync::Arc;

    fn strike(id: CardId) -> Card {
        Card::new(
            id,
            "strike",
            "Strike",
            1,
            CardType::Attack,
            TargetType::Enemy,
            vec![CardEffect::Damage { amount: 6, hits: 1 }],
        )
    }

    fn deck(size: u32) -> Vec<Card> {
        (1..=size).map(strike).collect()
    }

    fn enemies() -> Vec<Enemy> {
        let template = EnemyTemplate::new("dummy", "Dummy", 30, vec![Intent::new(IntentAction::None)]);
        vec![Enemy::from_template(1, Arc::new(template))]
    }

    fn ready_player(deck_size: u32) -> (Player, Vec<Enemy>) {
        let mut player = Player::new(PlayerConfig::default(), deck(deck_size), Some(11));
        let mut enemies = enemies();
        player.start_combat().expect("combat should start");
        player.start_turn(&mut enemies).expect("turn should start");
        (player, enemies)
    }

    #[test]
    fn start_turn_refills_energy_and_draws_hand() {
        let (player, _) = ready_player(8);

        assert_eq!(player.energy(), 3);
        assert_eq!(player.hand().len(), 5);
        assert_eq!(player.draw_pile_len(), 3);
    }

    #[test]
    fn drawing_reshuffles_discard_when_draw_pile_runs_out() {
        let (mut player, mut enemies) = ready_player(7);
        player.end_turn(&mut enemies).expect("turn should end");
        player.start_turn(&mut enemies).expect("turn should start");

        assert_eq!(player.hand().len(), 5);
        assert_eq!(player.deck_size(), 7);
    }

    #[test]
    fn playing_a_card_spends_energy_and_discards_it() {
        let (mut player, mut enemies) = ready_player(6);
        let card_id = player.hand()[0].id;

        let played = player
            .play_card(card_id, Some(1), &mut enemies)
            .expect("card should play");

        assert_eq!(played.card.id, card_id);
        assert_eq!(player.energy(), 2);
        assert_eq!(player.discard_pile_len(), 1);
        assert_eq!(enemies[0].current_hp, 24);
    }

    #[test]
    fn cannot_play_without_energy() {
        let (mut player, mut enemies) = ready_player(6);
        let ids: Vec<CardId> = player.hand().iter().map(|card| card.id).collect();
        for id in &ids[..3] {
            player.play_card(*id, Some(1), &mut enemies).expect("card should play");
        }

        let error = player
            .play_card(ids[3], Some(1), &mut enemies)
            .expect_err("energy is exhausted");
        assert_eq!(
            error,
            CombatError::InsufficientEnergy {
                required: 1,
                available: 0
            }
        );
        assert_eq!(player.hand().len(), 2);
    }

    #[test]
    fn unknown_card_is_rejected() {
        let (mut player, mut enemies) = ready_player(6);
        let error = player
            .play_card(999, Some(1), &mut enemies)
            .expect_err("card is not in hand");
        assert_eq!(error, CombatError::CardNotFound { card_id: 999 });
    }

    #[test]
    fn vulnerable_player_takes_extra_damage_after_block() {
        let mut player = Player::new(PlayerConfig::default(), Vec::new(), Some(1));
        player.apply_status(
            StatusApplication::turns(StatusId::Vulnerable, 1),
            StatusSource::Environment,
        );
        player.gain_block(5);

        let outcome = player.take_damage(10, Some(1));

        assert_eq!(outcome.modified, 15);
        assert_eq!(outcome.blocked, 5);
        assert_eq!(player.current_integrity(), 60);
    }

    #[test]
    fn thorns_only_answer_attacks() {
        let mut player = Player::new(PlayerConfig::default(), Vec::new(), Some(1));
        player.apply_status(
            StatusApplication::stacks(StatusId::Thorns, 2),
            StatusSource::Environment,
        );

        assert_eq!(player.take_damage(3, Some(1)).retaliation, 2);
        assert_eq!(player.take_damage(3, None).retaliation, 0);
    }

    #[test]
    fn artifacts_fire_on_their_trigger() {
        let shield = Artifact::new(
            "warm_stone",
            "Warm Stone",
            ArtifactTrigger::OnTurnStart,
            vec![CardEffect::Block { amount: 4 }],
        );
        let sting = Artifact::new(
            "bitter_note",
            "Bitter Note",
            ArtifactTrigger::OnCombatStart,
            vec![CardEffect::ApplyStatus {
                status: StatusApplication::turns(StatusId::Weak, 1),
                target: EffectTarget::AllEnemies,
            }],
        );
        let mut player = Player::new(PlayerConfig::default(), deck(5), Some(2))
            .with_artifact(shield)
            .with_artifact(sting);
        let mut enemies = enemies();
        assert_eq!(player.artifacts().len(), 2);

        player.start_combat().expect("combat should start");
        player
            .trigger_artifacts(ArtifactTrigger::OnCombatStart, &mut enemies)
            .expect("artifacts should resolve");
        let events = player.start_turn(&mut enemies).expect("turn should start");

        assert!(enemies[0].has_status(StatusId::Weak));
        assert_eq!(player.block(), 4);
        assert!(events.iter().any(|event| matches!(
            event,
            CombatEvent::ArtifactTriggered {
                trigger: ArtifactTrigger::OnTurnStart,
                ..
            }
        )));
    }

    #[test]
    fn card_element_reaches_enemy_resistance() {
        let mind_fog = Card::new(
            1,
            "mind_fog",
            "Mind Fog",
            1,
            CardType::Skill,
            TargetType::Enemy,
            vec![CardEffect::ApplyStatus {
                status: StatusApplication::turns(StatusId::Weak, 4),
                target: EffectTarget::Target,
            }],
        )
        .with_element(Element::Psychological);
        let template = EnemyTemplate::new("calm", "Calm", 30, vec![Intent::new(IntentAction::None)])
            .with_resistance(Element::Psychological, 0.5);
        let mut enemies = vec![Enemy::from_template(1, Arc::new(template))];
        let mut player = Player::new(PlayerConfig::default(), vec![mind_fog], Some(2));
        player.start_combat().expect("combat should start");
        player.start_turn(&mut enemies).expect("turn should start");

        player.play_card(1, Some(1), &mut enemies).expect("card should play");

        assert_eq!(
            enemies[0].statuses.get(StatusId::Weak).map(|status| status.duration),
            Some(2)
        );
    }

    #[test]
    fn player_poison_ignores_block() {
        let mut player = Player::new(PlayerConfig::default(), deck(5), Some(2));
        let mut enemies = enemies();
        player.start_combat().expect("combat should start");
        player.apply_status(
            StatusApplication::stacks(StatusId::Poison, 4),
            StatusSource::Environment,
        );

        player.start_turn(&mut enemies).expect("turn should start");

        assert_eq!(player.current_integrity(), 66);
        assert_eq!(player.statuses().amount(StatusId::Poison), 3);
    }

    #[test]
    fn cleanup_clears_statuses_and_block() {
        let mut player = Player::new(PlayerConfig::default(), Vec::new(), Some(1));
        player.gain_block(6);
        player.apply_status(
            StatusApplication::stacks(StatusId::Strength, 2),
            StatusSource::Environment,
        );

        player.cleanup_combat_statuses();

        assert!(player.statuses().is_empty());
        assert_eq!(player.block(), 0);
    }
}
