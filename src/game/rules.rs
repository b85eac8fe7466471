//! 战斗管理器：回合状态机、出牌校验与胜负判定。

use std::fmt;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::data::EnemyFactory;
use super::enemy::Enemy;
use super::hooks::{Clock, CombatHost, CombatUi, FeedbackLevel, COMBAT_SCREEN};
use super::player::{ArtifactTrigger, CombatPlayer, PlayedCard};
use super::state::{Card, CardId, CombatEvent, CombatPhase, DropZone, EnemyId, TurnCounters};
use crate::config::CombatConfig;
use crate::ui::CombatView;
use crate::utils::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CombatError {
    CombatNotActive,
    CombatAlreadyActive,
    NotPlayerTurn,
    CardNotFound { card_id: CardId },
    InsufficientEnergy { required: u32, available: u32 },
    InvalidTarget,
    TargetDefeated { enemy_id: EnemyId },
    UnknownEnemy { enemy_id: EnemyId },
    Unplayable { card_id: CardId },
    MissingIntent { enemy_id: EnemyId },
    Data { message: String },
}

impl fmt::Display for CombatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatError::CombatNotActive => write!(f, "No combat is in progress."),
            CombatError::CombatAlreadyActive => write!(f, "A combat is already in progress."),
            CombatError::NotPlayerTurn => write!(f, "Wait for your turn."),
            CombatError::CardNotFound { card_id } => write!(f, "Card {card_id} is not in your hand."),
            CombatError::InsufficientEnergy {
                required,
                available,
            } => write!(f, "Not enough energy ({available}/{required})."),
            CombatError::InvalidTarget => write!(f, "Choose an enemy to target."),
            CombatError::TargetDefeated { .. } => write!(f, "That enemy is already defeated."),
            CombatError::UnknownEnemy { enemy_id } => write!(f, "Enemy {enemy_id} is not in this fight."),
            CombatError::Unplayable { .. } => write!(f, "This card cannot be played."),
            CombatError::MissingIntent { enemy_id } => write!(f, "Enemy {enemy_id} has no intent."),
            CombatError::Data { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CombatError {}

/// 敌方回合中的一步：某个敌人行动后需要等待的时间。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyStep {
    pub delay_ms: u32,
    #[serde(default)]
    pub acted: Option<EnemyId>,
}

/// 战斗状态机：玩家回合 → 敌方回合 → 玩家回合 … → 结束。
pub struct CombatManager<P: CombatPlayer> {
    config: CombatConfig,
    player: P,
    factory: EnemyFactory,
    enemies: Vec<Enemy>,
    ui: Box<dyn CombatUi>,
    host: Box<dyn CombatHost>,
    rng: SmallRng,
    phase: CombatPhase,
    turn_number: u32,
    counters: TurnCounters,
    selected_target: Option<EnemyId>,
    next_instance_id: EnemyId,
    defeated: Vec<EnemyId>,
    events: Vec<CombatEvent>,
}

impl<P: CombatPlayer> CombatManager<P> {
    pub fn new(
        config: CombatConfig,
        player: P,
        factory: EnemyFactory,
        ui: Box<dyn CombatUi>,
        host: Box<dyn CombatHost>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            config,
            player,
            factory,
            enemies: Vec::new(),
            ui,
            host,
            rng,
            phase: CombatPhase::Idle,
            turn_number: 0,
            counters: TurnCounters::default(),
            selected_target: None,
            next_instance_id: 1,
            defeated: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn factory(&self) -> &EnemyFactory {
        &self.factory
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn is_player_turn(&self) -> bool {
        self.phase == CombatPhase::PlayerTurn
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn counters(&self) -> TurnCounters {
        self.counters
    }

    pub fn selected_target(&self) -> Option<EnemyId> {
        self.selected_target
    }

    /// 本场战斗的全部敌人，包括已被击败的。
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn active_enemies(&self) -> Vec<&Enemy> {
        self.enemies.iter().filter(|enemy| enemy.is_alive()).collect()
    }

    pub fn enemy(&self, enemy_id: EnemyId) -> Option<&Enemy> {
        self.enemies
            .iter()
            .find(|enemy| enemy.instance_id == enemy_id)
    }

    pub fn enemy_mut(&mut self, enemy_id: EnemyId) -> Option<&mut Enemy> {
        self.enemies
            .iter_mut()
            .find(|enemy| enemy.instance_id == enemy_id)
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn view(&self) -> CombatView {
        CombatView::capture(self)
    }

    pub fn start_combat<I, S>(&mut self, enemy_ids: I) -> Result<(), CombatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.phase.is_active() {
            return Err(CombatError::CombatAlreadyActive);
        }

        self.phase = CombatPhase::Idle;
        self.enemies.clear();
        self.defeated.clear();
        self.counters = TurnCounters::default();
        self.selected_target = None;
        self.turn_number = 1;

        for requested in enemy_ids {
            let template_id = requested.as_ref().trim();
            if template_id.is_empty() {
                log_warn("manager", "ignoring blank enemy id");
                self.record(CombatEvent::SpawnRejected {
                    requested: requested.as_ref().to_string(),
                });
                continue;
            }

            let instance_id = self.next_instance_id;
            self.next_instance_id += 1;
            let enemy = self.factory.spawn(template_id, instance_id);
            self.record(CombatEvent::EnemySpawned {
                enemy_id: instance_id,
                template_id: enemy.template().id.clone(),
                name: enemy.name().to_string(),
            });
            self.enemies.push(enemy);
        }

        if self.enemies.is_empty() {
            log_warn("manager", "no enemies to fight, ending combat as a victory");
            self.feedback("No enemies appeared. Victory by default.", FeedbackLevel::Warning);
            self.end_combat(true);
            return Ok(());
        }

        let started = self.player.start_combat();
        self.absorb("player start_combat", started);
        let roster = self.enemies.iter().map(|enemy| enemy.instance_id).collect();
        self.record(CombatEvent::CombatStarted { enemies: roster });

        for _ in 0..self.enemies.len() {
            self.fire_artifacts(ArtifactTrigger::OnEnemySpawn);
        }
        self.fire_artifacts(ArtifactTrigger::OnCombatStart);

        let mut declared = Vec::new();
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            let enemy_id = enemy.instance_id;
            if let Some(intent) = enemy.determine_next_intent(&mut self.rng) {
                declared.push(CombatEvent::IntentDeclared {
                    enemy_id,
                    action: intent.action,
                });
            }
        }
        self.events.extend(declared);

        log_info(
            "manager",
            &format!("combat started against {} enemies", self.enemies.len()),
        );
        self.ui.show_screen(COMBAT_SCREEN);
        self.begin_player_turn();
        Ok(())
    }

    pub fn begin_player_turn(&mut self) {
        if matches!(self.phase, CombatPhase::Ended { .. }) {
            return;
        }

        self.phase = CombatPhase::PlayerTurn;
        self.selected_target = None;
        self.counters = TurnCounters::default();
        self.record(CombatEvent::TurnStarted {
            turn: self.turn_number,
        });

        let started = self.player.start_turn(&mut self.enemies);
        self.absorb("player start_turn", started);

        self.announce_defeats();
        if !self.check_combat_end_condition() {
            self.refresh_ui();
        }
    }

    pub fn end_player_turn(&mut self) -> Result<(), CombatError> {
        self.ensure_player_turn()?;

        self.record(CombatEvent::PlayerTurnEnded {
            turn: self.turn_number,
        });
        let ended = self.player.end_turn(&mut self.enemies);
        self.absorb("player end_turn", ended);

        self.announce_defeats();
        if self.check_combat_end_condition() {
            return Ok(());
        }
        self.begin_enemy_turn();
        Ok(())
    }

    /// 先让所有存活敌人确定意图，之后才逐个行动。
    pub fn begin_enemy_turn(&mut self) {
        if !self.phase.is_active() {
            return;
        }

        self.phase = CombatPhase::EnemyTurn { next_index: 0 };
        self.selected_target = None;
        self.record(CombatEvent::EnemyTurnStarted {
            turn: self.turn_number,
        });

        let mut declared = Vec::new();
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            enemy.begin_turn();
            if enemy.current_intent.is_none() || enemy.has_pending_reaction() {
                let enemy_id = enemy.instance_id;
                if let Some(intent) = enemy.determine_next_intent(&mut self.rng) {
                    declared.push(CombatEvent::IntentDeclared {
                        enemy_id,
                        action: intent.action,
                    });
                }
            }
        }
        self.events.extend(declared);

        self.ui.clear_enemy_highlights();
        self.refresh_ui();
    }

    /// 执行下一个敌人的行动。敌方回合结束时进入下一个玩家回合并返回 `None`。
    pub fn advance_enemy_turn(&mut self) -> Option<EnemyStep> {
        let CombatPhase::EnemyTurn { next_index } = self.phase else {
            return None;
        };
        if next_index >= self.enemies.len() {
            self.turn_number += 1;
            self.begin_player_turn();
            return None;
        }

        self.phase = CombatPhase::EnemyTurn {
            next_index: next_index + 1,
        };
        let timing = self.config.timing;

        let enemy = &mut self.enemies[next_index];
        let enemy_id = enemy.instance_id;
        let step = if !enemy.is_alive() {
            EnemyStep {
                delay_ms: timing.skipped_ms,
                acted: None,
            }
        } else {
            match enemy.execute_turn(&mut self.player, &mut self.rng) {
                Ok(report) => {
                    self.events.extend(report.events);
                    EnemyStep {
                        delay_ms: timing.enemy_action_ms,
                        acted: Some(enemy_id),
                    }
                }
                Err(error) => {
                    self.recover(&format!("enemy {enemy_id} turn"), &error);
                    EnemyStep {
                        delay_ms: timing.error_ms,
                        acted: None,
                    }
                }
            }
        };

        self.announce_defeats();
        if !self.check_combat_end_condition() {
            self.refresh_ui();
        }
        Some(step)
    }

    /// 用注入的时钟把敌方回合跑完，返回执行的步数。
    pub fn run_enemy_turn(&mut self, clock: &mut dyn Clock) -> usize {
        let mut steps = 0;
        while let Some(step) = self.advance_enemy_turn() {
            clock.wait(step.delay_ms);
            steps += 1;
        }
        steps
    }

    /// 点选的目标优先于拖放目标。校验失败时不修改任何状态。
    pub fn handle_player_card_play(
        &mut self,
        card_id: CardId,
        dropped: Option<DropZone>,
    ) -> Result<PlayedCard, CombatError> {
        if let Err(error) = self.ensure_player_turn() {
            return Err(self.reject(error));
        }

        let Some(card) = self
            .player
            .hand()
            .iter()
            .find(|card| card.id == card_id)
            .cloned()
        else {
            return Err(self.reject(CombatError::CardNotFound { card_id }));
        };

        let target = self
            .selected_target
            .or_else(|| dropped.and_then(|zone| zone.enemy_id()));
        if let Err(error) = self.validate_target(&card, target) {
            return Err(self.reject(error));
        }
        let target = if card.requires_target() { target } else { None };

        let played = match self.player.play_card(card_id, target, &mut self.enemies) {
            Ok(played) => played,
            Err(error) => return Err(self.reject(error)),
        };

        self.counters.record(played.card.card_type);
        self.record(CombatEvent::CardPlayed {
            card_id,
            key: played.card.key.clone(),
            card_type: played.card.card_type,
            target,
        });
        self.events.extend(played.events.iter().cloned());
        log_info("manager", &format!("played `{}`", played.card.key));

        self.announce_defeats();
        if !self.check_combat_end_condition() {
            self.refresh_ui();
        }
        Ok(played)
    }

    pub fn validate_target(&self, card: &Card, target: Option<EnemyId>) -> Result<(), CombatError> {
        if !card.requires_target() {
            return Ok(());
        }
        let enemy_id = target.ok_or(CombatError::InvalidTarget)?;
        let enemy = self
            .enemy(enemy_id)
            .ok_or(CombatError::UnknownEnemy { enemy_id })?;
        if !enemy.is_alive() {
            return Err(CombatError::TargetDefeated { enemy_id });
        }
        Ok(())
    }

    /// 再次点击同一个敌人取消选择；已击败或不存在的敌人被忽略。
    pub fn set_selected_target(&mut self, enemy_id: EnemyId) -> Option<EnemyId> {
        if !self.phase.is_active() {
            return self.selected_target;
        }

        match self.enemy(enemy_id).map(Enemy::is_alive) {
            Some(true) => {
                self.selected_target = if self.selected_target == Some(enemy_id) {
                    None
                } else {
                    Some(enemy_id)
                };
            }
            Some(false) => {
                self.feedback(
                    &CombatError::TargetDefeated { enemy_id }.to_string(),
                    FeedbackLevel::Info,
                );
            }
            None => log_warn("manager", &format!("ignoring selection of unknown enemy {enemy_id}")),
        }

        self.refresh_ui();
        self.selected_target
    }

    pub fn clear_selected_target(&mut self) {
        self.selected_target = None;
    }

    /// 胜利优先于失败判定。战斗已结束时返回 `true`。
    pub fn check_combat_end_condition(&mut self) -> bool {
        match self.phase {
            CombatPhase::Ended { .. } => return true,
            CombatPhase::Idle => return false,
            CombatPhase::PlayerTurn | CombatPhase::EnemyTurn { .. } => {}
        }

        if self.active_enemies().is_empty() {
            self.end_combat(true);
            true
        } else if self.player.current_integrity() == 0 {
            self.end_combat(false);
            true
        } else {
            false
        }
    }

    /// 每场战斗只结算一次。
    pub fn end_combat(&mut self, victory: bool) {
        if matches!(self.phase, CombatPhase::Ended { .. }) {
            return;
        }
        self.phase = CombatPhase::Ended { victory };

        self.fire_artifacts(ArtifactTrigger::OnCombatEnd);
        if victory {
            self.fire_artifacts(ArtifactTrigger::OnVictory);
        }
        self.player.cleanup_combat_statuses();
        self.enemies.clear();
        self.selected_target = None;

        self.record(CombatEvent::CombatEnded { victory });
        log_info(
            "manager",
            if victory {
                "combat ended in victory"
            } else {
                "combat ended in defeat"
            },
        );
        self.refresh_ui();
        self.host.handle_combat_end(victory);
    }

    fn ensure_player_turn(&self) -> Result<(), CombatError> {
        match self.phase {
            CombatPhase::PlayerTurn => Ok(()),
            CombatPhase::EnemyTurn { .. } => Err(CombatError::NotPlayerTurn),
            CombatPhase::Idle | CombatPhase::Ended { .. } => Err(CombatError::CombatNotActive),
        }
    }

    fn fire_artifacts(&mut self, trigger: ArtifactTrigger) {
        let fired = self.player.trigger_artifacts(trigger, &mut self.enemies);
        self.absorb("artifacts", fired);
    }

    fn absorb(&mut self, context: &str, result: Result<Vec<CombatEvent>, CombatError>) {
        match result {
            Ok(events) => self.events.extend(events),
            Err(error) => self.recover(context, &error),
        }
    }

    fn recover(&mut self, context: &str, error: &CombatError) {
        log_error("manager", &format!("{context} failed: {error}"));
        self.record(CombatEvent::FailureRecovered {
            context: context.to_string(),
            message: error.to_string(),
        });
    }

    fn reject(&mut self, error: CombatError) -> CombatError {
        log_warn("manager", &format!("rejected action: {error}"));
        self.feedback(&error.to_string(), FeedbackLevel::Warning);
        error
    }

    fn announce_defeats(&mut self) {
        let fallen: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| !enemy.is_alive() && !self.defeated.contains(&enemy.instance_id))
            .map(|enemy| enemy.instance_id)
            .collect();

        for enemy_id in fallen {
            self.defeated.push(enemy_id);
            if self.selected_target == Some(enemy_id) {
                self.selected_target = None;
            }
            self.record(CombatEvent::EnemyDefeated { enemy_id });
        }
    }

    fn record(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    fn feedback(&mut self, message: &str, level: FeedbackLevel) {
        self.ui.show_action_feedback(message, level);
    }

    fn refresh_ui(&mut self) {
        let view = self.view();
        self.ui.update_combat_ui(&view);
    }
}
