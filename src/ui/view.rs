use serde::Serialize;

use super::intent::{describe_intent, status_badges, valid_drop_targets, IntentView, StatusBadge};
use super::layout::{hand_layout, CardPlacement};
use crate::game::enemy::Enemy;
use crate::game::player::CombatPlayer;
use crate::game::rules::CombatManager;
use crate::game::state::{Card, CardId, CardType, CombatPhase, DropZone, Element, EnemyId, TargetType};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerPanel {
    pub integrity: u32,
    pub max_integrity: u32,
    pub block: u32,
    pub energy: u32,
    pub max_energy: u32,
    pub draw_pile: usize,
    pub discard_pile: usize,
    pub statuses: Vec<StatusBadge>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnemyPanel {
    pub id: EnemyId,
    pub template_id: String,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub block: u32,
    pub alive: bool,
    pub boss: bool,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentView>,
    pub statuses: Vec<StatusBadge>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HandCardView {
    pub id: CardId,
    pub key: String,
    pub name: String,
    pub cost: u32,
    pub card_type: CardType,
    pub target: TargetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    pub description: String,
    /// 当前能量足够且处于玩家回合。
    pub playable: bool,
    pub placement: CardPlacement,
    pub drop_zones: Vec<DropZone>,
}

/// 一帧战斗界面所需的全部数据，由宿主按需渲染。
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CombatView {
    pub phase: CombatPhase,
    pub turn: u32,
    pub is_player_turn: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_target: Option<EnemyId>,
    pub player: PlayerPanel,
    pub enemies: Vec<EnemyPanel>,
    pub hand: Vec<HandCardView>,
}

impl CombatView {
    pub fn capture<P: CombatPlayer>(manager: &CombatManager<P>) -> Self {
        let player = manager.player();
        let selected = manager.selected_target();
        let is_player_turn = manager.is_player_turn();

        let enemies = manager
            .enemies()
            .iter()
            .map(|enemy| enemy_panel(enemy, selected))
            .collect();

        let hand_cards = player.hand();
        let placements = hand_layout(hand_cards.len(), &manager.config().layout);
        let hand = hand_cards
            .iter()
            .zip(placements)
            .map(|(card, placement)| {
                hand_card(card, placement, is_player_turn, player.energy(), manager.enemies())
            })
            .collect();

        CombatView {
            phase: manager.phase(),
            turn: manager.turn_number(),
            is_player_turn,
            selected_target: selected,
            player: PlayerPanel {
                integrity: player.current_integrity(),
                max_integrity: player.max_integrity(),
                block: player.block(),
                energy: player.energy(),
                max_energy: player.max_energy(),
                draw_pile: player.draw_pile_len(),
                discard_pile: player.discard_pile_len(),
                statuses: status_badges(player.statuses()),
            },
            enemies,
            hand,
        }
    }

    pub fn enemy(&self, enemy_id: EnemyId) -> Option<&EnemyPanel> {
        self.enemies.iter().find(|panel| panel.id == enemy_id)
    }
}

fn enemy_panel(enemy: &Enemy, selected: Option<EnemyId>) -> EnemyPanel {
    let template = enemy.template();
    EnemyPanel {
        id: enemy.instance_id,
        template_id: template.id.clone(),
        name: template.name.clone(),
        hp: enemy.current_hp,
        max_hp: template.max_hp,
        block: enemy.current_block,
        alive: enemy.is_alive(),
        boss: template.boss,
        selected: selected == Some(enemy.instance_id),
        element: template.element,
        intent: if enemy.is_alive() {
            describe_intent(enemy)
        } else {
            None
        },
        statuses: status_badges(&enemy.statuses),
    }
}

fn hand_card(
    card: &Card,
    placement: CardPlacement,
    is_player_turn: bool,
    energy: u32,
    enemies: &[Enemy],
) -> HandCardView {
    HandCardView {
        id: card.id,
        key: card.key.clone(),
        name: card.name.clone(),
        cost: card.cost,
        card_type: card.card_type,
        target: card.target,
        element: card.element,
        description: card.description.clone(),
        playable: is_player_turn && !card.unplayable && card.cost <= energy,
        placement,
        drop_zones: valid_drop_targets(card, enemies),
    }
}
