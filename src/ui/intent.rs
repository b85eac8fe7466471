use serde::Serialize;

use crate::game::enemy::{Enemy, IntentAction, IntentValue, SpecialEffect};
use crate::game::state::{Card, DropZone, TargetType};
use crate::game::status::{status_definition, StatusApplication, StatusKind, StatusSet};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Attack,
    MultiAttack,
    Block,
    AttackBlock,
    Debuff,
    Buff,
    Special,
    Unknown,
}

/// 显示数值相对意图基础值的变化，用于着色。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueModifier {
    Buffed,
    Debuffed,
    Unchanged,
}

impl ValueModifier {
    fn compare(value: &IntentValue) -> Self {
        if value.value > value.base {
            ValueModifier::Buffed
        } else if value.value < value.base {
            ValueModifier::Debuffed
        } else {
            ValueModifier::Unchanged
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IntentView {
    pub kind: IntentKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_value: Option<u32>,
    pub hits: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<u32>,
    pub modifier: ValueModifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub fn describe_intent(enemy: &Enemy) -> Option<IntentView> {
    let intent = enemy.current_intent.as_ref()?;
    let mut view = describe_action(enemy, &intent.action);
    view.description = intent.description.clone();
    Some(view)
}

/// 数值来自 [`Enemy::intent_values`]，与实际结算一致。
pub fn describe_action(enemy: &Enemy, action: &IntentAction) -> IntentView {
    let values = enemy.intent_values(action);
    let headline = values.attack.or(values.block);

    let (kind, text) = match action {
        IntentAction::Attack { status, .. } => {
            let damage = values.attack.map(|attack| attack.value).unwrap_or(0);
            let text = match status {
                Some(status) => format!("Attack for {damage}, inflicts {}", status_label(status)),
                None => format!("Attack for {damage}"),
            };
            (IntentKind::Attack, text)
        }
        IntentAction::MultiAttack { .. } => {
            let (damage, hits) = values
                .attack
                .map(|attack| (attack.value, attack.hits))
                .unwrap_or((0, 0));
            (IntentKind::MultiAttack, format!("Attack for {damage} x{hits}"))
        }
        IntentAction::Block { .. } => {
            let block = values.block.map(|block| block.value).unwrap_or(0);
            (IntentKind::Block, format!("Block {block}"))
        }
        IntentAction::AttackBlock { .. } => {
            let damage = values.attack.map(|attack| attack.value).unwrap_or(0);
            let block = values.block.map(|block| block.value).unwrap_or(0);
            (
                IntentKind::AttackBlock,
                format!("Attack for {damage} and block {block}"),
            )
        }
        IntentAction::Debuff { status } => {
            (IntentKind::Debuff, format!("Inflicts {}", status_label(status)))
        }
        IntentAction::Buff { status } => {
            (IntentKind::Buff, format!("Gains {}", status_label(status)))
        }
        IntentAction::Special { effect } => {
            let text = match effect {
                SpecialEffect::Heal { amount } => format!("Heals {amount}"),
                SpecialEffect::Cleanse => "Cleanses its debuffs".to_string(),
                SpecialEffect::Siphon { .. } => {
                    let damage = values.attack.map(|attack| attack.value).unwrap_or(0);
                    format!("Drains {damage}")
                }
            };
            (IntentKind::Special, text)
        }
        IntentAction::None => (IntentKind::Unknown, "Unknown intent".to_string()),
    };

    IntentView {
        kind,
        text,
        value: headline.map(|value| value.value),
        base_value: headline.map(|value| value.base),
        hits: values.attack.map(|attack| attack.hits).unwrap_or(1),
        block: values.attack.and(values.block).map(|block| block.value),
        modifier: headline
            .as_ref()
            .map(ValueModifier::compare)
            .unwrap_or(ValueModifier::Unchanged),
        description: None,
    }
}

fn status_label(status: &StatusApplication) -> String {
    let definition = status_definition(status.id);
    if definition.duration_based {
        format!("{} ({})", definition.name, status.duration)
    } else {
        format!("{} {:+}", definition.name, status.amount)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusBadge {
    pub id: crate::game::status::StatusId,
    pub name: &'static str,
    pub icon: &'static str,
    pub kind: StatusKind,
    pub amount: i32,
    pub duration: u32,
    /// 图标角标：叠加型显示层数，持续型显示剩余回合。
    pub label: String,
    pub description: &'static str,
}

pub fn status_badges(statuses: &StatusSet) -> Vec<StatusBadge> {
    statuses
        .iter()
        .map(|status| {
            let definition = status_definition(status.id);
            let label = if definition.stacking {
                status.amount.to_string()
            } else {
                format!("{}t", status.duration)
            };
            StatusBadge {
                id: status.id,
                name: definition.name,
                icon: definition.icon,
                kind: definition.kind,
                amount: status.amount,
                duration: status.duration,
                label,
                description: definition.description,
            }
        })
        .collect()
}

/// 拖动卡牌时需要高亮的落点。
pub fn valid_drop_targets(card: &Card, enemies: &[Enemy]) -> Vec<DropZone> {
    match card.target {
        TargetType::Enemy => enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| DropZone::Enemy {
                enemy_id: enemy.instance_id,
            })
            .collect(),
        TargetType::SelfTarget => vec![DropZone::Player],
        TargetType::None | TargetType::AllEnemies => vec![DropZone::PlayArea],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::effects::CardEffect;
    use crate::game::enemy::{EnemyTemplate, Intent};
    use crate::game::state::CardType;
    use crate::game::status::{StatusId, StatusSource};
    use std::sync::Arc;

    fn enemy_with(action: IntentAction) -> Enemy {
        let template = EnemyTemplate::new("probe", "Probe", 20, vec![Intent::new(action)]);
        let mut enemy = Enemy::from_template(1, Arc::new(template));
        enemy.current_intent = Some(Intent::new(action).with_description("Testing"));
        enemy
    }

    #[test]
    fn strength_marks_attack_as_buffed() {
        let mut enemy = enemy_with(IntentAction::Attack {
            value: 6,
            status: None,
        });
        enemy.apply_status(
            StatusApplication::stacks(StatusId::Strength, 2),
            StatusSource::Environment,
        );

        let view = describe_intent(&enemy).expect("intent present");

        assert_eq!(view.kind, IntentKind::Attack);
        assert_eq!(view.text, "Attack for 8");
        assert_eq!((view.value, view.base_value), (Some(8), Some(6)));
        assert_eq!(view.modifier, ValueModifier::Buffed);
        assert_eq!(view.description.as_deref(), Some("Testing"));
    }

    #[test]
    fn weak_marks_attack_as_debuffed() {
        let mut enemy = enemy_with(IntentAction::MultiAttack { value: 4, count: 3 });
        enemy.apply_status(
            StatusApplication::turns(StatusId::Weak, 1),
            StatusSource::Environment,
        );

        let view = describe_intent(&enemy).expect("intent present");

        assert_eq!(view.text, "Attack for 3 x3");
        assert_eq!(view.hits, 3);
        assert_eq!(view.modifier, ValueModifier::Debuffed);
    }

    #[test]
    fn attack_block_reports_both_numbers() {
        let enemy = enemy_with(IntentAction::AttackBlock { attack: 7, block: 5 });
        let view = describe_intent(&enemy).expect("intent present");

        assert_eq!(view.value, Some(7));
        assert_eq!(view.block, Some(5));
        assert_eq!(view.modifier, ValueModifier::Unchanged);
    }

    #[test]
    fn status_intents_name_the_status() {
        let enemy = enemy_with(IntentAction::Debuff {
            status: StatusApplication::turns(StatusId::Vulnerable, 2),
        });
        let view = describe_intent(&enemy).expect("intent present");

        assert_eq!(view.text, "Inflicts Vulnerable (2)");
        assert_eq!(view.value, None);
    }

    #[test]
    fn badges_label_stacks_and_turns() {
        let mut statuses = StatusSet::new();
        statuses.apply(
            StatusApplication::stacks(StatusId::Poison, 4),
            StatusSource::Environment,
            1.0,
        );
        statuses.apply(
            StatusApplication::turns(StatusId::Weak, 2),
            StatusSource::Environment,
            1.0,
        );

        let labels: Vec<String> = status_badges(&statuses)
            .into_iter()
            .map(|badge| badge.label)
            .collect();
        assert_eq!(labels, vec!["4".to_string(), "2t".to_string()]);
    }

    #[test]
    fn drop_targets_follow_card_target_type() {
        let mut dead = enemy_with(IntentAction::None);
        dead.instance_id = 2;
        dead.current_hp = 0;
        let enemies = vec![enemy_with(IntentAction::None), dead];
        let card = |target| Card::new(1, "c", "C", 1, CardType::Skill, target, Vec::<CardEffect>::new());

        assert_eq!(
            valid_drop_targets(&card(TargetType::Enemy), &enemies),
            vec![DropZone::Enemy { enemy_id: 1 }]
        );
        assert_eq!(
            valid_drop_targets(&card(TargetType::SelfTarget), &enemies),
            vec![DropZone::Player]
        );
        assert_eq!(
            valid_drop_targets(&card(TargetType::AllEnemies), &enemies),
            vec![DropZone::PlayArea]
        );
    }
}
