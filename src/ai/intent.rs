use std::str::FromStr;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::enemy::{Intent, IntentCondition};
use crate::utils::log_warn;

/// 敌人模板声明的意图选择策略。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiBehavior {
    SequentialIntent,
    RandomIntent,
    RandomWeighted,
    ReactivePattern,
}

impl Default for AiBehavior {
    fn default() -> Self {
        AiBehavior::SequentialIntent
    }
}

impl FromStr for AiBehavior {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential_intent" | "sequential" => Ok(AiBehavior::SequentialIntent),
            "random_intent" | "random" => Ok(AiBehavior::RandomIntent),
            "random_weighted" | "weighted" => Ok(AiBehavior::RandomWeighted),
            "reactive_pattern" | "reactive" => Ok(AiBehavior::ReactivePattern),
            _ => Err(()),
        }
    }
}

/// 选择过程需要读写的敌人状态。
#[derive(Debug)]
pub struct IntentCursor<'a> {
    pub cycle_index: &'a mut usize,
    pub was_damaged: bool,
}

/// 返回被选中意图在 `intents` 中的下标；列表为空时返回 `None`。
pub fn select_intent<R: Rng + ?Sized>(
    behavior: AiBehavior,
    intents: &[Intent],
    cursor: IntentCursor<'_>,
    rng: &mut R,
) -> Option<usize> {
    if intents.is_empty() {
        return None;
    }

    match behavior {
        AiBehavior::SequentialIntent => {
            let index = *cursor.cycle_index % intents.len();
            *cursor.cycle_index += 1;
            Some(index)
        }
        AiBehavior::RandomIntent => Some(rng.gen_range(0..intents.len())),
        AiBehavior::RandomWeighted => Some(weighted_pick(intents, rng)),
        AiBehavior::ReactivePattern => reactive_pick(intents, cursor),
    }
}

fn weighted_pick<R: Rng + ?Sized>(intents: &[Intent], rng: &mut R) -> usize {
    match WeightedIndex::new(intents.iter().map(|intent| intent.weight)) {
        Ok(distribution) => distribution.sample(rng),
        Err(error) => {
            log_warn("ai", &format!("unusable intent weights ({error}), picking uniformly"));
            rng.gen_range(0..intents.len())
        }
    }
}

fn reactive_pick(intents: &[Intent], cursor: IntentCursor<'_>) -> Option<usize> {
    if cursor.was_damaged {
        let reaction = intents
            .iter()
            .position(|intent| intent.condition == Some(IntentCondition::WasDamaged));
        if reaction.is_some() {
            return reaction;
        }
    }

    let routine: Vec<usize> = intents
        .iter()
        .enumerate()
        .filter(|(_, intent)| intent.condition.is_none())
        .map(|(index, _)| index)
        .collect();
    if routine.is_empty() {
        return None;
    }

    let index = routine[*cursor.cycle_index % routine.len()];
    *cursor.cycle_index += 1;
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::enemy::IntentAction;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn attack(value: u32) -> Intent {
        Intent::new(IntentAction::Attack {
            value,
            status: None,
        })
    }

    fn pick(behavior: AiBehavior, intents: &[Intent], cycle: &mut usize, damaged: bool) -> usize {
        let mut rng = SmallRng::seed_from_u64(1);
        select_intent(
            behavior,
            intents,
            IntentCursor {
                cycle_index: cycle,
                was_damaged: damaged,
            },
            &mut rng,
        )
        .expect("an intent should be chosen")
    }

    #[test]
    fn sequential_repeats_the_list_with_wraparound() {
        let intents = vec![attack(1), attack(2), attack(3)];
        let mut cycle = 0;
        let picks: Vec<usize> = (0..intents.len() * 2)
            .map(|_| pick(AiBehavior::SequentialIntent, &intents, &mut cycle, false))
            .collect();

        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn random_is_reproducible_with_a_seed() {
        let intents = vec![attack(1), attack(2), attack(3), attack(4)];
        let run = |seed: u64| -> Vec<usize> {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut cycle = 0;
            (0..16)
                .filter_map(|_| {
                    select_intent(
                        AiBehavior::RandomIntent,
                        &intents,
                        IntentCursor {
                            cycle_index: &mut cycle,
                            was_damaged: false,
                        },
                        &mut rng,
                    )
                })
                .collect()
        };

        let first = run(42);
        assert_eq!(first, run(42));
        assert!(first.iter().all(|index| *index < intents.len()));
    }

    #[test]
    fn weighted_never_picks_zero_weight_intents() {
        let intents = vec![
            attack(1).with_weight(0),
            attack(2).with_weight(3),
            attack(3).with_weight(0),
        ];
        let mut rng = SmallRng::seed_from_u64(9);
        let mut cycle = 0;
        for _ in 0..64 {
            let index = select_intent(
                AiBehavior::RandomWeighted,
                &intents,
                IntentCursor {
                    cycle_index: &mut cycle,
                    was_damaged: false,
                },
                &mut rng,
            );
            assert_eq!(index, Some(1));
        }
    }

    #[test]
    fn weighted_with_all_zero_weights_falls_back_to_uniform() {
        let intents = vec![attack(1).with_weight(0), attack(2).with_weight(0)];
        let mut cycle = 0;
        let index = pick(AiBehavior::RandomWeighted, &intents, &mut cycle, false);
        assert!(index < intents.len());
    }

    #[test]
    fn reactive_prefers_conditional_intent_after_damage() {
        let intents = vec![
            attack(4),
            attack(12).with_condition(IntentCondition::WasDamaged),
            attack(6),
        ];
        let mut cycle = 0;

        assert_eq!(pick(AiBehavior::ReactivePattern, &intents, &mut cycle, true), 1);
        assert_eq!(cycle, 0, "reaction does not advance the routine");
        assert_eq!(pick(AiBehavior::ReactivePattern, &intents, &mut cycle, false), 0);
        assert_eq!(pick(AiBehavior::ReactivePattern, &intents, &mut cycle, false), 2);
        assert_eq!(pick(AiBehavior::ReactivePattern, &intents, &mut cycle, false), 0);
    }

    #[test]
    fn reactive_without_conditional_intent_keeps_cycling() {
        let intents = vec![attack(4), attack(6)];
        let mut cycle = 0;
        assert_eq!(pick(AiBehavior::ReactivePattern, &intents, &mut cycle, true), 0);
        assert_eq!(pick(AiBehavior::ReactivePattern, &intents, &mut cycle, true), 1);
    }

    #[test]
    fn empty_intent_list_yields_nothing() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut cycle = 0;
        let chosen = select_intent(
            AiBehavior::SequentialIntent,
            &[],
            IntentCursor {
                cycle_index: &mut cycle,
                was_damaged: false,
            },
            &mut rng,
        );
        assert_eq!(chosen, None);
    }

    #[test]
    fn behavior_names_accept_short_aliases() {
        assert_eq!("reactive".parse(), Ok(AiBehavior::ReactivePattern));
        assert_eq!("RANDOM_WEIGHTED".parse(), Ok(AiBehavior::RandomWeighted));
        assert!("berserk".parse::<AiBehavior>().is_err());
    }
}
