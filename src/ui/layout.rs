use serde::{Deserialize, Serialize};

use crate::config::HandLayoutConfig;

/// 一张手牌相对手牌区中心的位置。`y` 向下为正。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CardPlacement {
    pub x: f64,
    pub y: f64,
    pub rotation_deg: f64,
    pub z_index: u32,
}

/// 手牌越多重叠越大，从 `min_overlap` 线性插值到 `max_overlap`。
pub fn overlap_ratio(count: usize, config: &HandLayoutConfig) -> f64 {
    if count <= 1 || config.max_hand_size <= 1 {
        return config.min_overlap;
    }
    let progress = ((count - 1) as f64 / (config.max_hand_size - 1) as f64).clamp(0.0, 1.0);
    config.min_overlap + (config.max_overlap - config.min_overlap) * progress
}

pub fn total_arc(count: usize, config: &HandLayoutConfig) -> f64 {
    if count <= 1 {
        return 0.0;
    }
    (config.arc_per_card * (count - 1) as f64).min(config.max_arc_degrees)
}

/// 扇形排布：卡牌围绕 0 对称展开，两端按抛物线下沉 `arc_lift`。
pub fn hand_layout(count: usize, config: &HandLayoutConfig) -> Vec<CardPlacement> {
    if count == 0 {
        return Vec::new();
    }

    let spacing = config.card_width * (1.0 - overlap_ratio(count, config));
    let half_width = spacing * (count - 1) as f64 / 2.0;
    let half_arc = total_arc(count, config) / 2.0;

    (0..count)
        .map(|index| {
            // -1.0 ..= 1.0
            let offset = if count == 1 {
                0.0
            } else {
                index as f64 / (count - 1) as f64 * 2.0 - 1.0
            };
            CardPlacement {
                x: offset * half_width,
                y: config.arc_lift * offset * offset,
                rotation_deg: offset * half_arc,
                z_index: index as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn single_card_sits_centered_and_upright() {
        let config = HandLayoutConfig::default();
        let placements = hand_layout(1, &config);

        assert_eq!(placements.len(), 1);
        assert_eq!(
            placements[0],
            CardPlacement {
                x: 0.0,
                y: 0.0,
                rotation_deg: 0.0,
                z_index: 0
            }
        );
    }

    #[test]
    fn fan_is_symmetric_around_the_center() {
        let config = HandLayoutConfig::default();
        for count in 2..=10 {
            let placements = hand_layout(count, &config);
            for index in 0..count {
                let left = placements[index];
                let right = placements[count - 1 - index];
                assert!((left.x + right.x).abs() < EPSILON, "x mirrored for {count}");
                assert!((left.rotation_deg + right.rotation_deg).abs() < EPSILON);
                assert!((left.y - right.y).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn overlap_grows_with_hand_size() {
        let config = HandLayoutConfig::default();

        assert!((overlap_ratio(1, &config) - config.min_overlap).abs() < EPSILON);
        assert!((overlap_ratio(10, &config) - config.max_overlap).abs() < EPSILON);
        assert!((overlap_ratio(14, &config) - config.max_overlap).abs() < EPSILON);
        assert!(overlap_ratio(4, &config) < overlap_ratio(7, &config));
    }

    #[test]
    fn arc_is_capped() {
        let config = HandLayoutConfig::default();

        assert!((total_arc(3, &config) - 8.0).abs() < EPSILON);
        assert!((total_arc(10, &config) - config.max_arc_degrees).abs() < EPSILON);

        let placements = hand_layout(10, &config);
        assert!((placements[0].rotation_deg + 15.0).abs() < EPSILON);
        assert!((placements[9].y - config.arc_lift).abs() < EPSILON);
    }

    #[test]
    fn empty_hand_has_no_placements() {
        assert!(hand_layout(0, &HandLayoutConfig::default()).is_empty());
    }
}
