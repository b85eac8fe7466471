//! 战斗界面的纯数据层：意图描述、状态图标、手牌排布与整帧快照。
//!
//! 这里不触碰 DOM，宿主拿到 [`CombatView`] 后自行渲染。

pub mod intent;
pub mod layout;
pub mod view;

pub use intent::{
    describe_action, describe_intent, status_badges, valid_drop_targets, IntentKind, IntentView,
    StatusBadge, ValueModifier,
};
pub use layout::{hand_layout, overlap_ratio, total_arc, CardPlacement};
pub use view::{CombatView, EnemyPanel, HandCardView, PlayerPanel};
