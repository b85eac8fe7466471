//! 敌人 AI：根据模板声明的策略挑选下一回合意图。

pub mod intent;

pub use intent::{select_intent, AiBehavior, IntentCursor};
