//! 战斗管理器与外部世界之间的接口：界面、宿主游戏状态、计时器。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ui::CombatView;

pub const COMBAT_SCREEN: &str = "combat-screen";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLevel {
    Info,
    Warning,
    Error,
}

pub trait CombatUi {
    fn show_screen(&mut self, screen: &str);

    fn update_combat_ui(&mut self, view: &CombatView);

    fn show_action_feedback(&mut self, message: &str, level: FeedbackLevel);

    fn clear_enemy_highlights(&mut self) {}
}

/// 接收战斗结果的上层游戏状态。
pub trait CombatHost {
    fn handle_combat_end(&mut self, victory: bool);
}

/// 敌人行动之间的等待。测试中使用 [`ImmediateClock`]。
pub trait Clock {
    fn wait(&mut self, ms: u32);
}

/// 不等待，只记录请求过的延迟。
#[derive(Debug, Clone, Default)]
pub struct ImmediateClock {
    pub waits: Vec<u32>,
}

impl Clock for ImmediateClock {
    fn wait(&mut self, ms: u32) {
        self.waits.push(ms);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum UiCommand {
    ShowScreen { screen: String },
    Refresh { is_player_turn: bool, turn: u32 },
    Feedback { message: String, level: FeedbackLevel },
    ClearEnemyHighlights,
}

/// 把界面调用排成队列，由 JS 或测试取走。
#[derive(Debug, Clone, Default)]
pub struct UiQueue {
    commands: Rc<RefCell<Vec<UiCommand>>>,
}

impl UiQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<UiCommand> {
        self.commands.borrow_mut().drain(..).collect()
    }

    pub fn feedback_messages(&self) -> Vec<String> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|command| match command {
                UiCommand::Feedback { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, command: UiCommand) {
        self.commands.borrow_mut().push(command);
    }
}

impl CombatUi for UiQueue {
    fn show_screen(&mut self, screen: &str) {
        self.push(UiCommand::ShowScreen {
            screen: screen.to_string(),
        });
    }

    fn update_combat_ui(&mut self, view: &CombatView) {
        let refresh = UiCommand::Refresh {
            is_player_turn: view.is_player_turn,
            turn: view.turn,
        };
        let mut commands = self.commands.borrow_mut();
        // 连续刷新只保留最后一次
        if matches!(commands.last(), Some(UiCommand::Refresh { .. })) {
            commands.pop();
        }
        commands.push(refresh);
    }

    fn show_action_feedback(&mut self, message: &str, level: FeedbackLevel) {
        self.push(UiCommand::Feedback {
            message: message.to_string(),
            level,
        });
    }

    fn clear_enemy_highlights(&mut self) {
        self.push(UiCommand::ClearEnemyHighlights);
    }
}

/// 记录战斗结果，可在管理器之外读取。
#[derive(Debug, Clone, Default)]
pub struct OutcomeSlot {
    outcome: Rc<Cell<Option<bool>>>,
    calls: Rc<Cell<u32>>,
}

impl OutcomeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self) -> Option<bool> {
        self.outcome.get()
    }

    /// `handle_combat_end` 被调用的次数。
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl CombatHost for OutcomeSlot {
    fn handle_combat_end(&mut self, victory: bool) {
        self.outcome.set(Some(victory));
        self.calls.set(self.calls.get() + 1);
    }
}
