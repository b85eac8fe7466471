pub mod ai;
pub mod config;
pub mod game;
pub mod ui;
pub mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::AiBehavior;
pub use config::{CombatConfig, HandLayoutConfig, PlayerConfig, TurnTiming};
pub use game::{
    Card, CardEffect, CardType, CombatError, CombatEvent, CombatManager, CombatPhase, CombatPlayer,
    DropZone, Enemy, EnemyFactory, EnemyTemplate, Intent, IntentAction, OutcomeSlot, Player,
    StatusId, TemplateRegistry, UiQueue,
};
pub use ui::{hand_layout, CardPlacement, CombatView};

use game::status::all_definitions;
use game::{default_card_library, default_registry};
use utils::{log_info, set_panic_hook};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: CombatError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn optional<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<Option<T>, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(None)
    } else {
        from_value(value).map(Some).map_err(JsValue::from)
    }
}

/// 战斗会话的 JS 入口。界面指令与事件缓存在会话内，由前端按帧取走。
#[wasm_bindgen]
pub struct CombatSession {
    manager: Rc<RefCell<CombatManager<Player>>>,
    ui: UiQueue,
    outcome: OutcomeSlot,
}

#[wasm_bindgen]
impl CombatSession {
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: Option<String>,
        templates_json: Option<String>,
    ) -> Result<CombatSession, JsValue> {
        let config = match config_json {
            Some(json) => CombatConfig::from_json(&json).map_err(to_js_error)?,
            None => CombatConfig::default(),
        };
        let factory = match templates_json {
            Some(json) => {
                let registry = TemplateRegistry::from_json(&json).map_err(to_js_error)?;
                if registry.is_empty() {
                    return Err(to_js_error(CombatError::Data {
                        message: "enemy template list is empty".to_string(),
                    }));
                }
                EnemyFactory::new(registry)
            }
            None => EnemyFactory::with_default_templates(),
        };

        let player = Player::new(
            config.player,
            default_card_library().starter_deck(),
            config.seed,
        );
        let ui = UiQueue::new();
        let outcome = OutcomeSlot::new();
        let manager = CombatManager::new(
            config,
            player,
            factory,
            Box::new(ui.clone()),
            Box::new(outcome.clone()),
        );

        Ok(CombatSession {
            manager: Rc::new(RefCell::new(manager)),
            ui,
            outcome,
        })
    }

    /// `enemy_ids` 为模板 id 数组。
    pub fn start_combat(&self, enemy_ids: JsValue) -> Result<(), JsValue> {
        let ids: Vec<String> = from_value(enemy_ids).map_err(JsValue::from)?;
        log_info("session", &format!("starting combat with {ids:?}"));
        self.manager
            .borrow_mut()
            .start_combat(ids)
            .map_err(to_js_error)
    }

    /// 本会话可生成的敌人模板 id，含自定义模板。
    pub fn template_ids(&self) -> Result<JsValue, JsValue> {
        to_value(&self.manager.borrow().factory().registry().ids()).map_err(JsValue::from)
    }

    pub fn select_target(&self, enemy_id: u32) -> Option<u32> {
        self.manager.borrow_mut().set_selected_target(enemy_id)
    }

    pub fn clear_target(&self) {
        self.manager.borrow_mut().clear_selected_target();
    }

    /// `drop_zone` 省略时使用当前选中的目标。
    pub fn play_card(&self, card_id: u32, drop_zone: JsValue) -> Result<JsValue, JsValue> {
        let drop_zone: Option<DropZone> = optional(drop_zone)?;
        let played = self
            .manager
            .borrow_mut()
            .handle_player_card_play(card_id, drop_zone)
            .map_err(to_js_error)?;
        to_value(&played).map_err(JsValue::from)
    }

    pub fn end_turn(&self) -> Result<(), JsValue> {
        self.manager.borrow_mut().end_player_turn().map_err(to_js_error)
    }

    /// 单步推进敌方回合，返回行动后应等待的毫秒数；回合已结束时返回 `undefined`。
    pub fn advance_enemy_turn(&self) -> Option<u32> {
        self.manager
            .borrow_mut()
            .advance_enemy_turn()
            .map(|step| step.delay_ms)
    }

    /// 按配置的节奏跑完整个敌方回合，Promise 结果为执行的步数。
    pub fn run_enemy_turn(&self) -> Promise {
        let manager = Rc::clone(&self.manager);
        future_to_promise(async move {
            let mut steps = 0u32;
            loop {
                // 借用不能跨越 await
                let step = manager.borrow_mut().advance_enemy_turn();
                let Some(step) = step else {
                    break;
                };
                steps += 1;
                if step.delay_ms > 0 {
                    TimeoutFuture::new(step.delay_ms).await;
                }
            }
            Ok(JsValue::from(steps))
        })
    }

    pub fn is_player_turn(&self) -> bool {
        self.manager.borrow().is_player_turn()
    }

    /// 战斗结果：胜利 `true`，失败 `false`，未结束为 `undefined`。
    pub fn outcome(&self) -> Option<bool> {
        self.outcome.outcome()
    }

    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.manager.borrow().view()).map_err(JsValue::from)
    }

    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.manager.borrow().view()).map_err(serde_to_js_error)
    }

    pub fn drain_events_json(&self) -> Result<String, JsValue> {
        let events = self.manager.borrow_mut().drain_events();
        serde_json::to_string(&events).map_err(serde_to_js_error)
    }

    pub fn drain_ui_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.ui.drain()).map_err(serde_to_js_error)
    }
}

/// 所有状态效果的名称、图标与说明。
#[wasm_bindgen(js_name = "statusDefinitions")]
pub fn status_definitions() -> Result<JsValue, JsValue> {
    to_value(all_definitions()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "enemyTemplateIds")]
pub fn enemy_template_ids() -> Result<JsValue, JsValue> {
    to_value(&default_registry().ids()).map_err(JsValue::from)
}

/// 计算 `count` 张手牌的扇形位置，可传入布局配置 JSON 覆盖默认值。
#[wasm_bindgen(js_name = "handLayout")]
pub fn hand_layout_js(count: usize, layout_json: Option<String>) -> Result<JsValue, JsValue> {
    let layout = match layout_json {
        Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
        None => HandLayoutConfig::default(),
    };
    to_value(&hand_layout(count, &layout)).map_err(JsValue::from)
}
