//! 敌人模板与起始牌组的数据加载。

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyTemplate};
use super::rules::CombatError;
use super::state::{Card, CardId, EnemyId};
use crate::utils::log_error;

const ENEMY_DATA: &str = include_str!("../../data/enemies.json");
const CARD_DATA: &str = include_str!("../../data/cards.json");

static DEFAULT_TEMPLATES: Lazy<TemplateRegistry> = Lazy::new(|| {
    TemplateRegistry::from_json(ENEMY_DATA).unwrap_or_else(|error| {
        log_error("data", &format!("embedded enemy data rejected: {error}"));
        TemplateRegistry::default()
    })
});

static DEFAULT_CARDS: Lazy<CardLibrary> = Lazy::new(|| {
    CardLibrary::from_json(CARD_DATA).unwrap_or_else(|error| {
        log_error("data", &format!("embedded card data rejected: {error}"));
        CardLibrary::default()
    })
});

pub fn default_registry() -> &'static TemplateRegistry {
    &DEFAULT_TEMPLATES
}

pub fn default_card_library() -> &'static CardLibrary {
    &DEFAULT_CARDS
}

fn data_error(message: String) -> CombatError {
    CombatError::Data { message }
}

/// 按 id 索引的不可变敌人模板表。
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<EnemyTemplate>>,
}

impl TemplateRegistry {
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        let templates: Vec<EnemyTemplate> = serde_json::from_str(json)
            .map_err(|error| data_error(format!("invalid enemy templates: {error}")))?;
        Self::from_templates(templates)
    }

    pub fn from_templates(templates: Vec<EnemyTemplate>) -> Result<Self, CombatError> {
        let mut registry = Self::default();
        for template in templates {
            registry.insert(template)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, template: EnemyTemplate) -> Result<(), CombatError> {
        if template.id.trim().is_empty() {
            return Err(data_error("enemy template without id".to_string()));
        }
        if template.max_hp == 0 {
            return Err(data_error(format!("enemy `{}` has no hp", template.id)));
        }
        if template.intents.is_empty() {
            return Err(data_error(format!("enemy `{}` has no intents", template.id)));
        }
        if self.templates.contains_key(&template.id) {
            return Err(data_error(format!("duplicate enemy id `{}`", template.id)));
        }
        self.templates.insert(template.id.clone(), Arc::new(template));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<EnemyTemplate>> {
        self.templates.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.templates.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnemyFactory {
    registry: TemplateRegistry,
}

impl EnemyFactory {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn with_default_templates() -> Self {
        Self::new(default_registry().clone())
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// 未知 id 记录错误并返回占位敌人，不中断战斗。
    pub fn spawn(&self, template_id: &str, instance_id: EnemyId) -> Enemy {
        match self.registry.get(template_id) {
            Some(template) => Enemy::from_template(instance_id, template),
            None => {
                log_error(
                    "factory",
                    &format!("unknown enemy template `{template_id}`, spawning error enemy"),
                );
                Enemy::error_enemy(instance_id, template_id)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckEntry {
    pub key: String,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardLibrary {
    pub cards: Vec<Card>,
    #[serde(default)]
    pub starter_deck: Vec<DeckEntry>,
}

impl CardLibrary {
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        let library: CardLibrary = serde_json::from_str(json)
            .map_err(|error| data_error(format!("invalid card library: {error}")))?;
        for entry in &library.starter_deck {
            if library.card(&entry.key).is_none() {
                return Err(data_error(format!(
                    "starter deck references unknown card `{}`",
                    entry.key
                )));
            }
        }
        Ok(library)
    }

    pub fn card(&self, key: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.key == key)
    }

    /// 展开起始牌组，并为每张牌分配从 1 开始的实例 id。
    pub fn starter_deck(&self) -> Vec<Card> {
        let mut next_id: CardId = 1;
        let mut deck = Vec::new();
        for entry in &self.starter_deck {
            let Some(card) = self.card(&entry.key) else {
                continue;
            };
            for _ in 0..entry.copies {
                let mut copy = card.clone();
                copy.id = next_id;
                next_id += 1;
                deck.push(copy);
            }
        }
        deck
    }
}
