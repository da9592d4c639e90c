use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Collectibles shared by the whole session, keyed by item path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectibleStore {
    pub items: HashMap<String, u32>,
}

impl CollectibleStore {
    pub fn add(&mut self, item_path: &str, count: u32) -> u32 {
        let entry = self.items.entry(item_path.to_string()).or_insert(0);
        *entry = entry.saturating_add(count);
        *entry
    }

    /// Remove up to `count`, returning how many were actually removed.
    pub fn remove(&mut self, item_path: &str, count: u32) -> u32 {
        let Some(current) = self.items.get_mut(item_path) else {
            return 0;
        };
        let removed = (*current).min(count);
        *current -= removed;
        if *current == 0 {
            self.items.remove(item_path);
        }
        removed
    }

    pub fn count(&self, item_path: &str) -> u32 {
        self.items.get(item_path).copied().unwrap_or(0)
    }

    pub fn has_item(&self, item_path: &str) -> bool {
        self.count(item_path) > 0
    }
}

/// `has_item` true: at least `quantity` must be held. False: fewer than `quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCondition {
    #[serde(default = "default_has_item")]
    pub has_item: bool,
    pub item_path: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_has_item() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

impl GameCondition {
    pub fn holds(&self, store: &CollectibleStore) -> bool {
        let held = store.count(&self.item_path) >= self.quantity;
        held == self.has_item
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameConditionList(pub Vec<GameCondition>);

impl GameConditionList {
    pub fn all_hold(&self, store: &CollectibleStore) -> bool {
        self.0.iter().all(|c| c.holds(store))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
