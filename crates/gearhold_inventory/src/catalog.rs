//! # Content Catalog
//!
//! Read-only content the engine consults: item templates, enchantments, item
//! sets, limit categories, extended costs and artifact/azerite powers.
//!
//! The engine never reaches for a global table. A [`Catalog`] is handed to
//! each [`Player`](crate::player::Player) at construction, which keeps the
//! core testable with a [`StaticCatalog`] built in a few lines.
//!
//! ## Loading
//!
//! ```rust,ignore
//! let catalog = StaticCatalog::from_toml_str(&std::fs::read_to_string("data/items.toml")?)?;
//! ```

use gearhold_shared::{
    CurrencyId, EnchantmentId, ExtendedCostId, ItemId, ItemSetId, LimitCategoryId, SpellId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ContentError;
use crate::stats::{ItemModKind, School, UnitMod};
use crate::template::{ItemTemplate, ReputationRequirement, SkillRequirement, SocketColor};

/// One effect of an enchantment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnchantEffect {
    /// Stat line through the modifier table.
    Stat {
        /// Modifier kind.
        kind: ItemModKind,
        /// Amount.
        amount: i32,
    },
    /// Flat resistance.
    Resistance {
        /// School.
        school: School,
        /// Amount.
        amount: i32,
    },
    /// Flat weapon damage on the enchanted weapon's attack.
    Damage {
        /// Amount.
        amount: i32,
    },
    /// Aura while equipped.
    EquipSpell {
        /// Spell.
        spell: SpellId,
    },
    /// Proc registered with combat.
    CombatSpell {
        /// Spell.
        spell: SpellId,
    },
    /// On-use spell; no passive effect.
    UseSpell {
        /// Spell.
        spell: SpellId,
    },
    /// Adds a colorless socket.
    PrismaticSocket,
}

/// Gem color condition of a meta gem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetaCondition {
    /// At least `count` gems of `color` are socketed in equipped gear.
    AtLeast {
        /// Color.
        color: SocketColor,
        /// Minimum count.
        count: u8,
    },
    /// More gems of `color` than of `than`.
    MoreThan {
        /// Color that must dominate.
        color: SocketColor,
        /// Color compared against.
        than: SocketColor,
    },
}

/// An enchantment definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnchantmentDef {
    /// Id.
    pub id: EnchantmentId,
    /// Effects.
    pub effects: Vec<EnchantEffect>,
    /// Minimum character level.
    pub min_level: u8,
    /// Profession skill gate.
    pub required_skill: Option<SkillRequirement>,
    /// Meta gem conditions; all must hold.
    pub conditions: Vec<MetaCondition>,
}

impl EnchantmentDef {
    /// Creates an enchantment with the given effects.
    #[must_use]
    pub fn new(id: EnchantmentId, effects: Vec<EnchantEffect>) -> Self {
        Self {
            id,
            effects,
            ..Self::default()
        }
    }

    /// Sets the profession skill gate.
    #[must_use]
    pub fn with_required_skill(mut self, skill: u16, rank: u16) -> Self {
        self.required_skill = Some(SkillRequirement { skill, rank });
        self
    }

    /// Sets the minimum level.
    #[must_use]
    pub fn with_min_level(mut self, level: u8) -> Self {
        self.min_level = level;
        self
    }

    /// Adds a meta gem condition.
    #[must_use]
    pub fn with_condition(mut self, condition: MetaCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// One threshold bonus of an item set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBonus {
    /// Pieces required.
    pub threshold: u8,
    /// Spell granted.
    pub spell: SpellId,
}

/// An item set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSetDef {
    /// Id.
    pub id: ItemSetId,
    /// Threshold bonuses.
    #[serde(default)]
    pub bonuses: Vec<SetBonus>,
}

/// How a limit category counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitMode {
    /// Counts owned copies.
    #[default]
    Have,
    /// Counts equipped copies.
    Equip,
}

/// A cross-template ownership or equip cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitCategory {
    /// Id.
    pub id: LimitCategoryId,
    /// Cap.
    pub quantity: u8,
    /// Counting mode.
    #[serde(default)]
    pub mode: LimitMode,
}

/// Item component of an extended cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostItem {
    /// Template.
    pub item: ItemId,
    /// Units per purchased stack.
    pub count: u32,
}

/// Currency component of an extended cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCurrency {
    /// Currency.
    pub currency: CurrencyId,
    /// Amount per purchased stack.
    pub count: u32,
}

/// A vendor price paid in something other than money.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedCost {
    /// Id.
    pub id: ExtendedCostId,
    /// Honor points per stack.
    pub honor_points: u32,
    /// Arena points per stack.
    pub arena_points: u32,
    /// Items consumed per stack.
    pub items: Vec<CostItem>,
    /// Currencies consumed per stack.
    pub currencies: Vec<CostCurrency>,
    /// Minimum personal arena rating.
    pub required_arena_rating: u16,
    /// Reputation gate.
    pub required_reputation: Option<ReputationRequirement>,
    /// Achievement that must be completed.
    pub required_achievement: Option<u32>,
    /// Minimum guild level.
    pub required_guild_level: Option<u8>,
}

/// Effect of one artifact power rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PowerEffect {
    /// Ranked aura.
    Spell {
        /// Spell.
        spell: SpellId,
    },
    /// Flat stat line.
    Stat {
        /// Modifier kind.
        kind: ItemModKind,
        /// Amount.
        amount: i32,
    },
    /// Percentage on a unit modifier.
    StatPct {
        /// Unit modifier.
        unit_mod: UnitMod,
        /// Basis points.
        amount_bp: i32,
    },
}

/// An artifact power and its per-rank effects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPowerDef {
    /// Id.
    pub id: u32,
    /// Effect at rank `n` is `ranks[n - 1]`.
    #[serde(default)]
    pub ranks: Vec<PowerEffect>,
}

impl ArtifactPowerDef {
    /// Effect at `rank`, if defined.
    #[must_use]
    pub fn effect_at(&self, rank: u8) -> Option<PowerEffect> {
        usize::from(rank).checked_sub(1).and_then(|i| self.ranks.get(i).copied())
    }
}

/// A selectable azerite power.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzeritePowerDef {
    /// Id.
    pub id: u32,
    /// Spell granted while equipped.
    pub spell: SpellId,
}

/// An azerite essence with per-rank spells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzeriteEssenceDef {
    /// Id.
    pub id: u32,
    /// Spell at rank `n` is `rank_spells[n - 1]`.
    #[serde(default)]
    pub rank_spells: Vec<SpellId>,
}

/// Read-only content lookups.
pub trait Catalog {
    /// Item template.
    fn template(&self, id: ItemId) -> Option<&ItemTemplate>;
    /// Enchantment definition.
    fn enchantment(&self, id: EnchantmentId) -> Option<&EnchantmentDef>;
    /// Item set.
    fn item_set(&self, id: ItemSetId) -> Option<&ItemSetDef>;
    /// Limit category.
    fn limit_category(&self, id: LimitCategoryId) -> Option<&LimitCategory>;
    /// Extended cost.
    fn extended_cost(&self, id: ExtendedCostId) -> Option<&ExtendedCost>;
    /// Artifact power.
    fn artifact_power(&self, id: u32) -> Option<&ArtifactPowerDef>;
    /// Azerite power.
    fn azerite_power(&self, id: u32) -> Option<&AzeritePowerDef>;
    /// Azerite essence.
    fn azerite_essence(&self, id: u32) -> Option<&AzeriteEssenceDef>;
}

/// On-disk layout of a catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    items: Vec<ItemTemplate>,
    enchantments: Vec<EnchantmentDef>,
    item_sets: Vec<ItemSetDef>,
    limit_categories: Vec<LimitCategory>,
    extended_costs: Vec<ExtendedCost>,
    artifact_powers: Vec<ArtifactPowerDef>,
    azerite_powers: Vec<AzeritePowerDef>,
    azerite_essences: Vec<AzeriteEssenceDef>,
}

/// In-memory [`Catalog`].
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    templates: HashMap<ItemId, ItemTemplate>,
    enchantments: HashMap<EnchantmentId, EnchantmentDef>,
    item_sets: HashMap<ItemSetId, ItemSetDef>,
    limit_categories: HashMap<LimitCategoryId, LimitCategory>,
    extended_costs: HashMap<ExtendedCostId, ExtendedCost>,
    artifact_powers: HashMap<u32, ArtifactPowerDef>,
    azerite_powers: HashMap<u32, AzeritePowerDef>,
    azerite_essences: HashMap<u32, AzeriteEssenceDef>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, an id is zero or an id
    /// appears twice in the same table.
    pub fn from_toml_str(content: &str) -> Result<Self, ContentError> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::new();
        for template in file.items {
            if template.id == 0 {
                return Err(ContentError::InvalidConfig(format!(
                    "item '{}' has id 0",
                    template.name
                )));
            }
            let id = template.id;
            if catalog.templates.insert(id, template).is_some() {
                return Err(ContentError::InvalidConfig(format!("duplicate item id {id}")));
            }
        }
        insert_unique(&mut catalog.enchantments, file.enchantments, |e| e.id, "enchantment")?;
        insert_unique(&mut catalog.item_sets, file.item_sets, |s| s.id, "item set")?;
        insert_unique(&mut catalog.limit_categories, file.limit_categories, |c| c.id, "limit category")?;
        insert_unique(&mut catalog.extended_costs, file.extended_costs, |c| c.id, "extended cost")?;
        insert_unique(&mut catalog.artifact_powers, file.artifact_powers, |p| p.id, "artifact power")?;
        insert_unique(&mut catalog.azerite_powers, file.azerite_powers, |p| p.id, "azerite power")?;
        insert_unique(&mut catalog.azerite_essences, file.azerite_essences, |e| e.id, "azerite essence")?;
        tracing::info!(items = catalog.templates.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Adds or replaces a template.
    #[must_use]
    pub fn with_template(mut self, template: ItemTemplate) -> Self {
        self.templates.insert(template.id, template);
        self
    }

    /// Adds or replaces an enchantment.
    #[must_use]
    pub fn with_enchantment(mut self, enchantment: EnchantmentDef) -> Self {
        self.enchantments.insert(enchantment.id, enchantment);
        self
    }

    /// Adds or replaces an item set.
    #[must_use]
    pub fn with_item_set(mut self, set: ItemSetDef) -> Self {
        self.item_sets.insert(set.id, set);
        self
    }

    /// Adds or replaces a limit category.
    #[must_use]
    pub fn with_limit_category(mut self, category: LimitCategory) -> Self {
        self.limit_categories.insert(category.id, category);
        self
    }

    /// Adds or replaces an extended cost.
    #[must_use]
    pub fn with_extended_cost(mut self, cost: ExtendedCost) -> Self {
        self.extended_costs.insert(cost.id, cost);
        self
    }

    /// Adds or replaces an artifact power.
    #[must_use]
    pub fn with_artifact_power(mut self, power: ArtifactPowerDef) -> Self {
        self.artifact_powers.insert(power.id, power);
        self
    }

    /// Adds or replaces an azerite power.
    #[must_use]
    pub fn with_azerite_power(mut self, power: AzeritePowerDef) -> Self {
        self.azerite_powers.insert(power.id, power);
        self
    }

    /// Adds or replaces an azerite essence.
    #[must_use]
    pub fn with_azerite_essence(mut self, essence: AzeriteEssenceDef) -> Self {
        self.azerite_essences.insert(essence.id, essence);
        self
    }

    /// Number of templates.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}

fn insert_unique<T>(
    table: &mut HashMap<u32, T>,
    rows: Vec<T>,
    id_of: impl Fn(&T) -> u32,
    what: &str,
) -> Result<(), ContentError> {
    for row in rows {
        let id = id_of(&row);
        if table.insert(id, row).is_some() {
            return Err(ContentError::InvalidConfig(format!("duplicate {what} id {id}")));
        }
    }
    Ok(())
}

impl Catalog for StaticCatalog {
    fn template(&self, id: ItemId) -> Option<&ItemTemplate> {
        self.templates.get(&id)
    }

    fn enchantment(&self, id: EnchantmentId) -> Option<&EnchantmentDef> {
        self.enchantments.get(&id)
    }

    fn item_set(&self, id: ItemSetId) -> Option<&ItemSetDef> {
        self.item_sets.get(&id)
    }

    fn limit_category(&self, id: LimitCategoryId) -> Option<&LimitCategory> {
        self.limit_categories.get(&id)
    }

    fn extended_cost(&self, id: ExtendedCostId) -> Option<&ExtendedCost> {
        self.extended_costs.get(&id)
    }

    fn artifact_power(&self, id: u32) -> Option<&ArtifactPowerDef> {
        self.artifact_powers.get(&id)
    }

    fn azerite_power(&self, id: u32) -> Option<&AzeritePowerDef> {
        self.azerite_powers.get(&id)
    }

    fn azerite_essence(&self, id: u32) -> Option<&AzeriteEssenceDef> {
        self.azerite_essences.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{BagKind, Bonding, InventoryType};

    const SAMPLE: &str = r#"
        [[items]]
        id = 100
        name = "Linen Cloth"
        max_stack = 20
        sell_price = 13

        [[items]]
        id = 200
        name = "Small Pouch"
        container = { slots = 6, kind = "general" }
        inventory_type = "bag"

        [[items]]
        id = 300
        name = "Blade of Testing"
        inventory_type = "weapon"
        bonding = "on_equip"
        weapon = { min_damage = 10, max_damage = 20, delay_ms = 2600 }
        stats = [{ kind = "strength", value = 5 }, { kind = "crit_rating", value = 8 }]

        [[enchantments]]
        id = 7
        effects = [{ type = "stat", kind = "agility", amount = 15 }, { type = "prismatic_socket" }]

        [[limit_categories]]
        id = 4
        quantity = 1
        mode = "equip"
    "#;

    #[test]
    fn test_load_sample_catalog() {
        let catalog = StaticCatalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(catalog.template_count(), 3);

        let cloth = catalog.template(100).unwrap();
        assert_eq!(cloth.max_stack, 20);
        assert_eq!(cloth.sell_price.copper(), 13);

        let pouch = catalog.template(200).unwrap();
        assert_eq!(pouch.bag_slots(), 6);
        assert_eq!(pouch.container.unwrap().kind, BagKind::General);
        assert_eq!(pouch.inventory_type, InventoryType::Bag);

        let blade = catalog.template(300).unwrap();
        assert_eq!(blade.bonding, Bonding::OnEquip);
        assert_eq!(blade.stats.len(), 2);

        assert_eq!(catalog.enchantment(7).unwrap().effects.len(), 2);
        assert_eq!(catalog.limit_category(4).unwrap().mode, LimitMode::Equip);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let content = r#"
            [[items]]
            id = 1
            name = "A"
            [[items]]
            id = 1
            name = "B"
        "#;
        assert!(matches!(
            StaticCatalog::from_toml_str(content),
            Err(ContentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_artifact_rank_lookup() {
        let power = ArtifactPowerDef {
            id: 1,
            ranks: vec![PowerEffect::Spell { spell: 10 }, PowerEffect::Spell { spell: 11 }],
        };
        assert_eq!(power.effect_at(0), None);
        assert_eq!(power.effect_at(2), Some(PowerEffect::Spell { spell: 11 }));
        assert_eq!(power.effect_at(3), None);
    }
}
