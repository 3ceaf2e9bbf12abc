//! Catalog and Session Records
//!
//! Database records for attribute options, species, description templates,
//! persisted prompts, and user sessions. JSON-typed columns are stored as
//! TEXT and decoded through the typed accessors.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Attribute Option Record
// ============================================================================

/// One selectable value within an attribute category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttributeOptionRecord {
    pub id: String,
    pub category: String,
    pub name: String,
    /// Canonical output token; falls back to `name` when absent.
    pub value: Option<String>,
    pub weight: i64,
    pub is_active: bool,
}

impl AttributeOptionRecord {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category: category.into(),
            name: name.into(),
            value: None,
            weight: 1,
            is_active: true,
        }
    }

    /// The token emitted into prompts: `value` if set, else `name`.
    pub fn output_value(&self) -> &str {
        self.value.as_deref().filter(|v| !v.is_empty()).unwrap_or(&self.name)
    }

    /// Selection weight clamped to non-negative for weighted draws.
    pub fn draw_weight(&self) -> u32 {
        self.weight.max(0) as u32
    }
}

// ============================================================================
// Species Record
// ============================================================================

/// A generation subject: anime species, alien species, or adventurer class.
///
/// One table holds all three shapes; `species_type` discriminates and the
/// type-specific columns are nullable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpeciesRecord {
    pub id: String,
    pub name: String,
    /// Generator type discriminator: "anime", "alien", "adventurer".
    pub species_type: String,
    pub features_json: Option<String>,           // JSON array of strings
    pub personality_json: Option<String>,        // JSON array of strings
    pub visual_descriptors_json: Option<String>, // JSON array of strings
    pub ears: Option<String>,
    pub tail: Option<String>,
    pub wings: Option<String>,
    /// Alien classification tag ("Humanoid", "Avian", ...).
    pub species_class: Option<String>,
    pub climate: Option<String>,
    pub equipment_config_json: Option<String>, // JSON, adventurer classes only
    pub negative_prompt: Option<String>,
    pub description_template_id: Option<String>,
    pub weight: i64,
    pub is_active: bool,
}

impl SpeciesRecord {
    pub fn new(name: impl Into<String>, species_type: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            species_type: species_type.into(),
            features_json: None,
            personality_json: None,
            visual_descriptors_json: None,
            ears: None,
            tail: None,
            wings: None,
            species_class: None,
            climate: None,
            equipment_config_json: None,
            negative_prompt: None,
            description_template_id: None,
            weight: 1,
            is_active: true,
        }
    }

    pub fn draw_weight(&self) -> u32 {
        self.weight.max(0) as u32
    }

    pub fn features(&self) -> Vec<String> {
        decode_string_list(self.features_json.as_deref())
    }

    pub fn personality(&self) -> Vec<String> {
        decode_string_list(self.personality_json.as_deref())
    }

    pub fn visual_descriptors(&self) -> Vec<String> {
        decode_string_list(self.visual_descriptors_json.as_deref())
    }

    /// Decode the adventurer equipment configuration, if present and valid.
    pub fn equipment_config(&self) -> Option<EquipmentConfig> {
        self.equipment_config_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
    }
}

fn decode_string_list(json: Option<&str>) -> Vec<String> {
    json.and_then(|j| serde_json::from_str(j).ok()).unwrap_or_default()
}

/// Equipment lists for one experience tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentTier {
    #[serde(default)]
    pub armor: Vec<String>,
    #[serde(default)]
    pub weapons: Vec<String>,
    #[serde(default)]
    pub accessories: Vec<String>,
}

/// Per-class equipment keyed by experience tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentConfig {
    #[serde(default)]
    pub low: EquipmentTier,
    #[serde(default)]
    pub mid: EquipmentTier,
    #[serde(default)]
    pub high: EquipmentTier,
}

// ============================================================================
// Description Template Record
// ============================================================================

/// User-editable description template with `{placeholder}` tokens.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DescriptionTemplateRecord {
    pub id: String,
    pub name: String,
    pub generator_type: String,
    pub template: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl DescriptionTemplateRecord {
    pub fn new(
        name: impl Into<String>,
        generator_type: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            generator_type: generator_type.into(),
            template: template.into(),
            description: None,
            is_active: true,
            is_default: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

// ============================================================================
// Generated Prompt Record
// ============================================================================

/// A persisted generated prompt (alien flow stores its successes).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedPromptRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub negative_prompt: String,
    pub tags_json: String, // JSON array of strings
    pub species_id: Option<String>,
    pub prompt_type: String,
    pub created_at: String,
}

impl GeneratedPromptRecord {
    pub fn tags(&self) -> Vec<String> {
        serde_json::from_str(&self.tags_json).unwrap_or_default()
    }
}

// ============================================================================
// User Session Record
// ============================================================================

/// One timestamped history entry in a user session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub prompt_id: String,
    pub viewed_at: String,
}

/// Per-browser-session favorites, history, and preferences.
///
/// Mutations are read-modify-write keyed by `session_id` with no locking;
/// concurrent writers are last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSessionRecord {
    pub session_id: String,
    pub favorites_json: String,   // JSON array of prompt ids
    pub history_json: String,     // JSON array of HistoryEntry, most recent first
    pub preferences_json: String, // JSON object, merged on write
    pub created_at: String,
    pub updated_at: String,
}

impl UserSessionRecord {
    /// Maximum retained history entries.
    pub const HISTORY_LIMIT: usize = 50;

    pub fn new(session_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            session_id: session_id.into(),
            favorites_json: "[]".to_string(),
            history_json: "[]".to_string(),
            preferences_json: "{}".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn favorites(&self) -> Vec<String> {
        serde_json::from_str(&self.favorites_json).unwrap_or_default()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        serde_json::from_str(&self.history_json).unwrap_or_default()
    }

    pub fn preferences(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::from_str(&self.preferences_json).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_output_value_falls_back_to_name() {
        let mut option = AttributeOptionRecord::new("hair_colors", "Silver");
        assert_eq!(option.output_value(), "Silver");
        option.value = Some("silver hair".to_string());
        assert_eq!(option.output_value(), "silver hair");
        option.value = Some(String::new());
        assert_eq!(option.output_value(), "Silver");
    }

    #[test]
    fn negative_weight_clamps_to_zero() {
        let mut option = AttributeOptionRecord::new("poses", "standing");
        option.weight = -3;
        assert_eq!(option.draw_weight(), 0);
    }

    #[test]
    fn species_decodes_json_lists() {
        let mut species = SpeciesRecord::new("Nekomata", "anime");
        species.features_json = Some(r#"["cat ears","twin tails"]"#.to_string());
        assert_eq!(species.features(), vec!["cat ears", "twin tails"]);
        assert!(species.personality().is_empty());
    }

    #[test]
    fn equipment_config_round_trip() {
        let config = EquipmentConfig {
            low: EquipmentTier {
                armor: vec!["leather armor".to_string()],
                weapons: vec!["short sword".to_string()],
                accessories: vec!["worn satchel".to_string()],
            },
            ..Default::default()
        };
        let mut species = SpeciesRecord::new("Warrior", "adventurer");
        species.equipment_config_json = Some(serde_json::to_string(&config).unwrap());
        let decoded = species.equipment_config().unwrap();
        assert_eq!(decoded.low.armor, vec!["leather armor"]);
        assert!(decoded.high.weapons.is_empty());
    }

    #[test]
    fn session_defaults_are_empty() {
        let session = UserSessionRecord::new("abc");
        assert!(session.favorites().is_empty());
        assert!(session.history().is_empty());
        assert!(session.preferences().is_empty());
    }
}
