//! Database Migrations
//!
//! Handles schema creation and versioned migrations. Seed rows use
//! `INSERT OR IGNORE` so re-running a seed migration is an explicit
//! insert-if-absent, never a swallowed duplicate-key error.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

/// Current database schema version
const SCHEMA_VERSION: i32 = 3;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create migrations table if it doesn't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = get_current_version(pool).await?;

    info!(current_version, target_version = SCHEMA_VERSION, "Checking database migrations");

    if current_version < SCHEMA_VERSION {
        info!("Running database migrations from v{} to v{}", current_version, SCHEMA_VERSION);

        for version in (current_version + 1)..=SCHEMA_VERSION {
            run_migration(pool, version).await?;
        }

        info!("Database migrations completed successfully");
    }

    Ok(())
}

/// Get the current schema version
async fn get_current_version(pool: &SqlitePool) -> Result<i32, sqlx::Error> {
    let result = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(result
        .and_then(|row| row.try_get::<i32, _>("version").ok())
        .unwrap_or(0))
}

/// Run a specific migration version
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<(), sqlx::Error> {
    let (name, sql) = match version {
        1 => ("initial_schema", MIGRATION_V1),
        2 => ("seed_attribute_catalog", MIGRATION_V2),
        3 => ("seed_species_and_templates", MIGRATION_V3),
        _ => {
            warn!("Unknown migration version: {}", version);
            return Ok(());
        }
    };

    info!("Applying migration v{}: {}", version, name);

    for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement.trim()).execute(pool).await?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

// ============================================================================
// Migration SQL
// ============================================================================

const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS attribute_options (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT,
    weight INTEGER NOT NULL DEFAULT 1,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_attribute_options_category_name
    ON attribute_options(category, name);

CREATE INDEX IF NOT EXISTS idx_attribute_options_category
    ON attribute_options(category);

CREATE TABLE IF NOT EXISTS species (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    species_type TEXT NOT NULL,
    features_json TEXT,
    personality_json TEXT,
    visual_descriptors_json TEXT,
    ears TEXT,
    tail TEXT,
    wings TEXT,
    species_class TEXT,
    climate TEXT,
    equipment_config_json TEXT,
    negative_prompt TEXT,
    description_template_id TEXT,
    weight INTEGER NOT NULL DEFAULT 1,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_species_name_type
    ON species(name, species_type);

CREATE INDEX IF NOT EXISTS idx_species_type
    ON species(species_type);

CREATE TABLE IF NOT EXISTS description_templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    generator_type TEXT NOT NULL,
    template TEXT NOT NULL,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_description_templates_type
    ON description_templates(generator_type);

CREATE TABLE IF NOT EXISTS generated_prompts (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    negative_prompt TEXT NOT NULL DEFAULT '',
    tags_json TEXT NOT NULL DEFAULT '[]',
    species_id TEXT,
    prompt_type TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_generated_prompts_created
    ON generated_prompts(created_at);

CREATE TABLE IF NOT EXISTS user_sessions (
    session_id TEXT PRIMARY KEY,
    favorites_json TEXT NOT NULL DEFAULT '[]',
    history_json TEXT NOT NULL DEFAULT '[]',
    preferences_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

const MIGRATION_V2: &str = r#"
INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('gender-female', 'gender', 'female', 3),
    ('gender-male', 'gender', 'male', 2),
    ('gender-nonbinary', 'gender', 'non-binary', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('hair-silver', 'hair_colors', 'silver', 2),
    ('hair-black', 'hair_colors', 'black', 3),
    ('hair-pink', 'hair_colors', 'pink', 2),
    ('hair-blonde', 'hair_colors', 'blonde', 3),
    ('hair-blue', 'hair_colors', 'blue', 2),
    ('hair-red', 'hair_colors', 'red', 2),
    ('hair-brown', 'hair_colors', 'brown', 3),
    ('hair-white', 'hair_colors', 'white', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('style-long-straight', 'hair_styles', 'long straight', 3),
    ('style-twin-tails', 'hair_styles', 'twin tails', 2),
    ('style-short-bob', 'hair_styles', 'short bob', 2),
    ('style-ponytail', 'hair_styles', 'high ponytail', 2),
    ('style-braided', 'hair_styles', 'braided', 2),
    ('style-wavy', 'hair_styles', 'loose wavy', 2),
    ('style-messy', 'hair_styles', 'messy', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('skin-fair', 'skin_colors', 'fair', 3),
    ('skin-pale', 'skin_colors', 'pale', 2),
    ('skin-tan', 'skin_colors', 'tan', 2),
    ('skin-olive', 'skin_colors', 'olive', 2),
    ('skin-dark', 'skin_colors', 'dark', 2),
    ('skin-porcelain', 'skin_colors', 'porcelain', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('eye-blue', 'eye_colors', 'blue', 3),
    ('eye-green', 'eye_colors', 'emerald green', 2),
    ('eye-amber', 'eye_colors', 'amber', 2),
    ('eye-violet', 'eye_colors', 'violet', 1),
    ('eye-red', 'eye_colors', 'crimson', 1),
    ('eye-golden', 'eye_colors', 'golden', 2),
    ('eye-hetero', 'eye_colors', 'heterochromatic', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('expr-gentle', 'eye_expressions', 'a gentle', 3),
    ('expr-fierce', 'eye_expressions', 'a fierce', 2),
    ('expr-curious', 'eye_expressions', 'a curious', 2),
    ('expr-melancholic', 'eye_expressions', 'a melancholic', 1),
    ('expr-playful', 'eye_expressions', 'a playful', 2),
    ('expr-determined', 'eye_expressions', 'a determined', 2);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('bg-cherry', 'backgrounds', 'a cherry blossom garden', 2),
    ('bg-neon', 'backgrounds', 'a neon cityscape', 2),
    ('bg-temple', 'backgrounds', 'an ancient temple', 2),
    ('bg-starry', 'backgrounds', 'a starry night sky', 2),
    ('bg-forest', 'backgrounds', 'a misty forest', 2),
    ('bg-castle', 'backgrounds', 'a castle courtyard', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('pose-standing', 'poses', 'standing confidently', 3),
    ('pose-sitting', 'poses', 'sitting gracefully', 2),
    ('pose-leaping', 'poses', 'leaping mid-air', 1),
    ('pose-shoulder', 'poses', 'looking over one shoulder', 2),
    ('pose-crouching', 'poses', 'crouching low', 1),
    ('pose-walking', 'poses', 'walking forward', 2);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('face-freckles', 'facial_features', 'light freckles', 2),
    ('face-beauty-mark', 'facial_features', 'a small beauty mark', 2),
    ('face-soft-smile', 'facial_features', 'a soft smile', 3),
    ('face-sharp-jaw', 'facial_features', 'a sharp jawline', 2),
    ('face-rosy', 'facial_features', 'rosy cheeks', 2),
    ('face-brows', 'facial_features', 'delicate eyebrows', 2),
    ('face-scar', 'facial_features', 'a faint scar', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('acc-necklace', 'accessories', 'a silver necklace', 2),
    ('acc-ribbon', 'accessories', 'a hair ribbon', 2),
    ('acc-glasses', 'accessories', 'round glasses', 2),
    ('acc-earrings', 'accessories', 'jeweled earrings', 2),
    ('acc-flower-crown', 'accessories', 'a flower crown', 1),
    ('acc-choker', 'accessories', 'a leather choker', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('art-anime', 'artistic_styles', 'anime', 3),
    ('art-watercolor', 'artistic_styles', 'watercolor', 1),
    ('art-cel', 'artistic_styles', 'cel-shaded', 2),
    ('art-digital', 'artistic_styles', 'digital painting', 2),
    ('art-ukiyoe', 'artistic_styles', 'ukiyo-e inspired', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('env-fantasy', 'environments', 'fantasy background', 3),
    ('env-rooftop', 'environments', 'a moonlit rooftop', 2),
    ('env-library', 'environments', 'an enchanted library', 2),
    ('env-market', 'environments', 'a bustling market street', 2);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('artifact-simple', 'cultural_artifacts', 'simple item', 2),
    ('artifact-lantern', 'cultural_artifacts', 'a paper lantern', 2),
    ('artifact-fan', 'cultural_artifacts', 'an ornate folding fan', 2),
    ('artifact-scroll', 'cultural_artifacts', 'an ancient scroll', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('cloth-uniform', 'clothing', 'a school uniform', 2),
    ('cloth-kimono', 'clothing', 'a flowing kimono', 2),
    ('cloth-armor', 'clothing', 'ornate battle armor', 2),
    ('cloth-hoodie', 'clothing', 'a casual hoodie', 1),
    ('cloth-robes', 'clothing', 'ceremonial robes', 2);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('ptrait-diplomatic', 'positive_traits', 'diplomatic', 2),
    ('ptrait-ingenious', 'positive_traits', 'ingenious', 2),
    ('ptrait-honorable', 'positive_traits', 'honorable', 2),
    ('ptrait-adaptable', 'positive_traits', 'adaptable', 2),
    ('ptrait-empathic', 'positive_traits', 'empathic', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('ntrait-ruthless', 'negative_traits', 'ruthless', 2),
    ('ntrait-secretive', 'negative_traits', 'secretive', 2),
    ('ntrait-xenophobic', 'negative_traits', 'xenophobic', 1),
    ('ntrait-volatile', 'negative_traits', 'volatile', 2),
    ('ntrait-proud', 'negative_traits', 'unbendingly proud', 2);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('climate-temperate', 'climates', 'temperate', 3),
    ('climate-arid', 'climates', 'arid desert', 2),
    ('climate-frozen', 'climates', 'frozen', 2),
    ('climate-tropical', 'climates', 'tropical', 2),
    ('climate-volcanic', 'climates', 'volcanic', 1);

INSERT OR IGNORE INTO attribute_options (id, category, name, weight) VALUES
    ('race-human', 'races', 'human', 3),
    ('race-elf', 'races', 'elf', 2),
    ('race-dwarf', 'races', 'dwarf', 2),
    ('race-halfling', 'races', 'halfling', 2),
    ('race-orc', 'races', 'orc', 2),
    ('race-tiefling', 'races', 'tiefling', 1),
    ('race-dragonkin', 'races', 'dragonkin', 1),
    ('race-gnome', 'races', 'gnome', 1)
"#;

const MIGRATION_V3: &str = r#"
INSERT OR IGNORE INTO species
    (id, name, species_type, features_json, personality_json, visual_descriptors_json, ears, tail, wings, weight)
VALUES
    ('anime-nekomata', 'Nekomata', 'anime',
     '["twitching cat ears","twin forked tails"]',
     '["playful","mischievous"]',
     '["feline grace","slit pupils"]',
     'cat ears', 'twin cat tails', NULL, 3),
    ('anime-kitsune', 'Kitsune', 'anime',
     '["fox ears","flowing fox tail"]',
     '["cunning","wise"]',
     '["amber glow","elegant posture"]',
     'fox ears', 'fluffy fox tail', NULL, 2),
    ('anime-tenshi', 'Tenshi', 'anime',
     '["feathered wings","faint halo"]',
     '["serene","kind"]',
     '["soft radiance"]',
     NULL, NULL, 'white feathered wings', 1),
    ('anime-human', 'Human', 'anime',
     '[]',
     '["earnest","determined"]',
     '[]',
     NULL, NULL, NULL, 3);

INSERT OR IGNORE INTO species
    (id, name, species_type, features_json, species_class, climate, negative_prompt, weight)
VALUES
    ('alien-zyphorian', 'Zyphorian', 'alien',
     '["ridged brow","bioluminescent markings"]',
     'Humanoid', 'temperate', NULL, 3),
    ('alien-krelvax', 'Krelvax', 'alien',
     '["hooked beak","taloned hands"]',
     'Avian', 'arid desert', NULL, 2),
    ('alien-sylvani', 'Sylvani', 'alien',
     '["bark-like dermis","blossoming shoulders"]',
     'Plantoid', 'tropical', NULL, 2),
    ('alien-mechanoid', 'Mechanoid', 'alien',
     '["articulated chassis","glowing optic sensors"]',
     'Machine', 'volcanic', 'organic textures, flesh tones', 1),
    ('alien-vorthul', 'Vorthul', 'alien',
     '["gaunt frame","sunken luminous eyes"]',
     'Necroid', 'frozen', NULL, 1);

INSERT OR IGNORE INTO species
    (id, name, species_type, equipment_config_json, weight)
VALUES
    ('class-warrior', 'Warrior', 'adventurer',
     '{"low":{"armor":["dented chainmail"],"weapons":["notched longsword"],"accessories":["frayed war banner"]},"mid":{"armor":["polished half-plate"],"weapons":["engraved longsword","steel shield"],"accessories":["wolf-pelt cloak"]},"high":{"armor":["masterwork full plate"],"weapons":["runed greatsword"],"accessories":["gilded war horn"]}}',
     3),
    ('class-mage', 'Mage', 'adventurer',
     '{"low":{"armor":["patched robes"],"weapons":["gnarled staff"],"accessories":["cracked focus crystal"]},"mid":{"armor":["embroidered robes"],"weapons":["silver-capped staff"],"accessories":["glowing spellbook"]},"high":{"armor":["starwoven robes"],"weapons":["archmage staff"],"accessories":["floating arcane orbs"]}}',
     2),
    ('class-rogue', 'Rogue', 'adventurer',
     '{"low":{"armor":["worn leathers"],"weapons":["pair of daggers"],"accessories":["lockpick set"]},"mid":{"armor":["studded shadow leathers"],"weapons":["poisoned stilettos"],"accessories":["smoke bombs"]},"high":{"armor":["nightweave armor"],"weapons":["enchanted twin blades"],"accessories":["cloak of shadows"]}}',
     2),
    ('class-cleric', 'Cleric', 'adventurer',
     '{"low":{"armor":["travel vestments"],"weapons":["wooden mace"],"accessories":["simple holy symbol"]},"mid":{"armor":["blessed scale mail"],"weapons":["consecrated mace"],"accessories":["silver censer"]},"high":{"armor":["radiant plate"],"weapons":["warhammer of dawn"],"accessories":["reliquary amulet"]}}',
     2),
    ('class-ranger', 'Ranger', 'adventurer',
     '{"low":{"armor":["weathered leathers"],"weapons":["hunting bow"],"accessories":["quiver of arrows"]},"mid":{"armor":["forest-green leathers"],"weapons":["composite longbow","skinning knife"],"accessories":["hawk feather charm"]},"high":{"armor":["wardenscale armor"],"weapons":["heartwood longbow"],"accessories":["spirit-beast totem"]}}',
     2);

INSERT OR IGNORE INTO description_templates
    (id, name, generator_type, template, description, is_default)
VALUES
    ('tmpl-anime-default', 'Classic Anime Portrait', 'anime',
     'An anime-style {gender} {species} with {hair_color} {hair_style} hair, {skin_color} skin, and {eye_color} eyes with {eye_expression} expression. {pronoun_subject_cap} has {species_features} and wears {clothing}. {pronoun_subject_cap} is {pose} against {background}. {facial_features}. Art style: {artistic_style}.',
     'Default anime character description', 1),
    ('tmpl-alien-default', 'First Contact Dossier', 'alien',
     'A {gender} {species}, a {species_class} alien native to a {climate} world. {pronoun_subject_cap} has {skin_color} skin, {hair_color} {hair_style}, and {eye_color} eyes with {eye_expression} expression. {pronoun_subject_cap} is known for being {positive_trait} but {negative_trait}. {pronoun_subject_cap} is {pose} in {environment}. Art style: {style}.',
     'Default alien species description', 1),
    ('tmpl-adventurer-default', 'Tavern Introduction', 'adventurer',
     'A {gender} {race} {class} of {experience} experience. {pronoun_subject_cap} has {hair_color} {hair_style} hair, {skin_color} skin, and {eye_color} eyes. {race_features} {pronoun_subject_cap} wears {armor} and carries {weapons}, adorned with {accessories}. {pronoun_subject_cap} is {pose} against {background}.',
     'Default adventurer description', 1),
    ('tmpl-base-default', 'Plain Portrait', 'base',
     'A {gender} character with {hair_color} {hair_style} hair, {skin_color} skin, and {eye_color} eyes with {eye_expression} expression. {pronoun_subject_cap} is {pose} in {environment}. {facial_features}. Art style: {artistic_style}.',
     'Default base description', 1)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    // One connection so every query sees the same in-memory database.
    async fn memory_pool() -> SqlitePool {
        sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let version = get_current_version(&pool).await.unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn seed_data_is_present() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attribute_options")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(count > 50);

        let defaults: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM description_templates WHERE is_default = 1")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(defaults, 4);
    }

    #[tokio::test]
    async fn every_generator_category_is_seeded() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        for generator_type in crate::core::template::GeneratorType::ALL {
            for category in generator_type.attribute_categories() {
                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM attribute_options WHERE category = ? AND is_active = 1",
                )
                .bind(category)
                .fetch_one(&pool)
                .await
                .unwrap();
                assert!(count > 0, "category {category} has no seeded options");
            }
        }
    }
}
