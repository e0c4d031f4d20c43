use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::content::catalog::{ContentError, DefinitionCatalog};
use crate::content::memory::CONTENT_SCHEMA_VERSION;
use crate::rules::{
    AbilityDef, AbilityId, EffectKind, Rarity, Realm, RealmProfile, SynergyDef, SynergyId,
    TalentDef, TalentTier, TechniqueCategory, TechniqueDef, TechniqueId,
};

/// Catalog backed by a SQLite content database, for shipped content too large
/// to keep in one JSON file.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let conn = Connection::open(path)?;
        validate_content_meta(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn validate_content_meta(conn: &Connection) -> Result<(), ContentError> {
    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM content_meta WHERE key = 'schema_version'",
            params![],
            |row| row.get(0),
        )
        .optional()?;
    match version {
        Some(raw) => {
            let parsed: u32 = raw.parse().map_err(|_| {
                ContentError::Validation(format!("bad schema_version in content_meta: {}", raw))
            })?;
            if parsed != CONTENT_SCHEMA_VERSION {
                return Err(ContentError::Validation(format!(
                    "unsupported content schema version {}",
                    parsed
                )));
            }
            Ok(())
        }
        None => Err(ContentError::Validation(
            "content_meta missing schema_version".to_string(),
        )),
    }
}

fn parse<T: FromStr>(raw: &str, what: &str) -> Result<T, ContentError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|err| ContentError::Validation(format!("bad {} value {}: {}", what, raw, err)))
}

impl DefinitionCatalog for SqliteCatalog {
    fn abilities(&self) -> Result<Vec<AbilityDef>, ContentError> {
        let mut stmt = self.conn.prepare(
            "SELECT ability_id, name, required_realm, required_stage, required_technique,\
                    qi_cost, cooldown_ticks, effect, magnitude, xp_per_use, xp_per_level, max_level \
             FROM ability WHERE is_enabled = 1",
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, f64>(8)?,
                row.get::<_, f64>(9)?,
                row.get::<_, f64>(10)?,
                row.get::<_, i64>(11)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (
                id,
                name,
                realm_raw,
                stage,
                technique,
                qi_cost,
                cooldown_ticks,
                effect_raw,
                magnitude,
                xp_per_use,
                xp_per_level,
                max_level,
            ) = row?;
            out.push(AbilityDef {
                id: AbilityId(id),
                name,
                required_realm: parse::<Realm>(&realm_raw, "realm")?,
                required_stage: stage.clamp(1, u8::MAX as i64) as u8,
                required_technique: technique.map(TechniqueId),
                qi_cost,
                cooldown_ticks,
                effect: parse::<EffectKind>(&effect_raw, "effect")?,
                magnitude,
                xp_per_use,
                xp_per_level,
                max_level: max_level.clamp(1, u8::MAX as i64) as u8,
            });
        }
        Ok(out)
    }

    fn techniques(&self) -> Result<Vec<TechniqueDef>, ContentError> {
        let grants = load_grants(&self.conn, "technique_ability", "technique_id")?;

        let mut stmt = self.conn.prepare(
            "SELECT technique_id, name, required_realm, category \
             FROM technique WHERE is_enabled = 1",
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, name, realm_raw, category_raw) = row?;
            let granted_abilities = grants.get(&id).cloned().unwrap_or_default();
            out.push(TechniqueDef {
                id: TechniqueId(id),
                name,
                required_realm: parse::<Realm>(&realm_raw, "realm")?,
                category: parse::<TechniqueCategory>(&category_raw, "category")?,
                granted_abilities,
            });
        }
        Ok(out)
    }

    fn synergies(&self) -> Result<Vec<SynergyDef>, ContentError> {
        let requirements = load_grants(&self.conn, "synergy_ability", "synergy_id")?;

        let mut stmt = self.conn.prepare(
            "SELECT synergy_id, name, rarity, required_realm, bonus_multiplier, description \
             FROM synergy WHERE is_enabled = 1",
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, name, rarity_raw, realm_raw, bonus_multiplier, description) = row?;
            let required_abilities = requirements.get(&id).cloned().unwrap_or_default();
            if required_abilities.is_empty() {
                return Err(ContentError::Validation(format!(
                    "synergy {} requires no abilities",
                    id
                )));
            }
            out.push(SynergyDef {
                id: SynergyId(id),
                name,
                rarity: parse::<Rarity>(&rarity_raw, "rarity")?,
                required_realm: parse::<Realm>(&realm_raw, "realm")?,
                required_abilities,
                bonus_multiplier,
                description: description.unwrap_or_default(),
            });
        }
        Ok(out)
    }

    fn talents(&self) -> Result<Vec<TalentDef>, ContentError> {
        let mut stmt = self.conn.prepare(
            "SELECT tier, gain_multiplier, qi_multiplier, breakthrough_bonus FROM talent",
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (tier_raw, gain_multiplier, qi_multiplier, breakthrough_bonus) = row?;
            out.push(TalentDef {
                tier: parse::<TalentTier>(&tier_raw, "talent tier")?,
                gain_multiplier,
                qi_multiplier,
                breakthrough_bonus,
            });
        }
        Ok(out)
    }

    fn realm_profiles(&self) -> Result<Vec<RealmProfile>, ContentError> {
        let mut stmt = self.conn.prepare(
            "SELECT realm, max_stage, base_max_qi, qi_per_stage, base_qi_regen, regen_per_stage,\
                    base_required_points, points_per_stage, base_breakthrough_chance, chance_decay,\
                    base_progress_rate, attack_multiplier, speed_bonus \
             FROM realm_profile",
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, f64>(8)?,
                row.get::<_, f64>(9)?,
                row.get::<_, f64>(10)?,
                row.get::<_, f64>(11)?,
                row.get::<_, f64>(12)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (
                realm_raw,
                max_stage,
                base_max_qi,
                qi_per_stage,
                base_qi_regen,
                regen_per_stage,
                base_required_points,
                points_per_stage,
                base_breakthrough_chance,
                chance_decay,
                base_progress_rate,
                attack_multiplier,
                speed_bonus,
            ) = row?;
            out.push(RealmProfile {
                realm: parse::<Realm>(&realm_raw, "realm")?,
                max_stage: max_stage.clamp(1, u8::MAX as i64) as u8,
                base_max_qi,
                qi_per_stage,
                base_qi_regen,
                regen_per_stage,
                base_required_points,
                points_per_stage,
                base_breakthrough_chance,
                chance_decay,
                base_progress_rate,
                attack_multiplier,
                speed_bonus,
            });
        }
        Ok(out)
    }
}

/// Shared loader for the (owner_id, ability_id, ord) join tables.
fn load_grants(
    conn: &Connection,
    table: &str,
    owner_column: &str,
) -> Result<HashMap<String, Vec<AbilityId>>, ContentError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {owner}, ability_id FROM {table} ORDER BY {owner}, ord",
        owner = owner_column,
        table = table,
    ))?;
    let rows = stmt.query_map(params![], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut out: HashMap<String, Vec<AbilityId>> = HashMap::new();
    for row in rows {
        let (owner, ability) = row?;
        out.entry(owner).or_default().push(AbilityId(ability));
    }
    Ok(out)
}
