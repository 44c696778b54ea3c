//! Row schemas for the tables the model and world formats refer to.
//!
//! Layouts follow the 3.3.5a client. Localized names use
//! [`FieldType::DbcLangString`], which resolves to 16 locales plus flags
//! before Cataclysm and to a single string plus flags from Cataclysm on.

use wow_data::schema::{FieldType, Schema};

use crate::Result;

/// Names of the built-in schemas, as accepted by [`builtin`].
pub const BUILTIN: [&str; 6] = [
    "AnimationData",
    "CreatureDisplayInfo",
    "CreatureModelData",
    "CreatureType",
    "ItemDisplayInfo",
    "CharSections",
];

/// Built-in schema by table name. The name is matched case-insensitively
/// and may carry a `.dbc` extension.
pub fn builtin(name: &str) -> Result<Option<Schema>> {
    let name = name.strip_suffix(".dbc").unwrap_or(name);
    let schema = match name.to_ascii_lowercase().as_str() {
        "animationdata" => animation_data(),
        "creaturedisplayinfo" => creature_display_info(),
        "creaturemodeldata" => creature_model_data(),
        "creaturetype" => creature_type(),
        "itemdisplayinfo" => item_display_info(),
        "charsections" => char_sections(),
        _ => return Ok(None),
    };
    schema.map(Some)
}

/// Animation names referenced by M2 sequence ids.
pub fn animation_data() -> Result<Schema> {
    Ok(Schema::builder("AnimationData")
        .field("id", FieldType::U32)
        .field("name", FieldType::DbcString)
        .field("weapon_flags", FieldType::U32)
        .field("body_flags", FieldType::U32)
        .field("flags", FieldType::U32)
        .field("fallback", FieldType::U32)
        .field("behavior_id", FieldType::U32)
        .field("behavior_tier", FieldType::U32)
        .build()?)
}

pub fn creature_display_info() -> Result<Schema> {
    Ok(Schema::builder("CreatureDisplayInfo")
        .field("id", FieldType::U32)
        .field("model_id", FieldType::U32)
        .field("sound_id", FieldType::U32)
        .field("extended_display_info_id", FieldType::U32)
        .field("creature_model_scale", FieldType::F32)
        .field("creature_model_alpha", FieldType::U32)
        .field("texture_variation", FieldType::fixed(FieldType::DbcString, 3))
        .field("portrait_texture_name", FieldType::DbcString)
        .field("blood_level", FieldType::U32)
        .field("blood_id", FieldType::U32)
        .field("npc_sound_id", FieldType::U32)
        .field("particle_color_id", FieldType::U32)
        .field("creature_geoset_data", FieldType::U32)
        .field("object_effect_package_id", FieldType::U32)
        .build()?)
}

/// Model paths and collision sizes per creature model.
pub fn creature_model_data() -> Result<Schema> {
    Ok(Schema::builder("CreatureModelData")
        .field("id", FieldType::U32)
        .field("flags", FieldType::U32)
        .field("model_name", FieldType::DbcString)
        .field("size_class", FieldType::U32)
        .field("model_scale", FieldType::F32)
        .field("blood_id", FieldType::U32)
        .field("footprint_texture_id", FieldType::U32)
        .field("footprint_texture_length", FieldType::F32)
        .field("footprint_texture_width", FieldType::F32)
        .field("footprint_particle_scale", FieldType::F32)
        .field("foley_material_id", FieldType::U32)
        .field("footstep_shake_size", FieldType::U32)
        .field("death_thud_shake_size", FieldType::U32)
        .field("sound_id", FieldType::U32)
        .field("collision_width", FieldType::F32)
        .field("collision_height", FieldType::F32)
        .field("mount_height", FieldType::F32)
        .field("geo_box_min", FieldType::Vec3)
        .field("geo_box_max", FieldType::Vec3)
        .field("world_effect_scale", FieldType::F32)
        .field("attached_effect_scale", FieldType::F32)
        .field("missile_collision_radius", FieldType::F32)
        .field("missile_collision_push", FieldType::F32)
        .field("missile_collision_raise", FieldType::F32)
        .build()?)
}

pub fn creature_type() -> Result<Schema> {
    Ok(Schema::builder("CreatureType")
        .field("id", FieldType::U32)
        .field("name", FieldType::DbcLangString)
        .field("flags", FieldType::U32)
        .build()?)
}

/// Item models, icons and the textures composited onto character skins.
pub fn item_display_info() -> Result<Schema> {
    Ok(Schema::builder("ItemDisplayInfo")
        .field("id", FieldType::U32)
        .field("model_name", FieldType::fixed(FieldType::DbcString, 2))
        .field("model_texture", FieldType::fixed(FieldType::DbcString, 2))
        .field("inventory_icon", FieldType::fixed(FieldType::DbcString, 2))
        .field("geoset_group", FieldType::fixed(FieldType::U32, 3))
        .field("flags", FieldType::U32)
        .field("spell_visual_id", FieldType::U32)
        .field("group_sound_index", FieldType::U32)
        .field("helmet_geoset_vis_id", FieldType::fixed(FieldType::U32, 2))
        .field("texture", FieldType::fixed(FieldType::DbcString, 8))
        .field("item_visual", FieldType::U32)
        .field("particle_color_id", FieldType::U32)
        .build()?)
}

/// Skin, face and hair textures per race, sex and variation.
pub fn char_sections() -> Result<Schema> {
    Ok(Schema::builder("CharSections")
        .field("id", FieldType::U32)
        .field("race_id", FieldType::U32)
        .field("sex_id", FieldType::U32)
        .field("base_section", FieldType::U32)
        .field("texture_name", FieldType::fixed(FieldType::DbcString, 3))
        .field("flags", FieldType::U32)
        .field("variation_index", FieldType::U32)
        .field("color_index", FieldType::U32)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::column_count;
    use test_case::test_case;
    use wow_data::schema::{Bindings, Context, layout};
    use wow_data::version::ClientVersion;

    #[test_case("AnimationData", 8, 32)]
    #[test_case("CreatureDisplayInfo", 16, 64)]
    #[test_case("CreatureModelData", 28, 112)]
    #[test_case("CreatureType", 19, 76)]
    #[test_case("ItemDisplayInfo", 25, 100)]
    #[test_case("CharSections", 10, 40)]
    fn wotlk_layouts(name: &str, fields: u32, size: usize) {
        let schema = builtin(name).unwrap().unwrap();
        let wotlk = Context::new(ClientVersion::WotLK);
        let resolved = layout(&schema, &Bindings::new(), wotlk).unwrap();
        assert_eq!(column_count(&resolved), fields);
        assert_eq!(resolved.size(), size);
    }

    #[test]
    fn creature_type_shrinks_in_cataclysm() {
        let schema = creature_type().unwrap();
        let cata_ctx = Context::new(ClientVersion::Cataclysm);
        let cata = layout(&schema, &Bindings::new(), cata_ctx).unwrap();
        assert_eq!(cata.size(), 16);
        assert_eq!(column_count(&cata), 4);
    }

    #[test]
    fn lookup_by_file_name() {
        assert_eq!(builtin("AnimationData.dbc").unwrap().unwrap().name(), "AnimationData");
        assert_eq!(builtin("charsections").unwrap().unwrap().name(), "CharSections");
        assert!(builtin("Spell").unwrap().is_none());
        assert_eq!(BUILTIN.len(), 6);
    }
}
