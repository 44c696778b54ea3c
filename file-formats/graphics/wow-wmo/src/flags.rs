use bitflags::bitflags;

bitflags! {
    /// MOGP / MOGI group flags
    ///
    /// Bits not named here are kept as read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WmoGroupFlags: u32 {
        /// MOBN and MOBR present
        const HAS_BSP = 0x1;
        const HAS_LIGHT_MAP = 0x2;
        /// MOCV present
        const HAS_VERTEX_COLORS = 0x4;
        const OUTDOOR = 0x8;
        const DO_NOT_USE_LOCAL_LIGHTING = 0x40;
        /// MOLR present
        const HAS_LIGHTS = 0x200;
        /// MODR present
        const HAS_DOODADS = 0x800;
        /// MLIQ present
        const HAS_WATER = 0x1000;
        const INDOOR = 0x2000;
        const ALWAYS_DRAW = 0x10000;
        const HAS_SKYBOX = 0x40000;
        const IS_NOT_OCEAN = 0x80000;
        const IS_MOUNT_ALLOWED = 0x200000;
        /// Second MOCV present
        const HAS_TWO_MOCV = 0x1000000;
        /// Second MOTV present
        const HAS_TWO_MOTV = 0x2000000;
    }
}

bitflags! {
    /// MOHD flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WmoRootFlags: u32 {
        const DO_NOT_ATTENUATE_VERTICES = 0x1;
        const USE_UNIFIED_RENDER_PATH = 0x2;
        const USE_LIQUID_TYPE_DBC_ID = 0x4;
        const DO_NOT_FIX_VERTEX_COLOR_ALPHA = 0x8;
    }
}

bitflags! {
    /// MOMT flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WmoMaterialFlags: u32 {
        const UNLIT = 0x1;
        const UNFOGGED = 0x2;
        const TWO_SIDED = 0x4;
        const EXTERIOR_LIGHT = 0x8;
        const NIGHT_GLOW = 0x10;
        const WINDOW = 0x20;
        const CLAMP_S = 0x40;
        const CLAMP_T = 0x80;
    }
}

/// Liquid types whose MLIQ vertices carry texture coordinates instead of
/// flow data.
pub fn is_magma_liquid(liquid_type: u32) -> bool {
    matches!(liquid_type, 3 | 4 | 7 | 8 | 11 | 12)
}
