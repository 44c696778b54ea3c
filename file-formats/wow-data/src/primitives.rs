//! Small composite scalars shared by every format: vectors, quaternions,
//! colors, boxes and fixed-point numbers.
//!
//! Each type implements both the `wow-data` record traits and `binrw`'s
//! `BinRead`/`BinWrite`, so it can be embedded in records of either style.

use binrw::{BinRead, BinWrite};
use wow_data_derive::{WowHeaderR, WowHeaderW};

#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct C2Vector {
    pub x: f32,
    pub y: f32,
}

impl C2Vector {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_glam(&self) -> glam::Vec2 {
        glam::Vec2::new(self.x, self.y)
    }

    pub fn from_glam(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct C3Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl C3Vector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn to_glam(&self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_glam(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<[f32; 3]> for C3Vector {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct C4Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl C4Vector {
    pub fn to_glam(&self) -> glam::Vec4 {
        glam::Vec4::new(self.x, self.y, self.z, self.w)
    }
}

/// Rotation stored as four floats in x, y, z, w order.
#[derive(Debug, Clone, Copy, PartialEq, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn to_glam(&self) -> glam::Quat {
        glam::Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }

    pub fn from_glam(q: glam::Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

/// Compressed rotation: each component is an unsigned 16-bit integer
/// normalized by `0x7FFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct CompQuat {
    pub x: u16,
    pub y: u16,
    pub z: u16,
    pub w: u16,
}

impl CompQuat {
    pub const SCALE: f32 = 0x7FFF as f32;

    pub fn to_quaternion(self) -> Quaternion {
        Quaternion {
            x: f32::from(self.x) / Self::SCALE,
            y: f32::from(self.y) / Self::SCALE,
            z: f32::from(self.z) / Self::SCALE,
            w: f32::from(self.w) / Self::SCALE,
        }
    }

    pub fn from_quaternion(q: Quaternion) -> Self {
        let pack = |v: f32| (v * Self::SCALE).round().clamp(0.0, f32::from(u16::MAX)) as u16;
        Self {
            x: pack(q.x),
            y: pack(q.y),
            z: pack(q.z),
            w: pack(q.w),
        }
    }
}

impl Default for CompQuat {
    /// The identity rotation `(0, 0, 0, 1)`.
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            w: 0x7FFF,
        }
    }
}

/// 16-bit fixed point fraction, `raw / 32767`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite,
)]
#[brw(little)]
pub struct Fixed16(pub i16);

impl Fixed16 {
    pub const ONE: Self = Self(0x7FFF);

    pub fn to_f32(self) -> f32 {
        f32::from(self.0) / 32767.0
    }

    pub fn from_f32(value: f32) -> Self {
        Self((value * 32767.0).round().clamp(-32768.0, 32767.0) as i16)
    }
}

/// Four byte color stored blue, green, red, alpha on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite,
)]
#[brw(little)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::from_rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::from_rgba(0, 0, 0, 0);

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    pub const fn rgba(self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, self.a)
    }

    /// Components scaled to `[0, 1]`, in r, g, b, a order.
    pub fn to_unit(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

/// Axis aligned box, min corner then max corner.
///
/// No ordering between the corners is enforced: inverted boxes are used as
/// "uninitialized" markers by some exporters.
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct BoundingBox {
    pub min: C3Vector,
    pub max: C3Vector,
}

impl BoundingBox {
    pub const fn new(min: C3Vector, max: C3Vector) -> Self {
        Self { min, max }
    }

    pub const fn zero() -> Self {
        Self::new(C3Vector::origin(), C3Vector::origin())
    }

    pub fn is_inverted(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }
}

/// A box plus bounding sphere radius.
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct Bounds {
    pub extent: BoundingBox,
    pub radius: f32,
}

/// Inclusive integer range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite,
)]
#[brw(little)]
pub struct Range {
    pub minimum: u32,
    pub maximum: u32,
}

/// Plane as a normal and a signed distance from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW, BinRead, BinWrite)]
#[brw(little)]
pub struct Plane {
    pub normal: C3Vector,
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WowHeaderW, WowReaderForHeader, WowWriterForHeader};
    use binrw::BinReaderExt;
    use std::io::Cursor;

    #[test]
    fn color_wire_order_is_bgra() {
        let mut cursor = Cursor::new([10_u8, 20, 30, 40]);
        let color: Color = cursor.wow_read().unwrap();
        assert_eq!(color.rgba(), (30, 20, 10, 40));

        let mut out = Vec::new();
        out.wow_write(&Color::from_rgba(1, 2, 3, 4)).unwrap();
        assert_eq!(out, [3, 2, 1, 4]);
    }

    #[test]
    fn binrw_and_wow_data_agree() {
        let bytes = [0_u8, 0, 128, 63, 0, 0, 0, 64, 0, 0, 64, 64];
        let mut a = Cursor::new(bytes);
        let mut b = Cursor::new(bytes);
        let from_wow: C3Vector = a.wow_read().unwrap();
        let from_binrw: C3Vector = b.read_le().unwrap();
        assert_eq!(from_wow, from_binrw);
        assert_eq!(from_wow, C3Vector::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn fixed16_scales_by_32767() {
        assert!((Fixed16(32767).to_f32() - 1.0).abs() < f32::EPSILON);
        assert!((Fixed16(-32767).to_f32() + 1.0).abs() < f32::EPSILON);
        assert_eq!(Fixed16::from_f32(0.5), Fixed16(16384));
    }

    #[test]
    fn comp_quat_default_is_identity() {
        let q = CompQuat::default().to_quaternion();
        assert_eq!(q, Quaternion::IDENTITY);
        assert_eq!(CompQuat::from_quaternion(q), CompQuat::default());
    }

    #[test]
    fn sizes() {
        assert_eq!(BoundingBox::zero().wow_size(), 24);
        assert_eq!(Bounds::default().wow_size(), 28);
        assert_eq!(CompQuat::default().wow_size(), 8);
        assert_eq!(Plane::default().wow_size(), 16);
    }

    #[test]
    fn inverted_box_is_kept() {
        let inverted = BoundingBox::new(C3Vector::new(1.0, 1.0, 1.0), C3Vector::origin());
        let mut out = Vec::new();
        out.wow_write(&inverted).unwrap();
        let back: BoundingBox = Cursor::new(out).wow_read().unwrap();
        assert!(back.is_inverted());
        assert_eq!(back, inverted);
    }
}
