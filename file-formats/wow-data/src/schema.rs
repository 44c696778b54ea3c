//! Records described at runtime.
//!
//! Most record types in this workspace are Rust structs with derived codecs.
//! Tables whose shape is only known at runtime (DBC row layouts, tool-side
//! dumps) are described with a [`Schema`] instead: an ordered list of fields
//! interleaved with `when`/`elif`/`otherwise` gates on the client version or
//! on a flag word. A schema is resolved against a [`Context`] into a flat
//! [`Layout`] with byte offsets, which can then read and write [`Record`]s.
//!
//! Schemas may leave field types open as template slots (`T0`, `T1`, or
//! `T["values"]`). [`layout`] binds them and caches the result process-wide,
//! so repeated instantiations share one descriptor.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::{Result, WowDataError};
use crate::primitives::{BoundingBox, C2Vector, C3Vector, Color, CompQuat, Fixed16, Quaternion};
use crate::types::{Read, Seek, Write, WowReaderForHeader, WowWriterForHeader};
use crate::version::ClientVersion;

/// Number of locale slots of a localized string before Cataclysm.
pub const LANG_STRING_LOCALES: usize = 16;

/// A template slot, either positional or named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Positional(usize),
    Keyword(String),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(i) => write!(f, "T{i}"),
            Self::Keyword(name) => write!(f, "T[\"{name}\"]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    F32,
    F64,
    Vec2,
    Vec3,
    Quat,
    CompQuat,
    Color,
    BoundingBox,
    Fixed16,
    /// 32-bit offset into a trailing string block.
    DbcString,
    /// Per-locale string offsets plus a flags word. The locale count depends
    /// on the client version.
    DbcLangString,
    /// `N` contiguous elements.
    Fixed(Box<FieldType>, usize),
    /// `(count, offset)` pair; the payload is not followed by a layout.
    ArrayRef(Box<FieldType>),
    /// Open type, bound at instantiation.
    Slot(Slot),
}

impl FieldType {
    pub fn fixed(element: Self, count: usize) -> Self {
        Self::Fixed(Box::new(element), count)
    }

    pub fn array_ref(element: Self) -> Self {
        Self::ArrayRef(Box::new(element))
    }

    pub fn slot(index: usize) -> Self {
        Self::Slot(Slot::Positional(index))
    }

    pub fn keyword(name: &str) -> Self {
        Self::Slot(Slot::Keyword(name.to_string()))
    }

    fn wire_size(&self, version: ClientVersion) -> Option<usize> {
        Some(match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::Fixed16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Color | Self::DbcString => 4,
            Self::U64 | Self::F64 | Self::Vec2 | Self::CompQuat | Self::ArrayRef(_) => 8,
            Self::Vec3 => 12,
            Self::Quat => 16,
            Self::BoundingBox => 24,
            Self::DbcLangString => (lang_locales(version) + 1) * 4,
            Self::Fixed(element, count) => element.wire_size(version)? * count,
            Self::Slot(_) => return None,
        })
    }

    fn first_slot(&self) -> Option<&Slot> {
        match self {
            Self::Slot(slot) => Some(slot),
            Self::Fixed(element, _) | Self::ArrayRef(element) => element.first_slot(),
            _ => None,
        }
    }

    fn bind(&self, bindings: &Bindings) -> Self {
        match self {
            Self::Slot(slot) => bindings.get(slot).cloned().unwrap_or_else(|| self.clone()),
            Self::Fixed(element, count) => Self::Fixed(Box::new(element.bind(bindings)), *count),
            Self::ArrayRef(element) => Self::ArrayRef(Box::new(element.bind(bindings))),
            other => other.clone(),
        }
    }

    /// Zero value of this type.
    pub fn zero(&self, version: ClientVersion) -> Value {
        match self {
            Self::U8 => Value::U8(0),
            Self::I8 => Value::I8(0),
            Self::U16 => Value::U16(0),
            Self::I16 => Value::I16(0),
            Self::U32 => Value::U32(0),
            Self::I32 => Value::I32(0),
            Self::U64 => Value::U64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            Self::Vec2 => Value::Vec2(C2Vector::default()),
            Self::Vec3 => Value::Vec3(C3Vector::default()),
            Self::Quat => Value::Quat(Quaternion::default()),
            Self::CompQuat => Value::CompQuat(CompQuat::default()),
            Self::Color => Value::Color(Color::default()),
            Self::BoundingBox => Value::BoundingBox(BoundingBox::default()),
            Self::Fixed16 => Value::Fixed16(Fixed16::default()),
            Self::DbcString => Value::String(String::new()),
            Self::DbcLangString => Value::LangString(LangString::empty(version)),
            Self::Fixed(element, count) => Value::Array(vec![element.zero(version); *count]),
            Self::ArrayRef(_) => Value::ArrayRef { count: 0, offset: 0 },
            Self::Slot(_) => Value::U32(0),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(element, count) => write!(f, "{element}[{count}]"),
            Self::ArrayRef(element) => write!(f, "Array<{element}>"),
            Self::Slot(slot) => write!(f, "{slot}"),
            other => write!(f, "{other:?}"),
        }
    }
}

fn lang_locales(version: ClientVersion) -> usize {
    if version >= ClientVersion::Cataclysm {
        1
    } else {
        LANG_STRING_LOCALES
    }
}

/// Condition gating a group of fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Always,
    VersionAtLeast(ClientVersion),
    VersionBelow(ClientVersion),
    /// Every bit of the mask is set in the context flags.
    FlagsSet(u32),
    /// No bit of the mask is set in the context flags.
    FlagsClear(u32),
    Not(Box<Predicate>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn holds(&self, ctx: Context) -> bool {
        match self {
            Self::Always => true,
            Self::VersionAtLeast(v) => ctx.version >= *v,
            Self::VersionBelow(v) => ctx.version < *v,
            Self::FlagsSet(mask) => ctx.flags & mask == *mask,
            Self::FlagsClear(mask) => ctx.flags & mask == 0,
            Self::Not(inner) => !inner.holds(ctx),
            Self::All(all) => all.iter().all(|p| p.holds(ctx)),
            Self::Any(any) => any.iter().any(|p| p.holds(ctx)),
        }
    }
}

/// Everything a gate may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    pub version: ClientVersion,
    pub flags: u32,
}

impl Context {
    pub const fn new(version: ClientVersion) -> Self {
        Self { version, flags: 0 }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Field(FieldDef),
    Gate {
        branches: Vec<(Predicate, Vec<Item>)>,
        otherwise: Vec<Item>,
    },
}

/// An immutable record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    items: Vec<Item>,
}

impl Schema {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any field type still has an open slot.
    pub fn is_template(&self) -> bool {
        let mut open = false;
        visit_fields(&self.items, &mut |field| open |= field.ty.first_slot().is_some());
        open
    }

    /// Bind every slot, producing a concrete schema.
    ///
    /// A slot reachable from any branch that `bindings` leaves open fails
    /// with [`WowDataError::TemplateUnbound`].
    pub fn instantiate(&self, bindings: &Bindings) -> Result<Self> {
        let mut unbound = None;
        visit_fields(&self.items, &mut |field| {
            if unbound.is_none() {
                if let Some(slot) = field.ty.bind(bindings).first_slot() {
                    unbound = Some(slot.clone());
                }
            }
        });
        if let Some(slot) = unbound {
            return Err(WowDataError::TemplateUnbound {
                template: self.name.clone(),
                slot: slot.to_string(),
            });
        }
        Ok(Self {
            name: self.name.clone(),
            items: bind_items(&self.items, bindings),
        })
    }

    /// Flatten the fields active under `ctx` into a layout.
    pub fn resolve(&self, ctx: Context) -> Result<Layout> {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0;
        self.resolve_items(&self.items, ctx, &mut fields, &mut seen, &mut offset)?;
        Ok(Layout {
            name: self.name.clone(),
            context: ctx,
            fields,
            size: offset,
        })
    }

    fn resolve_items(
        &self,
        items: &[Item],
        ctx: Context,
        fields: &mut Vec<LayoutField>,
        seen: &mut HashSet<String>,
        offset: &mut usize,
    ) -> Result<()> {
        for item in items {
            match item {
                Item::Field(def) => {
                    if !seen.insert(def.name.clone()) {
                        return Err(WowDataError::DuplicateField {
                            schema: self.name.clone(),
                            field: def.name.clone(),
                        });
                    }
                    let size = def.ty.wire_size(ctx.version).ok_or_else(|| {
                        WowDataError::TemplateUnbound {
                            template: self.name.clone(),
                            slot: def.ty.first_slot().map(ToString::to_string).unwrap_or_default(),
                        }
                    })?;
                    fields.push(LayoutField {
                        name: def.name.clone(),
                        ty: def.ty.clone(),
                        default: def.default.clone(),
                        offset: *offset,
                        size,
                    });
                    *offset += size;
                }
                Item::Gate {
                    branches,
                    otherwise,
                } => {
                    let taken = branches
                        .iter()
                        .find(|(predicate, _)| predicate.holds(ctx))
                        .map_or(otherwise, |(_, body)| body);
                    self.resolve_items(taken, ctx, fields, seen, offset)?;
                }
            }
        }
        Ok(())
    }
}

fn visit_fields(items: &[Item], visit: &mut impl FnMut(&FieldDef)) {
    for item in items {
        match item {
            Item::Field(def) => visit(def),
            Item::Gate {
                branches,
                otherwise,
            } => {
                for (_, body) in branches {
                    visit_fields(body, visit);
                }
                visit_fields(otherwise, visit);
            }
        }
    }
}

fn bind_items(items: &[Item], bindings: &Bindings) -> Vec<Item> {
    items
        .iter()
        .map(|item| match item {
            Item::Field(def) => Item::Field(FieldDef {
                ty: def.ty.bind(bindings),
                ..def.clone()
            }),
            Item::Gate {
                branches,
                otherwise,
            } => Item::Gate {
                branches: branches
                    .iter()
                    .map(|(p, body)| (p.clone(), bind_items(body, bindings)))
                    .collect(),
                otherwise: bind_items(otherwise, bindings),
            },
        })
        .collect()
}

/// Collects fields and gates in declaration order.
pub struct SchemaBuilder {
    name: String,
    items: Vec<Item>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn field(mut self, name: &str, ty: FieldType) -> Self {
        self.items.push(Item::Field(FieldDef {
            name: name.to_string(),
            ty,
            default: None,
        }));
        self
    }

    #[must_use]
    pub fn field_default(mut self, name: &str, ty: FieldType, default: Value) -> Self {
        self.items.push(Item::Field(FieldDef {
            name: name.to_string(),
            ty,
            default: Some(default),
        }));
        self
    }

    /// Open a gate: `body` is active when `predicate` holds. Further
    /// branches are added on the returned [`GateBuilder`], which must be
    /// closed with [`GateBuilder::end`] or [`GateBuilder::otherwise`].
    pub fn when(self, predicate: Predicate, body: impl FnOnce(Self) -> Self) -> GateBuilder {
        let inner = body(self.nested());
        GateBuilder {
            parent: self,
            branches: vec![(predicate, inner.items)],
        }
    }

    fn nested(&self) -> Self {
        Self {
            name: self.name.clone(),
            items: Vec::new(),
        }
    }

    /// Check names and freeze the declaration.
    ///
    /// A name may repeat across mutually exclusive branches of one gate but
    /// not anywhere else.
    pub fn build(self) -> Result<Schema> {
        let mut seen = HashSet::new();
        check_names(&self.name, &self.items, &mut seen)?;
        Ok(Schema {
            name: self.name,
            items: self.items,
        })
    }
}

fn check_names(schema: &str, items: &[Item], seen: &mut HashSet<String>) -> Result<()> {
    let duplicate = |field: &str| WowDataError::DuplicateField {
        schema: schema.to_string(),
        field: field.to_string(),
    };
    for item in items {
        match item {
            Item::Field(def) => {
                if !seen.insert(def.name.clone()) {
                    return Err(duplicate(&def.name));
                }
            }
            Item::Gate {
                branches,
                otherwise,
            } => {
                let mut declared = HashSet::new();
                for body in branches.iter().map(|(_, body)| body).chain([otherwise]) {
                    let mut path = seen.clone();
                    check_names(schema, body, &mut path)?;
                    declared.extend(path.difference(seen).cloned().collect::<Vec<_>>());
                }
                seen.extend(declared);
            }
        }
    }
    Ok(())
}

pub struct GateBuilder {
    parent: SchemaBuilder,
    branches: Vec<(Predicate, Vec<Item>)>,
}

impl GateBuilder {
    #[must_use]
    pub fn elif(
        mut self,
        predicate: Predicate,
        body: impl FnOnce(SchemaBuilder) -> SchemaBuilder,
    ) -> Self {
        let inner = body(self.parent.nested());
        self.branches.push((predicate, inner.items));
        self
    }

    pub fn otherwise(self, body: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> SchemaBuilder {
        let inner = body(self.parent.nested());
        self.close(inner.items)
    }

    pub fn end(self) -> SchemaBuilder {
        self.close(Vec::new())
    }

    fn close(self, otherwise: Vec<Item>) -> SchemaBuilder {
        let mut parent = self.parent;
        parent.items.push(Item::Gate {
            branches: self.branches,
            otherwise,
        });
        parent
    }
}

/// Types bound to template slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    slots: BTreeMap<Slot, FieldType>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `T0`, `T1`, ... in order.
    pub fn positional(types: impl IntoIterator<Item = FieldType>) -> Self {
        let mut bindings = Self::new();
        for (i, ty) in types.into_iter().enumerate() {
            bindings.slots.insert(Slot::Positional(i), ty);
        }
        bindings
    }

    #[must_use]
    pub fn with(mut self, name: &str, ty: FieldType) -> Self {
        self.slots.insert(Slot::Keyword(name.to_string()), ty);
        self
    }

    pub fn get(&self, slot: &Slot) -> Option<&FieldType> {
        self.slots.get(slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    schema: String,
    bindings: Bindings,
    context: Context,
}

/// Layouts sharing a cache key, told apart by the schema they came from.
type CacheBucket = Vec<(Schema, Arc<Layout>)>;

type LayoutCache = RwLock<HashMap<CacheKey, CacheBucket>>;

fn cache() -> &'static LayoutCache {
    static CACHE: OnceLock<LayoutCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn cached(bucket: Option<&CacheBucket>, schema: &Schema) -> Option<Arc<Layout>> {
    bucket?
        .iter()
        .find(|(declared, _)| declared == schema)
        .map(|(_, layout)| Arc::clone(layout))
}

/// Instantiate `schema` with `bindings` and resolve it under `ctx`.
///
/// Results are cached under `(schema, bindings, ctx)`; a second call with an
/// equal schema and the same bindings and context returns the same `Arc`.
/// Schemas that share a name but differ in their fields get their own
/// layouts.
pub fn layout(schema: &Schema, bindings: &Bindings, ctx: Context) -> Result<Arc<Layout>> {
    let key = CacheKey {
        schema: schema.name.clone(),
        bindings: bindings.clone(),
        context: ctx,
    };
    let found = cached(
        cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key),
        schema,
    );
    if let Some(found) = found {
        return Ok(found);
    }

    let resolved = Arc::new(schema.instantiate(bindings)?.resolve(ctx)?);
    log::trace!(
        "caching layout {} ({} fields, {} bytes) for {:?}",
        resolved.name,
        resolved.fields.len(),
        resolved.size,
        ctx
    );
    let mut guard = cache().write().unwrap_or_else(PoisonError::into_inner);
    let bucket = guard.entry(key).or_default();
    if let Some(raced) = cached(Some(bucket), schema) {
        return Ok(raced);
    }
    bucket.push((schema.clone(), Arc::clone(&resolved)));
    Ok(resolved)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutField {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<Value>,
    pub offset: usize,
    pub size: usize,
}

/// A schema with every gate decided and every slot bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    context: Context,
    fields: Vec<LayoutField>,
    size: usize,
}

impl Layout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    /// Encoded size of one record.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Decode one record. `strings` resolves string-block offsets.
    pub fn read_record<R, F>(self: &Arc<Self>, reader: &mut R, strings: &mut F) -> Result<Record>
    where
        R: Read + Seek,
        F: FnMut(u32) -> Result<String>,
    {
        let values = self
            .fields
            .iter()
            .map(|field| read_value(reader, &field.ty, self.context.version, strings))
            .collect::<Result<Vec<_>>>()?;
        Ok(Record {
            layout: Arc::clone(self),
            values,
        })
    }

    /// Encode one record. `intern` adds a string to the block and returns
    /// its offset.
    pub fn write_record<W, F>(&self, writer: &mut W, record: &Record, intern: &mut F) -> Result<()>
    where
        W: Write,
        F: FnMut(&str) -> u32,
    {
        for (field, value) in self.fields.iter().zip(&record.values) {
            write_value(writer, &field.ty, value, self.context.version, intern)?;
        }
        Ok(())
    }

    /// A record with every field at its default or zero value.
    pub fn new_record(self: &Arc<Self>) -> Record {
        let values = self
            .fields
            .iter()
            .map(|f| {
                f.default
                    .clone()
                    .unwrap_or_else(|| f.ty.zero(self.context.version))
            })
            .collect();
        Record {
            layout: Arc::clone(self),
            values,
        }
    }
}

/// Localized string: one entry per locale, plus the flags word.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LangString {
    pub locales: Vec<String>,
    pub flags: u32,
}

impl LangString {
    pub fn empty(version: ClientVersion) -> Self {
        Self {
            locales: vec![String::new(); lang_locales(version)],
            flags: 0,
        }
    }

    /// First non-empty locale, which is what the client falls back to.
    pub fn text(&self) -> &str {
        self.locales
            .iter()
            .find(|s| !s.is_empty())
            .map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    F32(f32),
    F64(f64),
    Vec2(C2Vector),
    Vec3(C3Vector),
    Quat(Quaternion),
    CompQuat(CompQuat),
    Color(Color),
    BoundingBox(BoundingBox),
    Fixed16(Fixed16),
    String(String),
    LangString(LangString),
    Array(Vec<Value>),
    ArrayRef { count: u32, offset: u32 },
}

impl Value {
    /// Integer view of any integral variant.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match *self {
            Self::U8(v) => v.into(),
            Self::I8(v) => v.into(),
            Self::U16(v) => v.into(),
            Self::I16(v) => v.into(),
            Self::U32(v) => v.into(),
            Self::I32(v) => v.into(),
            Self::U64(v) => v as i64,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::LangString(s) => Some(s.text()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::LangString(s) => write!(f, "{}", s.text()),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            other => match other.as_i64() {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "{other:?}"),
            },
        }
    }
}

/// One decoded record, positionally aligned with its layout's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    layout: Arc<Layout>,
    values: Vec<Value>,
}

impl Record {
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.layout.index_of(name).map(|i| &self.values[i])
    }

    /// Replace a field value. Unknown names are ignored and reported as
    /// `false`.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.layout.index_of(name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.layout
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(&self.values)
    }
}

fn read_value<R, F>(
    reader: &mut R,
    ty: &FieldType,
    version: ClientVersion,
    strings: &mut F,
) -> Result<Value>
where
    R: Read + Seek,
    F: FnMut(u32) -> Result<String>,
{
    Ok(match ty {
        FieldType::U8 => Value::U8(reader.wow_read()?),
        FieldType::I8 => Value::I8(reader.wow_read()?),
        FieldType::U16 => Value::U16(reader.wow_read()?),
        FieldType::I16 => Value::I16(reader.wow_read()?),
        FieldType::U32 => Value::U32(reader.wow_read()?),
        FieldType::I32 => Value::I32(reader.wow_read()?),
        FieldType::U64 => Value::U64(reader.wow_read()?),
        FieldType::F32 => Value::F32(reader.wow_read()?),
        FieldType::F64 => Value::F64(reader.wow_read()?),
        FieldType::Vec2 => Value::Vec2(reader.wow_read()?),
        FieldType::Vec3 => Value::Vec3(reader.wow_read()?),
        FieldType::Quat => Value::Quat(reader.wow_read()?),
        FieldType::CompQuat => Value::CompQuat(reader.wow_read()?),
        FieldType::Color => Value::Color(reader.wow_read()?),
        FieldType::BoundingBox => Value::BoundingBox(reader.wow_read()?),
        FieldType::Fixed16 => Value::Fixed16(reader.wow_read()?),
        FieldType::DbcString => {
            let offset: u32 = reader.wow_read()?;
            Value::String(strings(offset)?)
        }
        FieldType::DbcLangString => {
            let mut locales = Vec::with_capacity(lang_locales(version));
            for _ in 0..lang_locales(version) {
                let offset: u32 = reader.wow_read()?;
                locales.push(strings(offset)?);
            }
            let flags = reader.wow_read()?;
            Value::LangString(LangString { locales, flags })
        }
        FieldType::Fixed(element, count) => Value::Array(
            (0..*count)
                .map(|_| read_value(reader, element, version, strings))
                .collect::<Result<_>>()?,
        ),
        FieldType::ArrayRef(_) => Value::ArrayRef {
            count: reader.wow_read()?,
            offset: reader.wow_read()?,
        },
        FieldType::Slot(slot) => {
            return Err(WowDataError::TemplateUnbound {
                template: String::from("<layout>"),
                slot: slot.to_string(),
            });
        }
    })
}

fn write_value<W, F>(
    writer: &mut W,
    ty: &FieldType,
    value: &Value,
    version: ClientVersion,
    intern: &mut F,
) -> Result<()>
where
    W: Write,
    F: FnMut(&str) -> u32,
{
    let mismatch = || {
        WowDataError::version_mismatch(
            format!("value of type {ty}"),
            format!("{value:?}"),
        )
    };
    match (ty, value) {
        (FieldType::U8, Value::U8(v)) => writer.wow_write(v),
        (FieldType::I8, Value::I8(v)) => writer.wow_write(v),
        (FieldType::U16, Value::U16(v)) => writer.wow_write(v),
        (FieldType::I16, Value::I16(v)) => writer.wow_write(v),
        (FieldType::U32, Value::U32(v)) => writer.wow_write(v),
        (FieldType::I32, Value::I32(v)) => writer.wow_write(v),
        (FieldType::U64, Value::U64(v)) => writer.wow_write(v),
        (FieldType::F32, Value::F32(v)) => writer.wow_write(v),
        (FieldType::F64, Value::F64(v)) => writer.wow_write(v),
        (FieldType::Vec2, Value::Vec2(v)) => writer.wow_write(v),
        (FieldType::Vec3, Value::Vec3(v)) => writer.wow_write(v),
        (FieldType::Quat, Value::Quat(v)) => writer.wow_write(v),
        (FieldType::CompQuat, Value::CompQuat(v)) => writer.wow_write(v),
        (FieldType::Color, Value::Color(v)) => writer.wow_write(v),
        (FieldType::BoundingBox, Value::BoundingBox(v)) => writer.wow_write(v),
        (FieldType::Fixed16, Value::Fixed16(v)) => writer.wow_write(v),
        (FieldType::DbcString, Value::String(s)) => writer.wow_write(&intern(s)),
        (FieldType::DbcLangString, Value::LangString(s)) => {
            let locales = lang_locales(version);
            if s.locales.len() != locales {
                return Err(WowDataError::version_mismatch(
                    format!("{locales} locale strings"),
                    s.locales.len(),
                ));
            }
            for locale in &s.locales {
                writer.wow_write(&intern(locale))?;
            }
            writer.wow_write(&s.flags)
        }
        (FieldType::Fixed(element, count), Value::Array(items)) if items.len() == *count => {
            for item in items {
                write_value(writer, element, item, version, intern)?;
            }
            Ok(())
        }
        (FieldType::ArrayRef(_), Value::ArrayRef { count, offset }) => {
            writer.wow_write(count)?;
            writer.wow_write(offset)
        }
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string_block::{StringBlock, StringPadding};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn track_template() -> Schema {
        Schema::builder("Track")
            .field("interpolation", FieldType::U16)
            .field("global_sequence", FieldType::I16)
            .when(Predicate::VersionBelow(ClientVersion::WotLK), |b| {
                b.field("ranges", FieldType::array_ref(FieldType::fixed(FieldType::U32, 2)))
                    .field("timestamps", FieldType::array_ref(FieldType::U32))
                    .field("values", FieldType::array_ref(FieldType::keyword("values")))
            })
            .otherwise(|b| {
                b.field("timestamps", FieldType::array_ref(FieldType::array_ref(FieldType::U32)))
                    .field(
                        "values",
                        FieldType::array_ref(FieldType::array_ref(FieldType::keyword("values"))),
                    )
            })
            .build()
            .unwrap()
    }

    #[test]
    fn gates_select_fields_per_version() {
        let schema = track_template();
        let bindings = Bindings::new().with("values", FieldType::Vec3);

        let tbc = layout(&schema, &bindings, Context::new(ClientVersion::TBC)).unwrap();
        let names: Vec<_> = tbc.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["interpolation", "global_sequence", "ranges", "timestamps", "values"]
        );
        assert_eq!(tbc.size(), 28);

        let wrath = layout(&schema, &bindings, Context::new(ClientVersion::WotLK)).unwrap();
        assert_eq!(wrath.size(), 20);
        assert_eq!(
            wrath.fields()[3].ty,
            FieldType::array_ref(FieldType::array_ref(FieldType::Vec3))
        );
    }

    #[test]
    fn instantiations_are_cached() {
        let schema = track_template();
        let bindings = Bindings::new().with("values", FieldType::CompQuat);
        let ctx = Context::new(ClientVersion::Legion);
        let a = layout(&schema, &bindings, ctx).unwrap();
        let b = layout(&schema, &bindings, ctx).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unbound_slot_fails() {
        let schema = track_template();
        let err = layout(&schema, &Bindings::new(), Context::new(ClientVersion::TBC)).unwrap_err();
        assert!(matches!(
            err,
            WowDataError::TemplateUnbound { ref slot, .. } if slot == "T[\"values\"]"
        ));

        let positional = Schema::builder("Pair")
            .field("first", FieldType::slot(0))
            .field("second", FieldType::slot(1))
            .build()
            .unwrap();
        let err = positional
            .instantiate(&Bindings::positional([FieldType::U8]))
            .unwrap_err();
        assert!(matches!(err, WowDataError::TemplateUnbound { ref slot, .. } if slot == "T1"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Schema::builder("Row")
            .field("id", FieldType::U32)
            .field("id", FieldType::U16)
            .build()
            .unwrap_err();
        assert!(matches!(err, WowDataError::DuplicateField { ref field, .. } if field == "id"));

        let err = Schema::builder("Row")
            .when(Predicate::FlagsSet(1), |b| b.field("extra", FieldType::U32))
            .end()
            .field("extra", FieldType::U8)
            .build()
            .unwrap_err();
        assert!(matches!(err, WowDataError::DuplicateField { .. }));
    }

    #[test]
    fn flag_gates_and_elif() {
        let schema = Schema::builder("Header")
            .field("flags", FieldType::U32)
            .when(Predicate::FlagsSet(0x8), |b| b.field("combos", FieldType::U32))
            .elif(Predicate::FlagsSet(0x4), |b| b.field("legacy", FieldType::U16))
            .end()
            .build()
            .unwrap();
        let ctx = Context::new(ClientVersion::WotLK);
        assert_eq!(schema.resolve(ctx.with_flags(0x8 | 0x4)).unwrap().size(), 8);
        assert_eq!(schema.resolve(ctx.with_flags(0x4)).unwrap().size(), 6);
        assert_eq!(schema.resolve(ctx).unwrap().size(), 4);
    }

    #[test]
    fn same_name_different_fields_get_their_own_layouts() {
        init_logging();
        let short = Schema::builder("Items")
            .field("id", FieldType::U32)
            .build()
            .unwrap();
        let long = Schema::builder("Items")
            .field("id", FieldType::U32)
            .field("name", FieldType::DbcString)
            .field("price", FieldType::U32)
            .build()
            .unwrap();
        let ctx = Context::new(ClientVersion::WotLK);

        let a = layout(&short, &Bindings::new(), ctx).unwrap();
        let b = layout(&long, &Bindings::new(), ctx).unwrap();
        assert_eq!(a.size(), 4);
        assert_eq!(b.size(), 12);
        assert_eq!(b.fields().len(), 3);
        assert!(Arc::ptr_eq(&a, &layout(&short, &Bindings::new(), ctx).unwrap()));
        assert!(Arc::ptr_eq(&b, &layout(&long, &Bindings::new(), ctx).unwrap()));
    }

    #[test]
    fn lang_string_width_depends_on_version() {
        let schema = Schema::builder("Name")
            .field("name", FieldType::DbcLangString)
            .build()
            .unwrap();
        assert_eq!(schema.resolve(Context::new(ClientVersion::WotLK)).unwrap().size(), 68);
        assert_eq!(schema.resolve(Context::new(ClientVersion::Cataclysm)).unwrap().size(), 8);
    }

    #[test]
    fn records_round_trip_through_a_string_block() {
        let schema = Schema::builder("Creature")
            .field("id", FieldType::U32)
            .field("name", FieldType::DbcString)
            .field_default("scale", FieldType::F32, Value::F32(1.0))
            .build()
            .unwrap();
        let layout = Arc::new(schema.resolve(Context::new(ClientVersion::WotLK)).unwrap());

        let mut record = layout.new_record();
        assert_eq!(record.get("scale"), Some(&Value::F32(1.0)));
        record.set("id", Value::U32(7));
        record.set("name", Value::String("Murloc".into()));

        let mut block = StringBlock::new(StringPadding::None).with_dedup();
        block.add("");
        let mut bytes = Vec::new();
        layout
            .write_record(&mut bytes, &record, &mut |s: &str| block.add(s))
            .unwrap();
        assert_eq!(bytes.len(), layout.size());

        let mut cursor = Cursor::new(bytes);
        let back = layout
            .read_record(&mut cursor, &mut |offset| block.get(offset))
            .unwrap();
        assert_eq!(back, record);
    }
}
