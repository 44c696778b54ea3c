//! Export of decoded rows to JSON-compatible serializers and CSV.

use wow_data::schema::Record;
#[cfg(feature = "serde")]
use wow_data::schema::{LangString, Value};

#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, SerializeSeq, SerializeStruct, Serializer};

/// Serializes a record as a map of field name to value.
#[cfg(feature = "serde")]
pub struct RecordView<'a>(pub &'a Record);

#[cfg(feature = "serde")]
impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.values().len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &ValueView(value))?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct ValueView<'a>(&'a Value);

#[cfg(feature = "serde")]
impl Serialize for ValueView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::LangString(s) => LangStringView(s).serialize(serializer),
            Value::Vec2(v) => [v.x, v.y].serialize(serializer),
            Value::Vec3(v) => [v.x, v.y, v.z].serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&ValueView(item))?;
                }
                seq.end()
            }
            other => match other.as_i64() {
                Some(v) => serializer.serialize_i64(v),
                None => serializer.collect_str(other),
            },
        }
    }
}

#[cfg(feature = "serde")]
struct LangStringView<'a>(&'a LangString);

#[cfg(feature = "serde")]
impl Serialize for LangStringView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("LangString", 2)?;
        s.serialize_field("locales", &self.0.locales)?;
        s.serialize_field("flags", &self.0.flags)?;
        s.end()
    }
}

/// Write `records` as CSV with a header row of field names. Localized
/// strings show the client's fallback locale.
#[cfg(feature = "csv_export")]
pub fn write_csv<W: std::io::Write>(records: &[Record], writer: W) -> crate::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    if let Some(first) = records.first() {
        out.write_record(first.iter().map(|(name, _)| name))?;
    }
    for record in records {
        out.write_record(record.values().iter().map(ToString::to_string))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wow_data::schema::{Bindings, Context, FieldType, LangString, Schema, Value, layout};
    use wow_data::version::ClientVersion;

    fn record() -> Record {
        let schema = Schema::builder("ExportSample")
            .field("id", FieldType::U32)
            .field("name", FieldType::DbcLangString)
            .field("scale", FieldType::F32)
            .build()
            .unwrap();
        let cata = Context::new(ClientVersion::Cataclysm);
        let resolved = layout(&schema, &Bindings::new(), cata).unwrap();
        let mut record = resolved.new_record();
        record.set("id", Value::U32(3));
        record.set(
            "name",
            Value::LangString(LangString {
                locales: vec!["Beast".into()],
                flags: 0xFF_FFFE,
            }),
        );
        record.set("scale", Value::F32(1.5));
        record
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_rows() {
        let json = serde_json::to_value(RecordView(&record())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "name": { "locales": ["Beast"], "flags": 0xFF_FFFE },
                "scale": 1.5,
            })
        );
    }

    #[cfg(feature = "csv_export")]
    #[test]
    fn csv_rows() {
        let mut out = Vec::new();
        write_csv(&[record()], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,name,scale\n3,Beast,1.5\n");
    }
}
