//! Tuple codec: schema-driven fixed layout for stored records.
//!
//! Layout:
//! [ field_count: u16 ]
//! then per field, little-endian:
//! - `Int32`/`Float32`: 4 bytes
//! - `Int64`/`Float64`: 8 bytes
//! - `Utf8`: [ len: u16 ][ bytes zero-padded to the field's max_len ]
//!
//! Every record of a schema therefore has the same encoded size.

use skyline_core::schema::{DataType, Schema};
use skyline_core::types::{Scalar, Tuple};

use crate::error::{Error, Result};

/// Encoded size of one record of `schema`.
pub fn record_len(schema: &Schema) -> usize {
    2 + schema
        .fields
        .iter()
        .map(|f| match f.data_type.fixed_width() {
            Some(w) => w,
            None => 2 + f.max_len.unwrap_or(0) as usize,
        })
        .sum::<usize>()
}

pub fn encode_tuple(tuple: &Tuple, schema: &Schema) -> Result<Vec<u8>> {
    if tuple.len() != schema.len() {
        return Err(Error::Codec(format!(
            "tuple has {} fields, schema has {}",
            tuple.len(),
            schema.len()
        )));
    }

    let mut out = Vec::with_capacity(record_len(schema));
    out.extend_from_slice(&(schema.len() as u16).to_le_bytes());

    for (i, (value, field)) in tuple.values.iter().zip(&schema.fields).enumerate() {
        match (value, field.data_type) {
            (Scalar::I32(v), DataType::Int32) => out.extend_from_slice(&v.to_le_bytes()),
            (Scalar::I64(v), DataType::Int64) => out.extend_from_slice(&v.to_le_bytes()),
            (Scalar::F32(v), DataType::Float32) => out.extend_from_slice(&v.to_le_bytes()),
            (Scalar::F64(v), DataType::Float64) => out.extend_from_slice(&v.to_le_bytes()),
            (Scalar::Str(s), DataType::Utf8) => {
                let max = field.max_len.unwrap_or(0) as usize;
                let bytes = s.as_bytes();
                if bytes.len() > max {
                    return Err(Error::Codec(format!(
                        "string of {} bytes exceeds field '{}' length {max}",
                        bytes.len(),
                        field.name
                    )));
                }
                out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                out.extend_from_slice(bytes);
                out.resize(out.len() + (max - bytes.len()), 0);
            }
            (v, expected) => {
                return Err(Error::Codec(format!(
                    "field #{i} '{}': expected {:?}, got {:?}",
                    field.name,
                    expected,
                    v.data_type()
                )))
            }
        }
    }
    Ok(out)
}

/// Attach `schema` to a raw record image.
pub fn decode_tuple(bytes: &[u8], schema: &Schema) -> Result<Tuple> {
    let mut reader = Reader { bytes, pos: 0 };
    let count = u16::from_le_bytes(reader.take()?) as usize;
    if count != schema.len() {
        return Err(Error::Codec(format!(
            "record has {count} fields, schema has {}",
            schema.len()
        )));
    }

    let mut values = Vec::with_capacity(count);
    for field in &schema.fields {
        let value = match field.data_type {
            DataType::Int32 => Scalar::I32(i32::from_le_bytes(reader.take()?)),
            DataType::Int64 => Scalar::I64(i64::from_le_bytes(reader.take()?)),
            DataType::Float32 => Scalar::F32(f32::from_le_bytes(reader.take()?)),
            DataType::Float64 => Scalar::F64(f64::from_le_bytes(reader.take()?)),
            DataType::Utf8 => {
                let max = field.max_len.unwrap_or(0) as usize;
                let len = u16::from_le_bytes(reader.take()?) as usize;
                if len > max {
                    return Err(Error::Codec(format!(
                        "field '{}': stored length {len} exceeds {max}",
                        field.name
                    )));
                }
                let padded = reader.slice(max)?;
                let s = std::str::from_utf8(&padded[..len])
                    .map_err(|e| Error::Codec(format!("field '{}': {e}", field.name)))?;
                Scalar::Str(s.to_string())
            }
        };
        values.push(value);
    }

    if reader.pos != bytes.len() {
        return Err(Error::Codec(format!(
            "{} trailing bytes after record",
            bytes.len() - reader.pos
        )));
    }
    Ok(Tuple::new(values))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn slice(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let out = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| Error::Codec(format!("record truncated at byte {}", self.pos)))?;
        self.pos = end;
        Ok(out)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(N)?);
        Ok(out)
    }
}
