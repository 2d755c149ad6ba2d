//! Logical schema types. Pure data.
//!
//! String fields are fixed-width on disk, so every `Utf8` field carries the
//! maximum byte length it may hold.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
}

impl DataType {
    /// Encoded width for numeric types; `None` for strings.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            DataType::Int32 | DataType::Float32 => Some(4),
            DataType::Int64 | DataType::Float64 => Some(8),
            DataType::Utf8 => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    /// Maximum encoded byte length (strings only).
    pub max_len: Option<u16>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            max_len: None,
        }
    }

    pub fn utf8(name: impl Into<String>, max_len: u16) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Utf8,
            max_len: Some(max_len),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from positional attribute types and the byte lengths of
    /// the string attributes, consumed in order of appearance. Fields are
    /// named `c0`, `c1`, ...
    pub fn from_attr_types(types: &[DataType], str_sizes: &[u16]) -> Result<Self> {
        let mut sizes = str_sizes.iter();
        let mut fields = Vec::with_capacity(types.len());
        for (i, ty) in types.iter().enumerate() {
            let name = format!("c{i}");
            match ty {
                DataType::Utf8 => {
                    let len = sizes.next().ok_or_else(|| {
                        Error::Schema(format!("missing string length for attribute {i}"))
                    })?;
                    fields.push(Field::utf8(name, *len));
                }
                other => fields.push(Field::new(name, *other)),
            }
        }
        if sizes.next().is_some() {
            return Err(Error::Schema(
                "more string lengths than string attributes".into(),
            ));
        }
        let schema = Self { fields };
        schema.validate()?;
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check that the schema can be laid out as a record.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::Schema("schema has no fields".into()));
        }
        if self.fields.len() > u16::MAX as usize {
            return Err(Error::Schema(format!(
                "too many fields: {}",
                self.fields.len()
            )));
        }
        for (i, f) in self.fields.iter().enumerate() {
            match (f.data_type, f.max_len) {
                (DataType::Utf8, None) => {
                    return Err(Error::Schema(format!(
                        "string field '{}' (#{i}) has no max length",
                        f.name
                    )))
                }
                (DataType::Utf8, Some(_)) => {}
                (_, Some(_)) => {
                    return Err(Error::Schema(format!(
                        "numeric field '{}' (#{i}) must not carry a max length",
                        f.name
                    )))
                }
                (_, None) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_attr_types_assigns_string_lengths_in_order() {
        let schema = Schema::from_attr_types(
            &[DataType::Int32, DataType::Utf8, DataType::Float64, DataType::Utf8],
            &[10, 32],
        )
        .unwrap();

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.fields[1].max_len, Some(10));
        assert_eq!(schema.fields[3].max_len, Some(32));
        assert_eq!(schema.fields[2].max_len, None);
        assert_eq!(schema.index_of("c2"), Some(2));
    }

    #[test]
    fn from_attr_types_rejects_length_count_mismatch() {
        assert!(Schema::from_attr_types(&[DataType::Utf8], &[]).is_err());
        assert!(Schema::from_attr_types(&[DataType::Int64], &[4]).is_err());
    }

    #[test]
    fn validate_rejects_empty_schema() {
        assert!(Schema::new(vec![]).validate().is_err());
    }

    #[test]
    fn serde_roundtrip_preserves_lengths() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64), Field::utf8("name", 8)]);
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
