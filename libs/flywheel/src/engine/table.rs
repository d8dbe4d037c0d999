use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ScalarAttributeType,
};

use super::Item;
use crate::common::{FlywheelError, FlywheelResult};

/// Scalar type of a key attribute
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyKind {
    #[default]
    String,
    Number,
    Binary,
}

impl KeyKind {
    fn scalar_type(self) -> ScalarAttributeType {
        match self {
            KeyKind::String => ScalarAttributeType::S,
            KeyKind::Number => ScalarAttributeType::N,
            KeyKind::Binary => ScalarAttributeType::B,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub kind: KeyKind,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Table layout registered with the engine.
///
/// `name` is the logical name; the engine prefixes it with its namespace
/// to get the DynamoDB table name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
}

impl TableSpec {
    /// Table with a string hash key
    pub fn new(name: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash_key: KeyAttribute::new(hash_key, KeyKind::String),
            range_key: None,
        }
    }

    pub fn with_hash_kind(mut self, kind: KeyKind) -> Self {
        self.hash_key.kind = kind;
        self
    }

    pub fn with_range_key(mut self, name: impl Into<String>, kind: KeyKind) -> Self {
        self.range_key = Some(KeyAttribute::new(name, kind));
        self
    }

    /// Hash key first, then the range key if any
    pub fn key_attributes(&self) -> impl Iterator<Item = &KeyAttribute> {
        std::iter::once(&self.hash_key).chain(self.range_key.as_ref())
    }

    pub fn is_key_attribute(&self, attribute: &str) -> bool {
        self.key_attributes().any(|key| key.name == attribute)
    }

    /// Pull the key attributes out of `item`
    pub fn key_of(&self, item: &Item) -> FlywheelResult<Item> {
        self.key_attributes()
            .map(|key| {
                item.get(&key.name)
                    .map(|value| (key.name.clone(), value.clone()))
                    .ok_or_else(|| FlywheelError::MissingKeyAttribute {
                        table: self.name.clone(),
                        attribute: key.name.clone(),
                    })
            })
            .collect()
    }

    /// Non-key attributes of `item`, sorted by name
    pub fn value_attributes<'a>(&self, item: &'a Item) -> Vec<(&'a String, &'a AttributeValue)> {
        let mut values: Vec<_> = item
            .iter()
            .filter(|(name, _)| !self.is_key_attribute(name))
            .collect();
        values.sort_by(|a, b| a.0.cmp(b.0));
        values
    }

    pub(crate) fn key_schema(&self) -> FlywheelResult<Vec<KeySchemaElement>> {
        let mut schema = vec![
            KeySchemaElement::builder()
                .attribute_name(&self.hash_key.name)
                .key_type(KeyType::Hash)
                .build()?,
        ];
        if let Some(range) = &self.range_key {
            schema.push(
                KeySchemaElement::builder()
                    .attribute_name(&range.name)
                    .key_type(KeyType::Range)
                    .build()?,
            );
        }
        Ok(schema)
    }

    pub(crate) fn attribute_definitions(&self) -> FlywheelResult<Vec<AttributeDefinition>> {
        self.key_attributes()
            .map(|key| {
                AttributeDefinition::builder()
                    .attribute_name(&key.name)
                    .attribute_type(key.kind.scalar_type())
                    .build()
                    .map_err(FlywheelError::from)
            })
            .collect()
    }
}
