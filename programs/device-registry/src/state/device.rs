use anchor_lang::prelude::*;
use crate::{
    constants::{Limits, LEN_PREFIX},
    errors::RegistryError,
};

/// A single key-value pair of a device's metadata or data list
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encoded size: key_len, key, val_len, val
    pub fn encoded_len(&self) -> usize {
        LEN_PREFIX + self.key.len() + LEN_PREFIX + self.value.len()
    }

    fn validate(&self, limits: &Limits) -> Result<()> {
        require!(!self.key.is_empty(), RegistryError::AttributeKeyEmpty);
        require!(
            self.key.len() <= limits.max_key_len,
            RegistryError::AttributeKeyTooLong
        );
        require!(
            self.value.len() <= limits.max_value_len,
            RegistryError::AttributeValueTooLong
        );
        Ok(())
    }
}

/// Device record stored inside a registry account.
///
/// Immutable once appended. The derived encoding is the per-device section
/// of the account layout:
/// `name_len, name, desc_len, description, metadata_count, pairs*,
/// data_count, pairs*`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Device name, unique within its registry
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Descriptive attributes (brand, model, ...)
    pub metadata: Vec<Attribute>,

    /// State attributes (status, battery, ...)
    pub data: Vec<Attribute>,
}

impl DeviceRecord {
    pub fn new(
        name: String,
        description: String,
        metadata: Vec<Attribute>,
        data: Vec<Attribute>,
    ) -> Self {
        Self {
            name,
            description,
            metadata,
            data,
        }
    }

    /// Exact number of bytes this record adds to a registry account
    pub fn encoded_len(&self) -> usize {
        LEN_PREFIX
            + self.name.len()
            + LEN_PREFIX
            + self.description.len()
            + attributes_len(&self.metadata)
            + attributes_len(&self.data)
    }

    /// Check every bounded field against `limits`
    pub fn validate(&self, limits: &Limits) -> Result<()> {
        require!(!self.name.is_empty(), RegistryError::NameEmpty);
        require!(
            self.name.len() <= limits.max_device_name_len,
            RegistryError::NameTooLong
        );
        require!(
            self.description.len() <= limits.max_description_len,
            RegistryError::DescriptionTooLong
        );

        for list in [&self.metadata, &self.data] {
            require!(
                list.len() <= limits.max_attributes,
                RegistryError::TooManyAttributes
            );
            for attribute in list.iter() {
                attribute.validate(limits)?;
            }
        }

        Ok(())
    }
}

fn attributes_len(attributes: &[Attribute]) -> usize {
    LEN_PREFIX + attributes.iter().map(Attribute::encoded_len).sum::<usize>()
}
