/// Maximum registry name length in bytes
pub const MAX_REGISTRY_NAME_LEN: usize = 64;

/// Maximum device name length in bytes (device names key the registry's list)
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// Maximum device description length in bytes
pub const MAX_DESCRIPTION_LEN: usize = 128;

/// Maximum number of pairs in each of a device's metadata and data lists
pub const MAX_ATTRIBUTES: usize = 16;

/// Maximum attribute key length in bytes
pub const MAX_KEY_LEN: usize = 32;

/// Maximum attribute value length in bytes
pub const MAX_VALUE_LEN: usize = 64;

/// Width of every length and count prefix in the account layout (u32 LE)
pub const LEN_PREFIX: usize = 4;

/// Width of the owner public key in the account layout
pub const OWNER_ID_LEN: usize = 32;

/// Bounds applied by the registry core when validating input.
///
/// Growth of a registry account is linear in every one of these, so they
/// keep the size of the next append computable before any storage request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_registry_name_len: usize,
    pub max_device_name_len: usize,
    pub max_description_len: usize,
    pub max_attributes: usize,
    pub max_key_len: usize,
    pub max_value_len: usize,
}

impl Limits {
    pub const DEFAULT: Self = Self {
        max_registry_name_len: MAX_REGISTRY_NAME_LEN,
        max_device_name_len: MAX_DEVICE_NAME_LEN,
        max_description_len: MAX_DESCRIPTION_LEN,
        max_attributes: MAX_ATTRIBUTES,
        max_key_len: MAX_KEY_LEN,
        max_value_len: MAX_VALUE_LEN,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
