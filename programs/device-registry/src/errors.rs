use anchor_lang::prelude::*;

#[error_code]
pub enum RegistryError {
    #[msg("Name cannot be empty")]
    NameEmpty,

    #[msg("Name is too long")]
    NameTooLong,

    #[msg("Device description is too long (max 128 bytes)")]
    DescriptionTooLong,

    #[msg("Too many attributes (max 16 per list)")]
    TooManyAttributes,

    #[msg("Attribute key cannot be empty")]
    AttributeKeyEmpty,

    #[msg("Attribute key is too long (max 32 bytes)")]
    AttributeKeyTooLong,

    #[msg("Attribute value is too long (max 64 bytes)")]
    AttributeValueTooLong,

    #[msg("Unauthorized: You are not the owner of this registry")]
    Unauthorized,

    #[msg("Registry account is already initialized")]
    AlreadyInitialized,

    #[msg("Registry account could not grow to the required size")]
    CapacityExceeded,

    #[msg("A device with this name already exists in the registry")]
    DuplicateDevice,

    #[msg("Registry account data does not match the expected layout")]
    InvalidLayout,

    #[msg("Encoded registry length does not match the account capacity")]
    CapacityMismatch,
}
