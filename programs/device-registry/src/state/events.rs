use anchor_lang::prelude::*;

/// Event emitted when a registry account is created
#[event]
pub struct RegistryCreated {
    /// Registry account address
    pub registry: Pubkey,

    /// Owner recorded in the registry
    pub owner: Pubkey,

    pub name: String,
}

/// Event emitted when a device is appended to a registry
#[event]
pub struct DeviceAdded {
    /// Registry account address
    pub registry: Pubkey,

    /// Position of the device in the registry, starting at 0
    pub index: u32,

    /// Device name
    pub name: String,
}
