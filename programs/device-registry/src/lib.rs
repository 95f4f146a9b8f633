use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod instructions;
pub mod state;
pub mod storage;

pub use instructions::*;
use state::Attribute;

declare_id!("A5i8uPKdCycDG3nbGCCAUiLzHEc4ddpfeYGQhPEWuaTJ");

#[program]
pub mod device_registry {
    use super::*;

    /// Create a registry account owned by the signing user
    pub fn create_registry(ctx: Context<CreateRegistry>, name: String) -> Result<()> {
        instructions::create_registry(ctx, name)
    }

    /// Append a device with its metadata and data attributes
    /// Only the registry owner can call this; returns the device index
    pub fn add_device(
        ctx: Context<AddDevice>,
        name: String,
        description: String,
        metadata: Vec<Attribute>,
        data: Vec<Attribute>,
    ) -> Result<u32> {
        instructions::add_device(ctx, name, description, metadata, data)
    }
}
