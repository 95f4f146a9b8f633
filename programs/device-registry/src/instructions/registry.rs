use anchor_lang::prelude::*;
use crate::{
    constants::Limits,
    errors::RegistryError,
    state::{Registry, RegistryCreated},
    storage::{AccountSlot, StorageSlot},
};

/// Create a new device registry owned by the signing user.
/// The registry keypair must co-sign so the fresh address is provably
/// controlled by the caller.
pub fn create_registry(ctx: Context<CreateRegistry>, name: String) -> Result<()> {
    let owner = ctx.accounts.user.key();
    let mut slot = AccountSlot::new(
        ctx.accounts.registry.to_account_info(),
        ctx.accounts.user.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
    );

    let registry = initialize_registry(&mut slot, name, owner, &Limits::DEFAULT)?;

    emit!(RegistryCreated {
        registry: ctx.accounts.registry.key(),
        owner,
        name: registry.name.clone(),
    });
    msg!(
        "Registry created: {} ({}) -> {}",
        registry.name,
        ctx.accounts.registry.key(),
        owner
    );
    Ok(())
}

/// Validate `name`, allocate `slot` at the exact encoded size of an empty
/// registry and persist it.
pub fn initialize_registry<S: StorageSlot>(
    slot: &mut S,
    name: String,
    owner: Pubkey,
    limits: &Limits,
) -> Result<Registry> {
    require!(!name.is_empty(), RegistryError::NameEmpty);
    require!(
        name.len() <= limits.max_registry_name_len,
        RegistryError::NameTooLong
    );
    require!(!slot.is_occupied(), RegistryError::AlreadyInitialized);

    let registry = Registry::new(name, owner);
    let bytes = registry.encode()?;
    slot.allocate(bytes.len())?;
    slot.write_at(0, &bytes)?;

    Ok(registry)
}

#[derive(Accounts)]
pub struct CreateRegistry<'info> {
    /// Fresh registry account, created and sized by the instruction
    #[account(mut)]
    pub registry: Signer<'info>,

    /// Registry owner, pays for the account
    #[account(mut)]
    pub user: Signer<'info>,

    pub system_program: Program<'info, System>,
}
