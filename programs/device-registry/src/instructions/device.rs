use anchor_lang::prelude::*;
use crate::{
    constants::Limits,
    errors::RegistryError,
    state::{Attribute, DeviceAdded, DeviceRecord, RegistryHeader},
    storage::{AccountSlot, StorageSlot},
};

/// Append a device to an existing registry.
/// Only the registry owner can add devices; the owner also pays the rent
/// for the extra account space. Returns the new device's index.
pub fn add_device(
    ctx: Context<AddDevice>,
    name: String,
    description: String,
    metadata: Vec<Attribute>,
    data: Vec<Attribute>,
) -> Result<u32> {
    let caller = ctx.accounts.user.key();
    let mut slot = AccountSlot::new(
        ctx.accounts.registry.to_account_info(),
        ctx.accounts.user.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
    );

    let device = DeviceRecord::new(name, description, metadata, data);
    let index = append_device(&mut slot, &caller, &device, &Limits::DEFAULT)?;

    emit!(DeviceAdded {
        registry: ctx.accounts.registry.key(),
        index,
        name: device.name.clone(),
    });
    msg!(
        "Device added: {} -> registry {} (index {}, {} bytes)",
        device.name,
        ctx.accounts.registry.key(),
        index,
        slot.capacity()
    );
    Ok(index)
}

/// Append `device` to the registry stored in `slot`.
///
/// The registry is never decoded or re-encoded: its header is read in
/// place, the slot grows by exactly the record's encoded length, the record
/// is written at the old end and `device_count` is patched. Every check runs
/// before the grow request, and nothing is written unless the grow
/// succeeded, so on error the slot's bytes are unchanged.
pub fn append_device<S: StorageSlot>(
    slot: &mut S,
    caller: &Pubkey,
    device: &DeviceRecord,
    limits: &Limits,
) -> Result<u32> {
    let header = slot.view(RegistryHeader::parse)?;
    header.authorize(caller)?;
    device.validate(limits)?;

    let duplicate = slot.view(|bytes| header.contains_device(bytes, &device.name))?;
    require!(!duplicate, RegistryError::DuplicateDevice);
    let next_count = header
        .device_count
        .checked_add(1)
        .ok_or(RegistryError::CapacityExceeded)?;

    let record_offset = slot.capacity();
    let target_len = record_offset + device.encoded_len();
    if let Err(err) = slot.resize(target_len) {
        msg!("Registry grow to {} bytes denied: {}", target_len, err);
        return err!(RegistryError::CapacityExceeded);
    }

    let mut record = Vec::with_capacity(device.encoded_len());
    device
        .serialize(&mut record)
        .map_err(|_| error!(RegistryError::InvalidLayout))?;
    slot.write_at(record_offset, &record)?;
    slot.write_at(header.device_count_offset, &next_count.to_le_bytes())?;

    Ok(header.device_count)
}

#[derive(Accounts)]
pub struct AddDevice<'info> {
    /// CHECK: owned by this program; decoded and owner-checked by the handler
    #[account(mut, owner = crate::ID)]
    pub registry: UncheckedAccount<'info>,

    /// Registry owner (must sign), pays for the account growth
    #[account(mut)]
    pub user: Signer<'info>,

    pub system_program: Program<'info, System>,
}
