use anchor_lang::prelude::*;
use anchor_lang::solana_program::entrypoint::MAX_PERMITTED_DATA_INCREASE;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};
use crate::errors::RegistryError;

/// Fixed-capacity storage holding one registry's bytes.
///
/// Capacity only changes through `allocate` and `resize`. Reads borrow the
/// stored bytes in place; on-chain heap is too small to copy a large
/// registry.
pub trait StorageSlot {
    /// Whether the slot already holds state
    fn is_occupied(&self) -> bool;

    /// Current size in bytes
    fn capacity(&self) -> usize;

    /// Create the slot with exactly `len` bytes
    fn allocate(&mut self, len: usize) -> Result<()>;

    /// Resize to exactly `len` bytes
    fn resize(&mut self, len: usize) -> Result<()>;

    /// Run `f` over the stored bytes
    fn view<T>(&self, f: impl FnOnce(&[u8]) -> Result<T>) -> Result<T>;

    /// Overwrite `bytes.len()` bytes starting at `offset`, within capacity
    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()>;
}

fn write_range(data: &mut [u8], offset: usize, bytes: &[u8]) -> Result<()> {
    let end = offset
        .checked_add(bytes.len())
        .filter(|end| *end <= data.len())
        .ok_or(RegistryError::CapacityMismatch)?;
    data[offset..end].copy_from_slice(bytes);
    Ok(())
}

/// Registry slot backed by a Solana account owned by this program.
///
/// `payer` funds the rent-exempt balance on creation and every top-up
/// needed when the account grows.
pub struct AccountSlot<'info> {
    account: AccountInfo<'info>,
    payer: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
}

impl<'info> AccountSlot<'info> {
    pub fn new(
        account: AccountInfo<'info>,
        payer: AccountInfo<'info>,
        system_program: AccountInfo<'info>,
    ) -> Self {
        Self {
            account,
            payer,
            system_program,
        }
    }

    fn top_up_rent(&self, len: usize) -> Result<()> {
        let required = Rent::get()?.minimum_balance(len);
        let shortfall = required.saturating_sub(self.account.lamports());
        if shortfall == 0 {
            return Ok(());
        }

        require!(
            self.payer.lamports() >= shortfall,
            RegistryError::CapacityExceeded
        );
        system_program::transfer(
            CpiContext::new(
                self.system_program.clone(),
                Transfer {
                    from: self.payer.clone(),
                    to: self.account.clone(),
                },
            ),
            shortfall,
        )
    }
}

impl<'info> StorageSlot for AccountSlot<'info> {
    /// A System-owned account without data is free even if someone has
    /// already sent lamports to its address.
    fn is_occupied(&self) -> bool {
        !self.account.data_is_empty() || *self.account.owner != System::id()
    }

    fn capacity(&self) -> usize {
        self.account.data_len()
    }

    fn allocate(&mut self, len: usize) -> Result<()> {
        require!(!self.is_occupied(), RegistryError::AlreadyInitialized);

        if self.account.lamports() == 0 {
            let lamports = Rent::get()?.minimum_balance(len);
            return system_program::create_account(
                CpiContext::new(
                    self.system_program.clone(),
                    CreateAccount {
                        from: self.payer.clone(),
                        to: self.account.clone(),
                    },
                ),
                lamports,
                len as u64,
                &crate::ID,
            );
        }

        // Pre-funded address: create_account refuses it, so fund, size and
        // assign it in separate steps.
        self.top_up_rent(len)?;
        system_program::allocate(
            CpiContext::new(
                self.system_program.clone(),
                Allocate {
                    account_to_allocate: self.account.clone(),
                },
            ),
            len as u64,
        )?;
        system_program::assign(
            CpiContext::new(
                self.system_program.clone(),
                Assign {
                    account_to_assign: self.account.clone(),
                },
            ),
            &crate::ID,
        )
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        let current = self.capacity();
        require!(
            len.saturating_sub(current) <= MAX_PERMITTED_DATA_INCREASE,
            RegistryError::CapacityExceeded
        );

        self.top_up_rent(len)?;
        self.account.realloc(len, false)?;
        Ok(())
    }

    fn view<T>(&self, f: impl FnOnce(&[u8]) -> Result<T>) -> Result<T> {
        let data = self.account.try_borrow_data()?;
        f(&data[..])
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let mut data = self.account.try_borrow_mut_data()?;
        write_range(&mut data[..], offset, bytes)
    }
}

/// In-memory slot for exercising the registry core off-chain
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySlot {
    data: Option<Vec<u8>>,
    max_capacity: Option<usize>,
    resize_requests: usize,
}

#[cfg(test)]
impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny any resize above `max_capacity` bytes
    pub fn with_max_capacity(max_capacity: usize) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            ..Self::default()
        }
    }

    /// Deny every further growth of the slot
    pub fn freeze_capacity(&mut self) {
        self.max_capacity = Some(self.capacity());
    }

    pub fn resize_requests(&self) -> usize {
        self.resize_requests
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    fn check_capacity(&self, len: usize) -> Result<()> {
        if let Some(max) = self.max_capacity {
            require!(len <= max, RegistryError::CapacityExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
impl StorageSlot for MemorySlot {
    fn is_occupied(&self) -> bool {
        self.data.is_some()
    }

    fn capacity(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    fn allocate(&mut self, len: usize) -> Result<()> {
        require!(!self.is_occupied(), RegistryError::AlreadyInitialized);
        self.check_capacity(len)?;
        self.data = Some(vec![0; len]);
        Ok(())
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        self.resize_requests += 1;
        self.check_capacity(len)?;
        let data = self
            .data
            .as_mut()
            .ok_or_else(|| error!(RegistryError::InvalidLayout))?;
        data.resize(len, 0);
        Ok(())
    }

    fn view<T>(&self, f: impl FnOnce(&[u8]) -> Result<T>) -> Result<T> {
        f(self.bytes())
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let data = self
            .data
            .as_mut()
            .ok_or_else(|| error!(RegistryError::CapacityMismatch))?;
        write_range(data, offset, bytes)
    }
}
