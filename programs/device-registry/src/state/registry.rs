use anchor_lang::prelude::*;
use std::io::{Read, Write};
use crate::{
    constants::{LEN_PREFIX, OWNER_ID_LEN},
    errors::RegistryError,
    state::DeviceRecord,
};

/// Registry account.
///
/// Persisted without a discriminator or padding, so the account length is
/// always exactly `encoded_len()`:
///
/// - `name_len: u32`, `name`
/// - `owner_id: [u8; 32]`
/// - `device_count: u32`
/// - `device_count` encoded [`DeviceRecord`]s, in insertion order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    /// Human readable registry name
    pub name: String,

    /// Owner's wallet address, fixed at creation
    owner_id: Pubkey,

    /// Number of devices, always `devices.len()`
    device_count: u32,

    devices: Vec<DeviceRecord>,
}

impl Registry {
    /// Fresh registry with no devices
    pub fn new(name: String, owner_id: Pubkey) -> Self {
        Self {
            name,
            owner_id,
            device_count: 0,
            devices: Vec::new(),
        }
    }

    pub fn owner_id(&self) -> Pubkey {
        self.owner_id
    }

    pub fn device_count(&self) -> u32 {
        self.device_count
    }

    /// Devices in the order they were appended
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn device(&self, name: &str) -> Option<&DeviceRecord> {
        self.devices.iter().find(|device| device.name == name)
    }

    pub fn contains_device(&self, name: &str) -> bool {
        self.device(name).is_some()
    }

    /// Fails with `Unauthorized` unless `caller` is the registry owner
    pub fn authorize(&self, caller: &Pubkey) -> Result<()> {
        authorize_owner(&self.owner_id, caller)
    }

    /// Exact encoded size of the registry
    pub fn encoded_len(&self) -> usize {
        LEN_PREFIX
            + self.name.len()
            + OWNER_ID_LEN
            + LEN_PREFIX
            + self
                .devices
                .iter()
                .map(DeviceRecord::encoded_len)
                .sum::<usize>()
    }

    /// Encoded size once `device` is appended
    pub fn encoded_len_with(&self, device: &DeviceRecord) -> usize {
        self.encoded_len() + device.encoded_len()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.serialize(&mut bytes)
            .map_err(|_| error!(RegistryError::InvalidLayout))?;
        Ok(bytes)
    }

    /// Decode a registry that occupies the whole of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::try_from_slice(bytes).map_err(|_| error!(RegistryError::InvalidLayout))
    }

    /// Read-only snapshot of an on-chain registry account
    pub fn fetch(account: &AccountInfo) -> Result<Self> {
        require_keys_eq!(
            *account.owner,
            crate::ID,
            anchor_lang::error::ErrorCode::AccountOwnedByWrongProgram
        );
        let data = account.try_borrow_data()?;
        Self::decode(&data[..])
    }

    /// In-memory append, used to build expected states; on-chain appends
    /// go through `append_device`, which patches the account in place.
    #[cfg(test)]
    pub(crate) fn push_device(&mut self, device: DeviceRecord) -> u32 {
        let index = self.device_count;
        self.devices.push(device);
        self.device_count += 1;
        index
    }
}

fn authorize_owner(owner_id: &Pubkey, caller: &Pubkey) -> Result<()> {
    require_keys_eq!(*caller, *owner_id, RegistryError::Unauthorized);
    Ok(())
}

/// Fixed-position fields of an encoded registry, read in place.
///
/// Appends patch the account through this instead of decoding it, so the
/// heap cost of an append does not grow with the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryHeader {
    pub owner_id: Pubkey,
    pub device_count: u32,
    /// Byte offset of `device_count` in the account
    pub device_count_offset: usize,
}

impl RegistryHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        cursor.str()?;
        let owner_id = Pubkey::new_from_array(cursor.array()?);
        let device_count_offset = cursor.pos;
        let device_count = cursor.u32()?;

        Ok(Self {
            owner_id,
            device_count,
            device_count_offset,
        })
    }

    pub fn authorize(&self, caller: &Pubkey) -> Result<()> {
        authorize_owner(&self.owner_id, caller)
    }

    /// Walk the device records of `bytes` looking for `name`.
    ///
    /// A full walk also checks that the records end exactly at the end of
    /// the account.
    pub fn contains_device(&self, bytes: &[u8], name: &str) -> Result<bool> {
        let mut cursor = Cursor::new(bytes);
        cursor.pos = self.device_count_offset + LEN_PREFIX;

        for _ in 0..self.device_count {
            if cursor.str()? == name {
                return Ok(true);
            }
            cursor.str()?;
            for _ in 0..2 {
                let pairs = cursor.u32()?;
                for _ in 0..pairs {
                    cursor.str()?;
                    cursor.str()?;
                }
            }
        }

        require_eq!(cursor.pos, bytes.len(), RegistryError::InvalidLayout);
        Ok(false)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(RegistryError::InvalidLayout)?;
        let taken = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(taken)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn str(&mut self) -> Result<&'a str> {
        let len = self.u32()? as usize;
        std::str::from_utf8(self.take(len)?).map_err(|_| error!(RegistryError::InvalidLayout))
    }
}

impl AnchorSerialize for Registry {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name.serialize(writer)?;
        writer.write_all(&self.owner_id.to_bytes())?;
        self.device_count.serialize(writer)?;
        for device in &self.devices {
            device.serialize(writer)?;
        }
        Ok(())
    }
}

impl AnchorDeserialize for Registry {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let name = String::deserialize_reader(reader)?;
        let owner_id = Pubkey::new_from_array(<[u8; OWNER_ID_LEN]>::deserialize_reader(reader)?);
        let device_count = u32::deserialize_reader(reader)?;

        // The count is untrusted until every record has been read.
        let mut devices = Vec::new();
        for _ in 0..device_count {
            devices.push(DeviceRecord::deserialize_reader(reader)?);
        }

        Ok(Self {
            name,
            owner_id,
            device_count,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;
    use crate::state::Attribute;

    fn sensor(name: &str) -> DeviceRecord {
        DeviceRecord::new(
            name.to_string(),
            "Sensor de Oficina".to_string(),
            vec![Attribute::new("marca", "Solana"), Attribute::new("modelo", "2024")],
            vec![Attribute::new("estado", "activo"), Attribute::new("bateria", "80%")],
        )
    }

    fn populated(owner: Pubkey) -> Registry {
        let mut registry = Registry::new("Registro 1".to_string(), owner);
        registry.push_device(sensor("Sensor"));
        registry.push_device(DeviceRecord::new(
            "Gateway".to_string(),
            String::new(),
            vec![],
            vec![Attribute::new("uptime", "")],
        ));
        registry
    }

    #[test]
    fn empty_registry_layout() {
        let owner = Pubkey::new_unique();
        let registry = Registry::new("abc".to_string(), owner);
        let bytes = registry.encode().unwrap();

        assert_eq!(bytes.len(), 4 + 3 + 32 + 4);
        assert_eq!(&bytes[..4], &3u32.to_le_bytes());
        assert_eq!(&bytes[4..7], b"abc");
        assert_eq!(&bytes[7..39], &owner.to_bytes());
        assert_eq!(&bytes[39..], &0u32.to_le_bytes());
    }

    #[test]
    fn devices_follow_header_without_list_prefix() {
        let owner = Pubkey::new_unique();
        let mut registry = Registry::new("r".to_string(), owner);
        let device = sensor("Sensor");
        let index = registry.push_device(device.clone());
        assert_eq!(index, 0);

        let bytes = registry.encode().unwrap();
        let header = 4 + 1 + 32;
        assert_eq!(&bytes[header..header + 4], &1u32.to_le_bytes());

        let mut device_bytes = Vec::new();
        device.serialize(&mut device_bytes).unwrap();
        assert_eq!(&bytes[header + 4..], device_bytes.as_slice());
    }

    #[test]
    fn encoded_len_is_exact() {
        let registry = populated(Pubkey::new_unique());
        assert_eq!(registry.encoded_len(), registry.encode().unwrap().len());

        let next = sensor("Another");
        let mut grown = registry.clone();
        grown.push_device(next.clone());
        assert_eq!(registry.encoded_len_with(&next), grown.encode().unwrap().len());
    }

    #[test]
    fn decode_restores_encoded_registry() {
        let registry = populated(Pubkey::new_unique());
        let decoded = Registry::decode(&registry.encode().unwrap()).unwrap();

        assert_eq!(decoded, registry);
        assert_eq!(decoded.device_count(), 2);
        assert_eq!(decoded.devices()[0].name, "Sensor");
        assert_eq!(decoded.devices()[1].name, "Gateway");
    }

    #[test]
    fn decode_restores_varied_shapes() {
        let limits = crate::constants::Limits::DEFAULT;
        let full_list = |prefix: &str| -> Vec<Attribute> {
            (0..limits.max_attributes)
                .map(|i| {
                    Attribute::new(
                        format!("{prefix}{i}"),
                        "v".repeat(limits.max_value_len),
                    )
                })
                .collect()
        };

        let mut widest = Registry::new(
            "r".repeat(limits.max_registry_name_len),
            Pubkey::new_unique(),
        );
        widest.push_device(DeviceRecord::new(
            "d".repeat(limits.max_device_name_len),
            "x".repeat(limits.max_description_len),
            full_list("meta"),
            full_list("data"),
        ));

        let mut unicode = Registry::new("Registro ñandú 🛰".to_string(), Pubkey::new_unique());
        unicode.push_device(DeviceRecord::new(
            "Sensor 温度".to_string(),
            "Dispositivo de medición".to_string(),
            vec![Attribute::new("ubicación", "Bogotá")],
            vec![Attribute::new("estado", "✓")],
        ));
        unicode.push_device(DeviceRecord::new(
            "vacío".to_string(),
            String::new(),
            vec![],
            vec![],
        ));

        let mut many = Registry::new("many".to_string(), Pubkey::default());
        for i in 0..40 {
            many.push_device(sensor(&format!("sensor-{i}")));
        }

        let shapes = [
            Registry::new("r".to_string(), Pubkey::new_unique()),
            widest,
            unicode,
            many,
            populated(Pubkey::new_unique()),
        ];

        for registry in shapes {
            let bytes = registry.encode().unwrap();
            assert_eq!(bytes.len(), registry.encoded_len());
            assert_eq!(Registry::decode(&bytes).unwrap(), registry);

            let header = RegistryHeader::parse(&bytes).unwrap();
            assert_eq!(header.owner_id, registry.owner_id());
            assert_eq!(header.device_count, registry.device_count());
            assert_eq!(header.device_count_offset, 4 + registry.name.len() + 32);
        }
    }

    #[test]
    fn header_scan_finds_devices_in_place() {
        let owner = Pubkey::new_unique();
        let registry = populated(owner);
        let bytes = registry.encode().unwrap();
        let header = RegistryHeader::parse(&bytes).unwrap();

        assert!(header.authorize(&owner).is_ok());
        assert_eq!(
            header.authorize(&Pubkey::new_unique()).unwrap_err(),
            Error::from(RegistryError::Unauthorized)
        );
        assert!(header.contains_device(&bytes, "Sensor").unwrap());
        assert!(header.contains_device(&bytes, "Gateway").unwrap());
        assert!(!header.contains_device(&bytes, "Sensor 2").unwrap());
    }

    #[test]
    fn header_scan_rejects_inconsistent_lengths() {
        let mut bytes = populated(Pubkey::new_unique()).encode().unwrap();
        bytes.push(0);
        let header = RegistryHeader::parse(&bytes).unwrap();
        assert_eq!(
            header.contains_device(&bytes, "missing").unwrap_err(),
            Error::from(RegistryError::InvalidLayout)
        );

        bytes.truncate(bytes.len() - 3);
        assert_eq!(
            header.contains_device(&bytes, "missing").unwrap_err(),
            Error::from(RegistryError::InvalidLayout)
        );
        assert_eq!(
            RegistryHeader::parse(&bytes[..20]).unwrap_err(),
            Error::from(RegistryError::InvalidLayout)
        );
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = populated(Pubkey::new_unique()).encode().unwrap();
        bytes.push(0);
        assert_eq!(
            Registry::decode(&bytes).unwrap_err(),
            Error::from(RegistryError::InvalidLayout)
        );
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let bytes = populated(Pubkey::new_unique()).encode().unwrap();
        for len in [0, 3, 20, 40, bytes.len() - 1] {
            assert_eq!(
                Registry::decode(&bytes[..len]).unwrap_err(),
                Error::from(RegistryError::InvalidLayout)
            );
        }
    }

    #[test]
    fn decode_rejects_count_without_records() {
        let mut bytes = Registry::new("r".to_string(), Pubkey::new_unique())
            .encode()
            .unwrap();
        let count_at = bytes.len() - 4;
        bytes[count_at..].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            Registry::decode(&bytes).unwrap_err(),
            Error::from(RegistryError::InvalidLayout)
        );
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let mut bytes = Registry::new("ab".to_string(), Pubkey::new_unique())
            .encode()
            .unwrap();
        bytes[4] = 0xff;
        assert_eq!(
            Registry::decode(&bytes).unwrap_err(),
            Error::from(RegistryError::InvalidLayout)
        );
    }

    #[test]
    fn authorize_requires_exact_owner() {
        let owner = Pubkey::new_unique();
        let registry = populated(owner);

        assert!(registry.authorize(&owner).is_ok());
        assert_eq!(
            registry.authorize(&Pubkey::new_unique()).unwrap_err(),
            Error::from(RegistryError::Unauthorized)
        );
        assert_eq!(
            registry.authorize(&Pubkey::default()).unwrap_err(),
            Error::from(RegistryError::Unauthorized)
        );
    }

    #[test]
    fn fetch_reads_program_owned_accounts_only() {
        let key = Pubkey::new_unique();
        let registry = populated(Pubkey::new_unique());
        let mut data = registry.encode().unwrap();
        let mut lamports = 1_000_000;

        let owner = crate::ID;
        let account =
            AccountInfo::new(&key, false, true, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(Registry::fetch(&account).unwrap(), registry);

        let mut data = registry.encode().unwrap();
        let mut lamports = 1_000_000;
        let foreign = Pubkey::new_unique();
        let account =
            AccountInfo::new(&key, false, true, &mut lamports, &mut data, &foreign, false, 0);
        assert_eq!(
            Registry::fetch(&account).unwrap_err(),
            Error::from(anchor_lang::error::ErrorCode::AccountOwnedByWrongProgram)
        );
    }

    #[test]
    fn looks_up_devices_by_name() {
        let registry = populated(Pubkey::new_unique());
        assert!(registry.contains_device("Gateway"));
        assert!(!registry.contains_device("gateway"));
        assert_eq!(registry.device("Sensor").unwrap().metadata.len(), 2);
    }
}
