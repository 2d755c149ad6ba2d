//! Heap page layout.
//!
//! Layout on storage:
//! [ magic: u32 ][ version: u16 ][ codec: u8 ][ reserved: u8 ]
//! [ slot_count: u32 ][ payload_len: u32 ][ checksum: 32 bytes ]
//! [ payload bytes … ]
//!
//! The payload (before compression) is a run of slots:
//! [ live: u8 ][ len: u32 ][ record bytes … ]
//!
//! The checksum is blake3 over (first 16 header bytes || payload).

use skyline_core::id::SlotId;

use crate::codec::{self, Codec};
use crate::error::{Error, Result};

pub const MAGIC: u32 = 0x534B_5950; // "SKYP"
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 4 + 4 + 32;
const CHECKED_HEADER_LEN: usize = HEADER_LEN - 32;
const SLOT_HEADER_LEN: usize = 1 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub magic: u32,
    pub version: u16,
    pub codec: Codec,
    pub slot_count: u32,
    pub payload_len: u32,
    pub checksum: [u8; 32],
}

impl PageHeader {
    fn new(codec: Codec, slot_count: u32, payload: &[u8]) -> Result<Self> {
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| Error::Codec(format!("page payload too large: {}", payload.len())))?;
        let mut header = Self {
            magic: MAGIC,
            version: VERSION,
            codec,
            slot_count,
            payload_len,
            checksum: [0u8; 32],
        };
        header.checksum = header.compute_checksum(payload);
        Ok(header)
    }

    fn checked_bytes(&self) -> [u8; CHECKED_HEADER_LEN] {
        let mut out = [0u8; CHECKED_HEADER_LEN];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out[6] = self.codec as u8;
        // out[7] reserved
        out[8..12].copy_from_slice(&self.slot_count.to_le_bytes());
        out[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        out
    }

    fn compute_checksum(&self, payload: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.checked_bytes());
        hasher.update(payload);
        hasher.finalize().into()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.checked_bytes());
        out.extend_from_slice(&self.checksum);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Storage("short page header".into()));
        }
        let magic = read_u32(bytes, 0)?;
        let version = read_u16(bytes, 4)?;
        if magic != MAGIC || version != VERSION {
            return Err(Error::Storage("bad page magic/version".into()));
        }
        let codec = Codec::from_u8(bytes[6])?;
        let slot_count = read_u32(bytes, 8)?;
        let payload_len = read_u32(bytes, 12)?;
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&bytes[CHECKED_HEADER_LEN..HEADER_LEN]);
        Ok(Self {
            magic,
            version,
            codec,
            slot_count,
            payload_len,
            checksum,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub live: bool,
    pub bytes: Vec<u8>,
}

/// In-memory image of one heap page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    slots: Vec<Slot>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, tombstones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<SlotId> {
        let slot = u16::try_from(self.slots.len())
            .map_err(|_| Error::Storage("page slot directory full".into()))?;
        self.slots.push(Slot {
            live: true,
            bytes: bytes.to_vec(),
        });
        Ok(SlotId::new(slot))
    }

    pub fn get(&self, slot: SlotId) -> Option<&[u8]> {
        self.slots
            .get(slot.get() as usize)
            .filter(|s| s.live)
            .map(|s| s.bytes.as_slice())
    }

    /// Tombstone a slot. Returns false if it was missing or already dead.
    pub fn tombstone(&mut self, slot: SlotId) -> bool {
        match self.slots.get_mut(slot.get() as usize) {
            Some(s) if s.live => {
                s.live = false;
                s.bytes.clear();
                true
            }
            _ => false,
        }
    }

    /// Live slots in slot order.
    pub fn live_slots(&self) -> impl Iterator<Item = (SlotId, &[u8])> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.live)
            .map(|(i, s)| (SlotId::new(i as u16), s.bytes.as_slice()))
    }

    pub fn encode(&self, codec: Codec) -> Result<Vec<u8>> {
        let raw_len: usize = self
            .slots
            .iter()
            .map(|s| SLOT_HEADER_LEN + s.bytes.len())
            .sum();
        let mut raw = Vec::with_capacity(raw_len);
        for slot in &self.slots {
            let len = u32::try_from(slot.bytes.len())
                .map_err(|_| Error::Codec(format!("record too large: {}", slot.bytes.len())))?;
            raw.push(slot.live as u8);
            raw.extend_from_slice(&len.to_le_bytes());
            raw.extend_from_slice(&slot.bytes);
        }

        let payload = codec::compress(codec, &raw)?;
        let header = PageHeader::new(codec, self.slots.len() as u32, &payload)?;

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode a page image, verifying its checksum. `origin` names the page in
    /// error messages.
    pub fn decode(bytes: &[u8], origin: &str) -> Result<Self> {
        let header = PageHeader::from_bytes(bytes)?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != header.payload_len as usize {
            return Err(Error::Storage(format!(
                "{origin}: payload length {} does not match header {}",
                payload.len(),
                header.payload_len
            )));
        }
        if header.compute_checksum(payload) != header.checksum {
            return Err(Error::ChecksumMismatch(origin.to_string()));
        }

        let raw = codec::decompress(header.codec, payload)?;
        let mut slots = Vec::with_capacity(header.slot_count as usize);
        let mut pos = 0usize;
        while pos < raw.len() {
            if raw.len() - pos < SLOT_HEADER_LEN {
                return Err(Error::Codec(format!("{origin}: truncated slot header")));
            }
            let live = raw[pos] != 0;
            let len = read_u32(&raw, pos + 1)? as usize;
            pos += SLOT_HEADER_LEN;
            let end = pos
                .checked_add(len)
                .filter(|end| *end <= raw.len())
                .ok_or_else(|| Error::Codec(format!("{origin}: truncated slot body")))?;
            slots.push(Slot {
                live,
                bytes: raw[pos..end].to_vec(),
            });
            pos = end;
        }

        if slots.len() != header.slot_count as usize {
            return Err(Error::Codec(format!(
                "{origin}: expected {} slots, found {}",
                header.slot_count,
                slots.len()
            )));
        }
        Ok(Self { slots })
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16> {
    bytes
        .get(at..at + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| Error::Codec(format!("short read at offset {at}")))
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::Codec(format!("short read at offset {at}")))
}
