//! Fixed little-endian wire records for the generator's collectives.
//!
//! Every message is either a single [`WireCount`] header or a packed run
//! of [`WireId`] records. Integers are stored pre-LE with `.to_le()` and
//! decoded with `.from_le()`.

use bytemuck::{Pod, Zeroable};
use static_assertions::{assert_eq_align, assert_eq_size};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Number of records in the following payload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u32).to_le(),
        }
    }

    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// An element ID, node ID or rank carried on the wire.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireId {
    pub id_le: u64,
}

impl WireId {
    pub fn of(id: u64) -> Self {
        Self { id_le: id.to_le() }
    }

    pub fn get(&self) -> u64 {
        u64::from_le(self.id_le)
    }
}

assert_eq_size!(WireCount, u32);
assert_eq_size!(WireId, u64);
assert_eq_align!(WireId, u64);

pub fn encode_ids(ids: &[u64]) -> Vec<WireId> {
    ids.iter().copied().map(WireId::of).collect()
}

/// Decode a packed run of [`WireId`]s.
///
/// Copies into an aligned buffer, so `bytes` may come from anywhere.
pub fn decode_ids(bytes: &[u8]) -> Result<Vec<u64>, String> {
    let rec = std::mem::size_of::<WireId>();
    if bytes.len() % rec != 0 {
        return Err(format!(
            "payload of {} bytes is not a whole number of {rec}-byte records",
            bytes.len()
        ));
    }
    let mut out = vec![WireId::zeroed(); bytes.len() / rec];
    cast_slice_mut(&mut out).copy_from_slice(bytes);
    Ok(out.iter().map(WireId::get).collect())
}

pub fn decode_count(bytes: &[u8]) -> Result<usize, String> {
    expect_exact_len(bytes.len(), std::mem::size_of::<WireCount>())?;
    let mut cnt = WireCount::zeroed();
    cast_slice_mut(std::slice::from_mut(&mut cnt)).copy_from_slice(bytes);
    Ok(cnt.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_little_endian() {
        let wire = encode_ids(&[1, 0x0102_0304]);
        let bytes = cast_slice(&wire);
        assert_eq!(&bytes[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[4, 3, 2, 1]);
        assert_eq!(decode_ids(bytes).unwrap(), vec![1, 0x0102_0304]);
    }

    #[test]
    fn unaligned_payload_decodes() {
        let wire = encode_ids(&[7, 8]);
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(cast_slice(&wire));
        assert_eq!(decode_ids(&shifted[1..]).unwrap(), vec![7, 8]);
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        assert!(decode_ids(&[0u8; 9]).is_err());
        assert!(decode_count(&[0u8; 3]).is_err());
        assert_eq!(decode_count(cast_slice(&[WireCount::new(5)])).unwrap(), 5);
    }
}
