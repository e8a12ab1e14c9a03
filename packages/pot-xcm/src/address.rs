//! SS58 address encoding and decoding for Substrate chains
//!
//! Uses the bs58 crate for base58 and Blake2b-512 for the checksum.
//! See: https://docs.substrate.io/reference/address-formats/

use crate::error::PotXcmError;
use blake2::{Blake2b512, Digest};

/// SS58 prefix for checksum calculation
const SS58_PREFIX: &[u8] = b"SS58PRE";

const CHECKSUM_LEN: usize = 2;

/// Encode a 32-byte public key as an SS58 address for the given network prefix
pub fn encode_ss58(public_key: &[u8; 32], prefix: u16) -> Result<String, PotXcmError> {
    let mut payload = encode_prefix(prefix)?;
    payload.extend_from_slice(public_key);

    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    Ok(bs58::encode(&payload).into_string())
}

/// Decode an SS58 address to its public key and prefix
pub fn decode_ss58(address: &str) -> Result<([u8; 32], u16), PotXcmError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| PotXcmError::InvalidAddress(format!("invalid base58: {}", e)))?;

    if decoded.len() < 32 + 1 + CHECKSUM_LEN {
        return Err(PotXcmError::InvalidAddress("address too short".to_string()));
    }

    let (prefix, prefix_len) = decode_prefix(&decoded)?;

    let checksum_start = decoded.len() - CHECKSUM_LEN;
    let public_key: [u8; 32] = decoded[prefix_len..checksum_start]
        .try_into()
        .map_err(|_| {
            PotXcmError::InvalidAddress(format!(
                "invalid public key length: {}",
                checksum_start - prefix_len
            ))
        })?;

    let expected = ss58_checksum(&decoded[..checksum_start]);
    if decoded[checksum_start..] != expected[..CHECKSUM_LEN] {
        return Err(PotXcmError::InvalidAddress("invalid checksum".to_string()));
    }

    Ok((public_key, prefix))
}

/// Single-byte prefixes below 64, two-byte prefixes below 16384
fn encode_prefix(prefix: u16) -> Result<Vec<u8>, PotXcmError> {
    if prefix < 64 {
        Ok(vec![prefix as u8])
    } else if prefix < 16384 {
        let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2 | 0b0100_0000;
        let second = ((prefix >> 8) as u8) | ((prefix & 0b0000_0000_0000_0011) as u8) << 6;
        Ok(vec![first, second])
    } else {
        Err(PotXcmError::InvalidAddress(format!(
            "invalid prefix: {}",
            prefix
        )))
    }
}

fn decode_prefix(data: &[u8]) -> Result<(u16, usize), PotXcmError> {
    match data[0] {
        b if b < 64 => Ok((b as u16, 1)),
        b if b < 128 => {
            let lower = (b & 0b0011_1111) << 2 | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            Ok((((upper as u16) << 8) | (lower as u16), 2))
        }
        b => Err(PotXcmError::InvalidAddress(format!(
            "invalid prefix byte: {}",
            b
        ))),
    }
}

/// Blake2b-512 of "SS58PRE" || payload
fn ss58_checksum(payload: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(payload);
    let mut checksum = [0u8; 64];
    checksum.copy_from_slice(&hasher.finalize());
    checksum
}
