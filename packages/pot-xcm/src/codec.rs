//! SCALE encoding primitives
//!
//! Thin helpers over `parity-scale-codec` for the shapes every call in this
//! crate is made of (compact integers, enum variants, `[pallet][call][args]`
//! call data), plus hex input parsing.

use crate::error::PotXcmError;
use parity_scale_codec::{Compact, Decode, Encode};
use serde::{Deserialize, Serialize};

/// Position of a call inside the runtime: pallet index and call variant index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct CallIndex {
    pub pallet: u8,
    pub call: u8,
}

impl CallIndex {
    pub const fn new(pallet: u8, call: u8) -> Self {
        Self { pallet, call }
    }
}

/// Encode an unsigned integer in SCALE compact form
pub fn encode_compact(value: u64) -> Vec<u8> {
    Compact(value).encode()
}

/// Decode a SCALE compact integer, returning the value and bytes consumed
pub fn decode_compact(bytes: &[u8]) -> Result<(u64, usize), PotXcmError> {
    let mut input = bytes;
    let Compact(value) = Compact::<u64>::decode(&mut input)?;
    Ok((value, bytes.len() - input.len()))
}

/// Encode an enum variant: one tag byte followed by the encoded payload
pub fn encode_variant(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(tag);
    out.extend_from_slice(payload);
    out
}

/// Encode call data: pallet index, call index, then the already-encoded args
pub fn encode_call(index: CallIndex, args: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + args.len());
    out.push(index.pallet);
    out.push(index.call);
    out.extend_from_slice(args);
    out
}

/// Decode user-supplied hex call data, with or without `0x`
pub fn decode_hex(input: &str) -> Result<Vec<u8>, PotXcmError> {
    let input = input.trim();
    Ok(hex::decode(input.strip_prefix("0x").unwrap_or(input))?)
}
