//! Runtime call indices
//!
//! Pallet and call indices move between runtime upgrades, so they are never
//! baked into the encoders. A [`CallIndexTable`] is either given in the
//! settings file, resolved from runtime metadata, or taken from the built-in
//! defaults.

use crate::codec::CallIndex;
use crate::error::PotXcmError;
use parity_scale_codec::Decode;
use serde::{Deserialize, Serialize};
use subxt_core::metadata::Metadata;

/// Indices of every call this crate encodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallIndexTable {
    /// Runtime spec version the indices belong to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<u32>,
    /// `Sponsorship.create_pot`
    pub create_pot: CallIndex,
    /// `Sponsorship.register_users`
    pub register_users: CallIndex,
    /// `Utility.batch_all`
    pub batch_all: CallIndex,
    /// `PolkadotXcm.send`
    pub xcm_send: CallIndex,
    /// `Mandate.apply`
    pub mandate_apply: CallIndex,
    /// `TechnicalCommittee.propose`
    pub committee_propose: CallIndex,
}

impl Default for CallIndexTable {
    /// Eden runtime layout; prefer metadata when it is available
    fn default() -> Self {
        Self {
            spec_version: None,
            create_pot: CallIndex::new(45, 0),
            register_users: CallIndex::new(45, 2),
            batch_all: CallIndex::new(9, 2),
            xcm_send: CallIndex::new(31, 0),
            mandate_apply: CallIndex::new(15, 0),
            committee_propose: CallIndex::new(16, 2),
        }
    }
}

impl CallIndexTable {
    /// Resolve every index by pallet and call name
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, PotXcmError> {
        Ok(Self {
            spec_version: None,
            create_pot: get_call_index(metadata, "Sponsorship", "create_pot")?,
            register_users: get_call_index(metadata, "Sponsorship", "register_users")?,
            batch_all: get_call_index(metadata, "Utility", "batch_all")?,
            xcm_send: get_call_index(metadata, "PolkadotXcm", "send")?,
            mandate_apply: get_call_index(metadata, "Mandate", "apply")?,
            committee_propose: get_call_index(metadata, "TechnicalCommittee", "propose")?,
        })
    }

    /// Resolve from SCALE-encoded `RuntimeMetadataPrefixed` bytes (a `.scale` file)
    pub fn from_metadata_bytes(bytes: &[u8]) -> Result<Self, PotXcmError> {
        let metadata = Metadata::decode(&mut &bytes[..])
            .map_err(|e| PotXcmError::Config(format!("invalid runtime metadata: {}", e)))?;
        Self::from_metadata(&metadata)
    }
}

/// Get pallet and call index from metadata
fn get_call_index(
    metadata: &Metadata,
    pallet: &str,
    method: &str,
) -> Result<CallIndex, PotXcmError> {
    let p = metadata
        .pallet_by_name(pallet)
        .ok_or_else(|| PotXcmError::Config(format!("{} pallet not found", pallet)))?;
    let c = p
        .call_variant_by_name(method)
        .ok_or_else(|| PotXcmError::Config(format!("{}.{} not found", pallet, method)))?;
    Ok(CallIndex::new(p.index(), c.index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_table() {
        let json = r#"{
            "specVersion": 25,
            "createPot": { "pallet": 60, "call": 0 },
            "registerUsers": { "pallet": 60, "call": 2 },
            "batchAll": { "pallet": 12, "call": 2 },
            "xcmSend": { "pallet": 31, "call": 0 },
            "mandateApply": { "pallet": 15, "call": 0 },
            "committeePropose": { "pallet": 16, "call": 2 }
        }"#;

        let table: CallIndexTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.spec_version, Some(25));
        assert_eq!(table.create_pot, CallIndex::new(60, 0));
        assert_eq!(table.batch_all, CallIndex::new(12, 2));
    }

    #[test]
    fn test_missing_entry_rejected() {
        let json = r#"{ "createPot": { "pallet": 60, "call": 0 } }"#;
        assert!(serde_json::from_str::<CallIndexTable>(json).is_err());
    }

    #[test]
    fn test_garbage_metadata_rejected() {
        let err = CallIndexTable::from_metadata_bytes(&[0xde, 0xad]).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }
}
