//! Settings shared by provisioning and proposal building
//!
//! Loaded once from an optional JSON file, then overridden by CLI flags and
//! passed by reference into every component. Nothing here is global.

use crate::calls::CallIndexTable;
use crate::error::PotXcmError;
use crate::xcm::types::{BodyId, OriginKind};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Balance amounts in plancks: a JSON integer, or a decimal string for values
/// beyond `u64::MAX`
fn deserialize_amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct AmountVisitor;

    impl de::Visitor<'_> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an amount in plancks as an unsigned integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u128, E> {
            Ok(u128::from(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<u128, E> {
            Err(E::custom(format!(
                "amount {} is not a whole number of plancks below 2^64, write it as a string",
                value
            )))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u128, E> {
            value
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

/// How long to wait after submitting an extrinsic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitFor {
    InBlock,
    #[default]
    Finalized,
}

/// Pallet storage map that holds pots, keyed by pot id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    pub pallet: String,
    pub entry: String,
}

impl Default for StorageLocation {
    fn default() -> Self {
        Self {
            pallet: "Sponsorship".to_string(),
            entry: "Pot".to_string(),
        }
    }
}

/// Parameters of the sponsorship calls issued while provisioning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisionSettings {
    /// Variant index of the runtime's `SponsorshipType` enum
    pub sponsorship_type: u8,
    #[serde(deserialize_with = "deserialize_amount")]
    pub pot_fee_quota: u128,
    #[serde(deserialize_with = "deserialize_amount")]
    pub pot_reserve_quota: u128,
    /// Quotas handed to every registered user
    #[serde(deserialize_with = "deserialize_amount")]
    pub user_fee_quota: u128,
    #[serde(deserialize_with = "deserialize_amount")]
    pub user_reserve_quota: u128,
    /// Maximum number of intents per extrinsic
    pub max_batch_size: usize,
    pub pot_storage: StorageLocation,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            sponsorship_type: 0,
            pot_fee_quota: 1_000_000_000_000_000,
            pot_reserve_quota: 1_000_000_000_000_000,
            user_fee_quota: 1_000_000_000_000,
            user_reserve_quota: 1_000_000_000_000,
            max_batch_size: 100,
            pot_storage: StorageLocation::default(),
        }
    }
}

/// Who pays for execution on the relay chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeeMode {
    /// Withdraw `amount` of the relay's native asset from the origin and buy execution
    Paid {
        #[serde(deserialize_with = "deserialize_amount")]
        amount: u128,
    },
    /// Rely on the relay granting free execution to the origin
    Unpaid,
}

impl Default for FeeMode {
    fn default() -> Self {
        FeeMode::Paid {
            amount: 1_000_000_000_000_000_000,
        }
    }
}

/// Interior location the message descends into before transacting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OriginDescent {
    /// A collective body of the parachain, speaking with its voice
    Plurality { body: BodyId },
    /// A single account of the parachain (SS58 address)
    Account { address: String },
}

/// Shape of the relay-chain proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XcmSettings {
    /// Parachain id receiving refunded fees
    pub para_id: u32,
    pub fee: FeeMode,
    pub origin_kind: OriginKind,
    pub descend_origin: Option<OriginDescent>,
    pub ref_time: u64,
    pub proof_size: u64,
    pub max_ref_time: u64,
    pub max_proof_size: u64,
    /// Upper bound on the encoded governance call, in bytes
    pub max_call_size: usize,
    /// Committee votes needed to pass the proposal
    pub threshold: u32,
}

impl Default for XcmSettings {
    fn default() -> Self {
        Self {
            para_id: 2026,
            fee: FeeMode::default(),
            origin_kind: OriginKind::Native,
            descend_origin: None,
            ref_time: 10_000_000_000,
            proof_size: 1_000_000,
            max_ref_time: 2_000_000_000_000,
            max_proof_size: 5 * 1024 * 1024,
            max_call_size: 64 * 1024,
            threshold: 1,
        }
    }
}

/// Everything an invocation needs besides secrets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Parachain RPC endpoint
    pub endpoint: String,
    /// SS58 network prefix for printed addresses (37 = Nodle)
    pub ss58_prefix: u16,
    pub wait_for: WaitFor,
    /// Explicit call table; resolved from metadata or defaults when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_indices: Option<CallIndexTable>,
    pub provision: ProvisionSettings,
    pub xcm: XcmSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:9280".to_string(),
            ss58_prefix: 37,
            wait_for: WaitFor::default(),
            call_indices: None,
            provision: ProvisionSettings::default(),
            xcm: XcmSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, PotXcmError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| PotXcmError::Config(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, PotXcmError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PotXcmError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), PotXcmError> {
        if self.provision.max_batch_size == 0 {
            return Err(PotXcmError::Config(
                "maxBatchSize must be at least 1".to_string(),
            ));
        }
        if self.xcm.threshold == 0 {
            return Err(PotXcmError::Config(
                "threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, "ws://localhost:9280");
        assert_eq!(settings.xcm.para_id, 2026);
        assert_eq!(settings.xcm.origin_kind, OriginKind::Native);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "endpoint": "wss://eden-rpc.example:443",
            "provision": {
                "maxBatchSize": 25,
                "userFeeQuota": "340282366920938463463374607431768211455"
            },
            "xcm": { "fee": { "type": "unpaid" }, "originKind": "superuser" }
        }"#;

        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.endpoint, "wss://eden-rpc.example:443");
        assert_eq!(settings.ss58_prefix, 37);
        assert_eq!(settings.provision.max_batch_size, 25);
        assert_eq!(settings.provision.user_fee_quota, u128::MAX);
        assert_eq!(settings.xcm.fee, FeeMode::Unpaid);
        assert_eq!(settings.xcm.origin_kind, OriginKind::Superuser);
        assert_eq!(settings.xcm.ref_time, 10_000_000_000);
    }

    #[test]
    fn test_descend_origin_setting() {
        let json = r#"{
            "xcm": { "descendOrigin": { "type": "plurality", "body": "technical" } }
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(
            settings.xcm.descend_origin,
            Some(OriginDescent::Plurality {
                body: BodyId::Technical
            })
        );
    }

    #[test]
    fn test_amount_forms() {
        let json = r#"{ "provision": { "potFeeQuota": 5, "potReserveQuota": "7" } }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.provision.pot_fee_quota, 5);
        assert_eq!(settings.provision.pot_reserve_quota, 7);

        // above u64::MAX serde_json only has a float
        let json = r#"{ "xcm": { "fee": { "type": "paid", "amount": 1e30 } } }"#;
        let err = Settings::from_json(json).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("write it as a string"));

        for json in [
            r#"{ "provision": { "userFeeQuota": 1.5 } }"#,
            r#"{ "provision": { "userFeeQuota": -1 } }"#,
            r#"{ "provision": { "userFeeQuota": "12 DOT" } }"#,
        ] {
            assert_eq!(Settings::from_json(json).unwrap_err().kind(), "ConfigError");
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = Settings::from_json(r#"{ "provision": { "maxBatchSize": 0 } }"#).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_unknown_json_rejected() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }
}
