//! XCM v3 types, as far as relay-bound proposals need them
//!
//! Variant indices are pinned with `#[codec(index = ..)]` so that skipped
//! variants never shift the tags: the relay chain decodes these bytes with its
//! own full definitions.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum VersionedXcm {
    #[codec(index = 3)]
    V3(Xcm),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Xcm(pub Vec<Instruction>);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum VersionedMultiLocation {
    #[codec(index = 3)]
    V3(MultiLocation),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MultiLocation {
    pub parents: u8,
    pub interior: Junctions,
}

impl MultiLocation {
    pub fn here() -> Self {
        Self {
            parents: 0,
            interior: Junctions::Here,
        }
    }

    pub fn parent() -> Self {
        Self {
            parents: 1,
            interior: Junctions::Here,
        }
    }

    pub fn parachain(para_id: u32) -> Self {
        Self {
            parents: 0,
            interior: Junctions::X1(Junction::Parachain(para_id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Junctions {
    #[codec(index = 0)]
    Here,
    #[codec(index = 1)]
    X1(Junction),
    #[codec(index = 2)]
    X2(Junction, Junction),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Junction {
    #[codec(index = 0)]
    Parachain(#[codec(compact)] u32),
    #[codec(index = 1)]
    AccountId32 {
        network: Option<NetworkId>,
        id: [u8; 32],
    },
    #[codec(index = 4)]
    PalletInstance(u8),
    #[codec(index = 5)]
    GeneralIndex(#[codec(compact)] u128),
    #[codec(index = 8)]
    Plurality { id: BodyId, part: BodyPart },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum NetworkId {
    #[codec(index = 0)]
    ByGenesis([u8; 32]),
    #[codec(index = 2)]
    Polkadot,
    #[codec(index = 3)]
    Kusama,
    #[codec(index = 4)]
    Westend,
    #[codec(index = 5)]
    Rococo,
}

/// A collective body inside a consensus system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyId {
    #[codec(index = 0)]
    Unit,
    #[codec(index = 1)]
    Moniker([u8; 4]),
    #[codec(index = 2)]
    Index(#[codec(compact)] u32),
    #[codec(index = 3)]
    Executive,
    #[codec(index = 4)]
    Technical,
    #[codec(index = 5)]
    Legislative,
    #[codec(index = 6)]
    Judicial,
    #[codec(index = 7)]
    Defense,
    #[codec(index = 8)]
    Administration,
    #[codec(index = 9)]
    Treasury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum BodyPart {
    #[codec(index = 0)]
    Voice,
    #[codec(index = 1)]
    Members {
        #[codec(compact)]
        count: u32,
    },
    #[codec(index = 2)]
    Fraction {
        #[codec(compact)]
        nom: u32,
        #[codec(compact)]
        denom: u32,
    },
}

/// How the receiving chain converts the message origin into a dispatch origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OriginKind {
    #[codec(index = 0)]
    Native,
    #[codec(index = 1)]
    SovereignAccount,
    #[codec(index = 2)]
    Superuser,
    #[codec(index = 3)]
    Xcm,
}

/// Two-dimensional weight; both components are compact-encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Weight {
    #[codec(compact)]
    pub ref_time: u64,
    #[codec(compact)]
    pub proof_size: u64,
}

impl Weight {
    pub fn from_parts(ref_time: u64, proof_size: u64) -> Self {
        Self {
            ref_time,
            proof_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum WeightLimit {
    #[codec(index = 0)]
    Unlimited,
    #[codec(index = 1)]
    Limited(Weight),
}

/// Call bytes carried as an opaque length-prefixed blob
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DoubleEncoded {
    pub encoded: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum AssetId {
    #[codec(index = 0)]
    Concrete(MultiLocation),
    #[codec(index = 1)]
    Abstract([u8; 32]),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Fungibility {
    #[codec(index = 0)]
    Fungible(#[codec(compact)] u128),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MultiAsset {
    pub id: AssetId,
    pub fun: Fungibility,
}

impl MultiAsset {
    /// `amount` of the native asset of the chain interpreting the message
    pub fn native(amount: u128) -> Self {
        Self {
            id: AssetId::Concrete(MultiLocation::here()),
            fun: Fungibility::Fungible(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MultiAssets(pub Vec<MultiAsset>);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum WildMultiAsset {
    #[codec(index = 0)]
    All,
    #[codec(index = 2)]
    AllCounted(#[codec(compact)] u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum MultiAssetFilter {
    #[codec(index = 0)]
    Definite(MultiAssets),
    #[codec(index = 1)]
    Wild(WildMultiAsset),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Instruction {
    #[codec(index = 0)]
    WithdrawAsset(MultiAssets),
    #[codec(index = 6)]
    Transact {
        origin_kind: OriginKind,
        require_weight_at_most: Weight,
        call: DoubleEncoded,
    },
    #[codec(index = 10)]
    ClearOrigin,
    #[codec(index = 11)]
    DescendOrigin(Junctions),
    #[codec(index = 13)]
    DepositAsset {
        assets: MultiAssetFilter,
        beneficiary: MultiLocation,
    },
    #[codec(index = 19)]
    BuyExecution {
        fees: MultiAsset,
        weight_limit: WeightLimit,
    },
    #[codec(index = 20)]
    RefundSurplus,
    #[codec(index = 47)]
    UnpaidExecution {
        weight_limit: WeightLimit,
        check_origin: Option<MultiLocation>,
    },
}
