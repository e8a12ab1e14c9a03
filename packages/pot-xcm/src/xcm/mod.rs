//! Relay-chain governance proposals carrying an XCM `Transact`
//!
//! An opaque call is wrapped in an XCM v3 message addressed to the relay
//! chain, the message in `PolkadotXcm.send`, that in `Mandate.apply`, and the
//! result is proposed to the technical committee:
//!
//! ```text
//! TechnicalCommittee.propose(threshold,
//!     Mandate.apply(
//!         PolkadotXcm.send(V3(parents: 1, Here), V3([.., Transact(call), ..]))),
//!     length_bound)
//! ```

pub mod types;

use crate::address::decode_ss58;
use crate::calls::CallIndexTable;
use crate::client::{Dispatch, SubmissionResult};
use crate::codec::{encode_call, encode_compact};
use crate::error::{PotXcmError, SubmissionError};
use crate::types::{FeeMode, OriginDescent, XcmSettings};
use parity_scale_codec::{Decode, Encode};
use tracing::{debug, info};
use types::{
    BodyPart, DoubleEncoded, Instruction, Junction, Junctions, MultiAsset, MultiAssetFilter,
    MultiAssets, MultiLocation, OriginKind, VersionedMultiLocation, VersionedXcm, Weight,
    WeightLimit, WildMultiAsset, Xcm,
};

/// The call to execute on the relay chain and how to dispatch it there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalPayload {
    /// Encoded relay-chain call, never interpreted
    pub call: Vec<u8>,
    pub origin_kind: OriginKind,
    pub require_weight_at_most: Weight,
}

impl ProposalPayload {
    pub fn new(call: Vec<u8>, origin_kind: OriginKind, require_weight_at_most: Weight) -> Self {
        Self {
            call,
            origin_kind,
            require_weight_at_most,
        }
    }
}

/// Immutable encoded call, ready to print or submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage(Vec<u8>);

impl EncodedMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of [`XcmProposal::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    DryRun,
    Submitted(SubmissionResult),
}

/// A fully encoded proposal
#[derive(Debug, Clone)]
pub struct XcmProposal {
    pub dest: VersionedMultiLocation,
    pub message: VersionedXcm,
    /// `PolkadotXcm.send(dest, message)`
    pub send_call: Vec<u8>,
    /// `TechnicalCommittee.propose(..)`, the extrinsic call
    pub call: EncodedMessage,
}

impl XcmProposal {
    /// Human-readable dump: decoded structure followed by the hex encodings
    pub fn render(&self) -> String {
        format!(
            "dest: {:?}\nmessage: {:#?}\nxcm send: 0x{}\nproposal: {}",
            self.dest,
            self.message,
            hex::encode(&self.send_call),
            self.call.to_hex()
        )
    }

    pub async fn dispatch(
        &self,
        dispatch: Dispatch<'_>,
    ) -> Result<ProposalOutcome, SubmissionError> {
        match dispatch {
            Dispatch::DryRun => Ok(ProposalOutcome::DryRun),
            Dispatch::Submit(client) => {
                info!(len = self.call.len(), "submitting proposal");
                let result = client.submit_call(self.call.as_bytes()).await?.into_result()?;
                Ok(ProposalOutcome::Submitted(result))
            }
        }
    }
}

/// Builds [`XcmProposal`]s from a payload
pub struct XcmProposalBuilder<'a> {
    settings: &'a XcmSettings,
    table: &'a CallIndexTable,
}

impl<'a> XcmProposalBuilder<'a> {
    pub fn new(settings: &'a XcmSettings, table: &'a CallIndexTable) -> Self {
        Self { settings, table }
    }

    pub fn validate(&self, payload: &ProposalPayload) -> Result<(), PotXcmError> {
        if payload.call.is_empty() {
            return Err(PotXcmError::InvalidPayload(
                "transact call must not be empty".to_string(),
            ));
        }
        let weight = payload.require_weight_at_most;
        if weight.ref_time > self.settings.max_ref_time {
            return Err(PotXcmError::InvalidPayload(format!(
                "ref_time {} exceeds maximum {}",
                weight.ref_time, self.settings.max_ref_time
            )));
        }
        if weight.proof_size > self.settings.max_proof_size {
            return Err(PotXcmError::InvalidPayload(format!(
                "proof_size {} exceeds maximum {}",
                weight.proof_size, self.settings.max_proof_size
            )));
        }
        Ok(())
    }

    /// Instruction sequence executed on the relay chain
    pub fn instructions(&self, payload: &ProposalPayload) -> Result<Vec<Instruction>, PotXcmError> {
        let mut instructions = Vec::new();

        if let Some(descent) = &self.settings.descend_origin {
            instructions.push(Instruction::DescendOrigin(descent_junctions(descent)?));
        }

        let transact = Instruction::Transact {
            origin_kind: payload.origin_kind,
            require_weight_at_most: payload.require_weight_at_most,
            call: DoubleEncoded {
                encoded: payload.call.clone(),
            },
        };

        match self.settings.fee {
            FeeMode::Paid { amount } => {
                let fee = MultiAsset::native(amount);
                instructions.push(Instruction::WithdrawAsset(MultiAssets(vec![fee.clone()])));
                instructions.push(Instruction::BuyExecution {
                    fees: fee,
                    weight_limit: WeightLimit::Unlimited,
                });
                instructions.push(transact);
                instructions.push(Instruction::RefundSurplus);
                instructions.push(Instruction::DepositAsset {
                    assets: MultiAssetFilter::Wild(WildMultiAsset::All),
                    beneficiary: MultiLocation::parachain(self.settings.para_id),
                });
            }
            FeeMode::Unpaid => {
                instructions.push(Instruction::UnpaidExecution {
                    weight_limit: WeightLimit::Unlimited,
                    check_origin: None,
                });
                instructions.push(transact);
            }
        }

        Ok(instructions)
    }

    /// Validate, wrap and encode the payload
    pub fn build(&self, payload: &ProposalPayload) -> Result<XcmProposal, PotXcmError> {
        self.validate(payload)?;

        let dest = VersionedMultiLocation::V3(MultiLocation::parent());
        let message = VersionedXcm::V3(Xcm(self.instructions(payload)?));
        let message_bytes = message.encode();

        // The relay decodes these bytes with its own definitions; make sure ours agree
        let decoded = VersionedXcm::decode(&mut &message_bytes[..])?;
        if decoded != message {
            return Err(PotXcmError::Encoding(
                "encoded message does not decode to itself".to_string(),
            ));
        }

        let mut send_args = dest.encode();
        send_args.extend_from_slice(&message_bytes);
        let send_call = encode_call(self.table.xcm_send, &send_args);

        let apply_call = encode_call(self.table.mandate_apply, &send_call);
        let length_bound = u32::try_from(apply_call.len()).map_err(|_| {
            PotXcmError::Encoding(format!("proposal of {} bytes is too large", apply_call.len()))
        })?;

        let mut propose_args = encode_compact(self.settings.threshold as u64);
        propose_args.extend_from_slice(&apply_call);
        propose_args.extend_from_slice(&encode_compact(length_bound as u64));
        let call = encode_call(self.table.committee_propose, &propose_args);

        if call.len() > self.settings.max_call_size {
            return Err(PotXcmError::Encoding(format!(
                "encoded proposal is {} bytes, maximum is {}",
                call.len(),
                self.settings.max_call_size
            )));
        }

        debug!(
            message_len = message_bytes.len(),
            length_bound,
            call_len = call.len(),
            "proposal encoded"
        );

        Ok(XcmProposal {
            dest,
            message,
            send_call,
            call: EncodedMessage(call),
        })
    }
}

fn descent_junctions(descent: &OriginDescent) -> Result<Junctions, PotXcmError> {
    match descent {
        OriginDescent::Plurality { body } => Ok(Junctions::X1(Junction::Plurality {
            id: *body,
            part: BodyPart::Voice,
        })),
        OriginDescent::Account { address } => {
            let (id, _) = decode_ss58(address)?;
            Ok(Junctions::X1(Junction::AccountId32 { network: None, id }))
        }
    }
}
