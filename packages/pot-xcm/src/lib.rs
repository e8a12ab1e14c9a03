//! pot-xcm: sponsorship pot provisioning and relay-chain XCM proposals
//!
//! This crate provides:
//! - Deterministic derivation of pot user accounts from one root secret
//! - Batched creation of sponsorship pots and registration of their users
//! - Encoding of technical-committee proposals that send an XCM `Transact`
//!   to the relay chain
//!
//! # Architecture
//!
//! Derivation and encoding are pure and synchronous. The only I/O happens
//! behind [`client::ChainClient`]; every operation that would submit takes a
//! [`client::Dispatch`] so a dry run is guaranteed never to reach the network.

pub mod address;
pub mod calls;
pub mod client;
pub mod codec;
pub mod command;
pub mod derive;
pub mod error;
pub mod keystore;
pub mod provision;
pub mod registry;
pub mod types;
pub mod xcm;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use address::{decode_ss58, encode_ss58};
pub use calls::CallIndexTable;
pub use client::{
    AccountSigner, ChainClient, Dispatch, SubmissionResult, SubmissionStatus, SubxtClient,
};
pub use command::{Command, CommandOutput, Session};
pub use derive::{AddressDeriver, DerivationPath, Seed};
pub use error::{PotXcmError, SubmissionError};
pub use keystore::{JsonKeystore, KeystoreKeypair};
pub use provision::{BatchOutcome, BatchProvisioner, ProvisionIntent, ProvisionReport};
pub use registry::{Pot, PotRegistry, User};
pub use types::Settings;
pub use xcm::{EncodedMessage, ProposalPayload, XcmProposal, XcmProposalBuilder};
