//! Chain access
//!
//! Everything that talks to a node goes through [`ChainClient`]. The rest of
//! the crate hands it finished call bytes and reads back a
//! [`SubmissionResult`]; [`SubxtClient`] is the production implementation.

use crate::error::SubmissionError;
use crate::keystore::KeystoreKeypair;
use crate::types::{StorageLocation, WaitFor};
use async_trait::async_trait;
use futures::StreamExt;
use subxt::tx::{Signer, TxInBlock, TxStatus};
use subxt::utils::{AccountId32, MultiAddress, MultiSignature};
use subxt::{OnlineClient, PolkadotConfig};
use subxt_core::tx::payload::Payload;
use subxt_signer::sr25519::Keypair;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Included,
    Finalized,
    /// Included, but the runtime reported `ExtrinsicFailed`
    Failed,
}

/// What the node reported for one submitted extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    pub block_hash: Option<String>,
    pub extrinsic_hash: Option<String>,
    pub error_detail: Option<String>,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        self.status != SubmissionStatus::Failed
    }

    /// Turn a `Failed` status into the equivalent error
    pub fn into_result(self) -> Result<Self, SubmissionError> {
        match self.status {
            SubmissionStatus::Failed => Err(SubmissionError::DispatchFailed(
                self.error_detail
                    .unwrap_or_else(|| "extrinsic failed".to_string()),
            )),
            _ => Ok(self),
        }
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Sign and submit `call` (SCALE-encoded runtime call), wait per the client's policy
    async fn submit_call(&self, call: &[u8]) -> Result<SubmissionResult, SubmissionError>;

    /// Whether a sponsorship pot with this id exists on chain
    async fn pot_exists(&self, pot_id: u32) -> Result<bool, SubmissionError>;
}

/// Whether an operation stops after encoding or goes to the chain
#[derive(Clone, Copy)]
pub enum Dispatch<'a> {
    DryRun,
    Submit(&'a dyn ChainClient),
}

impl Dispatch<'_> {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Dispatch::DryRun)
    }
}

/// Call data that is already encoded; handed to subxt untouched
struct RawCall<'a>(&'a [u8]);

impl Payload for RawCall<'_> {
    fn encode_call_data_to(
        &self,
        _metadata: &subxt_core::Metadata,
        out: &mut Vec<u8>,
    ) -> Result<(), subxt_core::Error> {
        out.extend_from_slice(self.0);
        Ok(())
    }
}

/// sr25519 account that signs submitted extrinsics
pub enum AccountSigner {
    /// Derived from a secret URI
    Uri(Keypair),
    /// Decrypted from a JSON keystore
    Keystore(KeystoreKeypair),
}

impl AccountSigner {
    pub fn public_key(&self) -> [u8; 32] {
        match self {
            AccountSigner::Uri(pair) => pair.public_key().0,
            AccountSigner::Keystore(pair) => pair.public_key(),
        }
    }
}

impl std::fmt::Debug for AccountSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountSigner(0x{})", hex::encode(self.public_key()))
    }
}

impl From<Keypair> for AccountSigner {
    fn from(pair: Keypair) -> Self {
        AccountSigner::Uri(pair)
    }
}

impl From<KeystoreKeypair> for AccountSigner {
    fn from(pair: KeystoreKeypair) -> Self {
        AccountSigner::Keystore(pair)
    }
}

impl Signer<PolkadotConfig> for AccountSigner {
    fn account_id(&self) -> AccountId32 {
        AccountId32(self.public_key())
    }

    fn address(&self) -> MultiAddress<AccountId32, ()> {
        MultiAddress::Id(self.account_id())
    }

    fn sign(&self, signer_payload: &[u8]) -> MultiSignature {
        let signature = match self {
            AccountSigner::Uri(pair) => pair.sign(signer_payload).0,
            AccountSigner::Keystore(pair) => pair.sign(signer_payload),
        };
        MultiSignature::Sr25519(signature)
    }
}

/// [`ChainClient`] backed by a subxt WebSocket connection
pub struct SubxtClient {
    api: OnlineClient<PolkadotConfig>,
    signer: AccountSigner,
    wait_for: WaitFor,
    pot_storage: StorageLocation,
}

impl SubxtClient {
    pub async fn connect(
        endpoint: &str,
        signer: AccountSigner,
        wait_for: WaitFor,
        pot_storage: StorageLocation,
    ) -> Result<Self, SubmissionError> {
        let api = OnlineClient::<PolkadotConfig>::from_url(endpoint).await?;
        info!(endpoint, "connection established");
        Ok(Self {
            api,
            signer,
            wait_for,
            pot_storage,
        })
    }

    /// Runtime metadata of the connected node
    pub fn metadata(&self) -> subxt::Metadata {
        self.api.metadata()
    }

    async fn outcome(
        &self,
        in_block: TxInBlock<PolkadotConfig, OnlineClient<PolkadotConfig>>,
        status: SubmissionStatus,
    ) -> Result<SubmissionResult, SubmissionError> {
        let block_hash = Some(format!("0x{}", hex::encode(in_block.block_hash())));
        let extrinsic_hash = Some(format!("0x{}", hex::encode(in_block.extrinsic_hash())));

        match in_block.wait_for_success().await {
            Ok(_) => Ok(SubmissionResult {
                status,
                block_hash,
                extrinsic_hash,
                error_detail: None,
            }),
            Err(subxt::Error::Runtime(e)) => {
                warn!(block = ?block_hash, error = %e, "extrinsic failed");
                Ok(SubmissionResult {
                    status: SubmissionStatus::Failed,
                    block_hash,
                    extrinsic_hash,
                    error_detail: Some(e.to_string()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ChainClient for SubxtClient {
    async fn submit_call(&self, call: &[u8]) -> Result<SubmissionResult, SubmissionError> {
        let mut progress = self
            .api
            .tx()
            .sign_and_submit_then_watch_default(&RawCall(call), &self.signer)
            .await?;
        debug!(call_len = call.len(), "extrinsic submitted");

        while let Some(status) = progress.next().await {
            match status? {
                TxStatus::InBestBlock(in_block) if self.wait_for == WaitFor::InBlock => {
                    return self.outcome(in_block, SubmissionStatus::Included).await;
                }
                TxStatus::InFinalizedBlock(in_block) => {
                    return self.outcome(in_block, SubmissionStatus::Finalized).await;
                }
                TxStatus::Error { message } => return Err(SubmissionError::Transport(message)),
                TxStatus::Invalid { message } | TxStatus::Dropped { message } => {
                    return Err(SubmissionError::Rejected(message));
                }
                _ => continue,
            }
        }

        Err(SubmissionError::Transport(
            "transaction status stream ended".to_string(),
        ))
    }

    async fn pot_exists(&self, pot_id: u32) -> Result<bool, SubmissionError> {
        let address = subxt::dynamic::storage(
            self.pot_storage.pallet.clone(),
            self.pot_storage.entry.clone(),
            vec![subxt::dynamic::Value::u128(pot_id as u128)],
        );
        let found = self
            .api
            .storage()
            .at_latest()
            .await?
            .fetch(&address)
            .await?;
        debug!(pot_id, exists = found.is_some(), "pot lookup");
        Ok(found.is_some())
    }
}
