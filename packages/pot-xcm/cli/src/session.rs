//! Settings, call table and chain connection for one invocation

use anyhow::{Context, Result};
use pot_xcm::command::{Command, CommandOutput, Session};
use pot_xcm::{
    encode_ss58, AccountSigner, CallIndexTable, Dispatch, JsonKeystore, PotXcmError, Seed,
    Settings, SubxtClient,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the signing key comes from
pub enum SignerSource {
    /// Secret URI, mnemonic or hex seed
    Uri(String),
    /// polkadot.js JSON keystore
    Keystore { path: PathBuf, password: String },
}

impl SignerSource {
    fn load(&self) -> Result<AccountSigner> {
        match self {
            SignerSource::Uri(secret) => {
                let pair = Seed::parse(secret)
                    .and_then(|seed| seed.keypair())
                    .context("invalid signer")?;
                Ok(pair.into())
            }
            SignerSource::Keystore { path, password } => {
                let pair = JsonKeystore::from_file(path)
                    .and_then(|keystore| keystore.decrypt(password))
                    .with_context(|| format!("cannot open keystore {}", path.display()))?;
                Ok(pair.into())
            }
        }
    }
}

pub struct Invocation {
    settings: Settings,
    metadata: Option<PathBuf>,
    signer: SignerSource,
}

impl Invocation {
    pub fn load(
        config: Option<&Path>,
        url: Option<String>,
        metadata: Option<PathBuf>,
        signer: SignerSource,
    ) -> Result<Self> {
        let mut settings = match config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(url) = url {
            settings.endpoint = url;
        }
        Ok(Self {
            settings,
            metadata,
            signer,
        })
    }

    /// Run `command`, connecting to the node unless it is a dry run
    pub async fn execute(&self, command: Command) -> Result<CommandOutput> {
        let client = if command.is_dry_run() {
            None
        } else {
            Some(self.connect().await?)
        };
        let table = self.call_table(client.as_ref())?;
        let dispatch = match &client {
            Some(client) => Dispatch::Submit(client),
            None => Dispatch::DryRun,
        };

        let session = Session::new(&self.settings, &table, dispatch);
        Ok(session.execute(command, shutdown_signal()).await?)
    }

    async fn connect(&self) -> Result<SubxtClient> {
        let signer = self.signer.load()?;
        info!(
            signer = %encode_ss58(&signer.public_key(), self.settings.ss58_prefix)?,
            "signer loaded"
        );
        let endpoint = &self.settings.endpoint;
        SubxtClient::connect(
            endpoint,
            signer,
            self.settings.wait_for,
            self.settings.provision.pot_storage.clone(),
        )
        .await
        .map_err(PotXcmError::from)
        .with_context(|| format!("cannot connect to {}", endpoint))
    }

    /// Settings file first, then a metadata file, then the connected node
    fn call_table(&self, client: Option<&SubxtClient>) -> Result<CallIndexTable> {
        if let Some(table) = &self.settings.call_indices {
            info!(spec_version = ?table.spec_version, "call indices from settings");
            return Ok(table.clone());
        }
        if let Some(path) = &self.metadata {
            let bytes =
                std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
            info!(path = %path.display(), "call indices from metadata file");
            return Ok(CallIndexTable::from_metadata_bytes(&bytes)?);
        }
        if let Some(client) = client {
            info!("call indices from node metadata");
            return Ok(CallIndexTable::from_metadata(&client.metadata())?);
        }
        warn!("no runtime metadata given, using built-in call indices");
        Ok(CallIndexTable::default())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    warn!("interrupt received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_signer() {
        let signer = SignerSource::Uri("//Alice".to_string()).load().unwrap();
        assert_eq!(
            encode_ss58(&signer.public_key(), 42).unwrap(),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
    }

    #[test]
    fn test_missing_keystore() {
        let source = SignerSource::Keystore {
            path: PathBuf::from("/nonexistent/alice.json"),
            password: String::new(),
        };
        let err = source.load().unwrap_err();
        assert!(format!("{:#}", err).contains("cannot open keystore"));
        let kind = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<PotXcmError>())
            .map(PotXcmError::kind);
        assert_eq!(kind, Some("KeystoreError"));
    }
}
