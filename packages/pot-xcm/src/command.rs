//! Command execution
//!
//! The CLI decodes its arguments once into a [`Command`] and hands it to a
//! [`Session`] together with the settings and call table for the run.

use crate::calls::CallIndexTable;
use crate::client::Dispatch;
use crate::codec::decode_hex;
use crate::derive::{AddressDeriver, Seed};
use crate::error::{PotXcmError, SubmissionError};
use crate::provision::{BatchProvisioner, ProvisionIntent, ProvisionReport};
use crate::registry::{Pot, PotRegistry, User};
use crate::types::{FeeMode, Settings, XcmSettings};
use crate::xcm::types::{OriginKind, Weight};
use crate::xcm::{ProposalOutcome, ProposalPayload, XcmProposal, XcmProposalBuilder};
use std::future::Future;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePotsParams {
    pub count: u32,
    pub start_id: u32,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct RegisterUsersParams {
    pub pot_id: u32,
    pub count: u32,
    pub start_offset: u32,
    /// Check `pot_exists` before registering
    pub verify_pot: bool,
    pub dry_run: bool,
    seed: Seed,
}

impl RegisterUsersParams {
    pub fn new(
        pot_id: u32,
        count: u32,
        start_offset: u32,
        seed: &str,
        verify_pot: bool,
        dry_run: bool,
    ) -> Result<Self, PotXcmError> {
        Ok(Self {
            pot_id,
            count,
            start_offset,
            verify_pot,
            dry_run,
            seed: Seed::parse(seed)?,
        })
    }
}

/// Per-invocation changes to the XCM settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XcmOverrides {
    pub ref_time: Option<u64>,
    pub proof_size: Option<u64>,
    pub origin_kind: Option<OriginKind>,
    pub para_id: Option<u32>,
    pub unpaid: bool,
}

impl XcmOverrides {
    pub fn apply(&self, settings: &mut XcmSettings) {
        if let Some(ref_time) = self.ref_time {
            settings.ref_time = ref_time;
        }
        if let Some(proof_size) = self.proof_size {
            settings.proof_size = proof_size;
        }
        if let Some(origin_kind) = self.origin_kind {
            settings.origin_kind = origin_kind;
        }
        if let Some(para_id) = self.para_id {
            settings.para_id = para_id;
        }
        if self.unpaid {
            settings.fee = FeeMode::Unpaid;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposeXcmParams {
    /// Decoded `--transact` bytes
    pub call: Vec<u8>,
    pub overrides: XcmOverrides,
    pub dry_run: bool,
}

impl ProposeXcmParams {
    pub fn new(
        transact: &str,
        overrides: XcmOverrides,
        dry_run: bool,
    ) -> Result<Self, PotXcmError> {
        Ok(Self {
            call: decode_hex(transact)?,
            overrides,
            dry_run,
        })
    }
}

#[derive(Debug)]
pub enum Command {
    CreatePots(CreatePotsParams),
    RegisterUsers(RegisterUsersParams),
    ProposeXcm(ProposeXcmParams),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreatePots(_) => "create-pots",
            Command::RegisterUsers(_) => "register-users",
            Command::ProposeXcm(_) => "propose-xcm",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        match self {
            Command::CreatePots(p) => p.dry_run,
            Command::RegisterUsers(p) => p.dry_run,
            Command::ProposeXcm(p) => p.dry_run,
        }
    }
}

#[derive(Debug)]
pub enum CommandOutput {
    Pots {
        pots: Vec<Pot>,
        report: ProvisionReport,
    },
    Users {
        users: Vec<User>,
        report: ProvisionReport,
    },
    Proposal {
        proposal: XcmProposal,
        outcome: ProposalOutcome,
    },
}

impl CommandOutput {
    /// False when any batch failed or was cut short
    pub fn is_success(&self) -> bool {
        match self {
            CommandOutput::Pots { report, .. } | CommandOutput::Users { report, .. } => {
                report.is_success()
            }
            CommandOutput::Proposal { .. } => true,
        }
    }
}

/// Everything a command needs from the invocation
pub struct Session<'a> {
    pub settings: &'a Settings,
    pub table: &'a CallIndexTable,
    pub dispatch: Dispatch<'a>,
}

impl<'a> Session<'a> {
    pub fn new(
        settings: &'a Settings,
        table: &'a CallIndexTable,
        dispatch: Dispatch<'a>,
    ) -> Self {
        Self {
            settings,
            table,
            dispatch,
        }
    }

    /// Run `command`; resolving `shutdown` stops any pending submission
    pub async fn execute<F>(
        &self,
        command: Command,
        shutdown: F,
    ) -> Result<CommandOutput, PotXcmError>
    where
        F: Future<Output = ()>,
    {
        // a dry-run command never reaches the client, even if one is connected
        let dispatch = if command.is_dry_run() {
            Dispatch::DryRun
        } else {
            self.dispatch
        };
        info!(command = command.name(), dry_run = dispatch.is_dry_run(), "executing");

        match command {
            Command::CreatePots(params) => self.create_pots(params, dispatch, shutdown).await,
            Command::RegisterUsers(params) => {
                self.register_users(params, dispatch, shutdown).await
            }
            Command::ProposeXcm(params) => self.propose_xcm(params, dispatch, shutdown).await,
        }
    }

    async fn create_pots<F>(
        &self,
        params: CreatePotsParams,
        dispatch: Dispatch<'_>,
        shutdown: F,
    ) -> Result<CommandOutput, PotXcmError>
    where
        F: Future<Output = ()>,
    {
        let mut registry = PotRegistry::new();
        let pots = registry.create_pots(params.count, params.start_id)?;
        let intents = pots.iter().map(ProvisionIntent::from).collect();

        let report = BatchProvisioner::new(&self.settings.provision, self.table)
            .submit(intents, dispatch, shutdown)
            .await;
        Ok(CommandOutput::Pots { pots, report })
    }

    async fn register_users<F>(
        &self,
        params: RegisterUsersParams,
        dispatch: Dispatch<'_>,
        shutdown: F,
    ) -> Result<CommandOutput, PotXcmError>
    where
        F: Future<Output = ()>,
    {
        if let (true, Dispatch::Submit(client)) = (params.verify_pot, dispatch) {
            if !client.pot_exists(params.pot_id).await? {
                return Err(PotXcmError::UnknownPot(params.pot_id));
            }
        }

        let mut registry = PotRegistry::new();
        registry.adopt_pot(params.pot_id);
        let deriver = AddressDeriver::new(params.seed, self.settings.ss58_prefix)?;
        let users =
            registry.register_users(&deriver, params.pot_id, params.count, params.start_offset)?;
        let intents = users.iter().map(ProvisionIntent::from).collect();

        let report = BatchProvisioner::new(&self.settings.provision, self.table)
            .submit(intents, dispatch, shutdown)
            .await;
        Ok(CommandOutput::Users { users, report })
    }

    async fn propose_xcm<F>(
        &self,
        params: ProposeXcmParams,
        dispatch: Dispatch<'_>,
        shutdown: F,
    ) -> Result<CommandOutput, PotXcmError>
    where
        F: Future<Output = ()>,
    {
        let mut settings = self.settings.xcm.clone();
        params.overrides.apply(&mut settings);

        let payload = ProposalPayload::new(
            params.call,
            settings.origin_kind,
            Weight::from_parts(settings.ref_time, settings.proof_size),
        );
        let proposal = XcmProposalBuilder::new(&settings, self.table).build(&payload)?;

        let outcome = tokio::select! {
            biased;
            _ = shutdown => Err(SubmissionError::Cancelled),
            outcome = proposal.dispatch(dispatch) => outcome,
        }?;
        Ok(CommandOutput::Proposal { proposal, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;
    use futures::future::pending;

    fn propose(dry_run: bool) -> Command {
        let params =
            ProposeXcmParams::new("0x4604ea070000", XcmOverrides::default(), dry_run).unwrap();
        Command::ProposeXcm(params)
    }

    fn register(verify_pot: bool) -> Command {
        let params = RegisterUsersParams::new(0, 3, 10, "//Alice", verify_pot, false).unwrap();
        Command::RegisterUsers(params)
    }

    #[tokio::test]
    async fn test_propose_dry_run_is_pure() {
        let settings = Settings::default();
        let table = CallIndexTable::default();
        let client = MockClient::new();
        let session = Session::new(&settings, &table, Dispatch::Submit(&client));

        let dry = session.execute(propose(true), pending()).await.unwrap();
        assert_eq!(client.submit_count(), 0);
        let CommandOutput::Proposal { proposal, outcome } = dry else {
            panic!("expected a proposal");
        };
        assert_eq!(outcome, ProposalOutcome::DryRun);
        assert!(proposal.call.to_hex().contains("4604ea070000"));

        session.execute(propose(false), pending()).await.unwrap();
        assert_eq!(client.submitted(), vec![proposal.call.as_bytes().to_vec()]);
    }

    #[tokio::test]
    async fn test_propose_cancelled() {
        let settings = Settings::default();
        let table = CallIndexTable::default();
        let client = MockClient::new();
        let session = Session::new(&settings, &table, Dispatch::Submit(&client));

        let err = session
            .execute(propose(false), futures::future::ready(()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "SubmissionError");
        assert_eq!(client.submit_count(), 0);
    }

    #[tokio::test]
    async fn test_create_pots_single_batch() {
        let settings = Settings::default();
        let table = CallIndexTable::default();
        let client = MockClient::new();
        let session = Session::new(&settings, &table, Dispatch::Submit(&client));

        let command = Command::CreatePots(CreatePotsParams {
            count: 3,
            start_id: 0,
            dry_run: false,
        });
        let output = session.execute(command, pending()).await.unwrap();
        assert!(output.is_success());
        let CommandOutput::Pots { pots, report } = output else {
            panic!("expected pots");
        };
        assert_eq!(pots.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(report.batches.len(), 1);
        assert_eq!(client.submit_count(), 1);
        // Utility.batch_all with three calls
        assert_eq!(&client.submitted()[0][..3], &[9, 2, 12]);
    }

    #[tokio::test]
    async fn test_register_users_verifies_pot() {
        let settings = Settings::default();
        let table = CallIndexTable::default();
        let client = MockClient::with_pots(&[1]);
        let session = Session::new(&settings, &table, Dispatch::Submit(&client));

        let err = session.execute(register(true), pending()).await.unwrap_err();
        assert_eq!(err.kind(), "UnknownPotError");
        assert_eq!(client.submit_count(), 0);
    }

    #[tokio::test]
    async fn test_register_users_submits() {
        let settings = Settings::default();
        let table = CallIndexTable::default();
        let client = MockClient::with_pots(&[0]);
        let session = Session::new(&settings, &table, Dispatch::Submit(&client));

        let output = session.execute(register(true), pending()).await.unwrap();
        let CommandOutput::Users { users, report } = output else {
            panic!("expected users");
        };
        assert_eq!(users.iter().map(|u| u.index).collect::<Vec<_>>(), vec![10, 11, 12]);
        assert!(report.is_success());
        assert_eq!(client.submit_count(), 1);
    }

    #[test]
    fn test_params_validation() {
        let err = RegisterUsersParams::new(0, 1, 0, "", false, true).unwrap_err();
        assert_eq!(err.kind(), "DerivationError");

        let err = ProposeXcmParams::new("xyz", XcmOverrides::default(), true).unwrap_err();
        assert_eq!(err.kind(), "InvalidPayloadError");
    }

    #[test]
    fn test_overrides() {
        let mut settings = XcmSettings::default();
        XcmOverrides {
            ref_time: Some(1),
            origin_kind: Some(OriginKind::Superuser),
            unpaid: true,
            ..XcmOverrides::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.ref_time, 1);
        assert_eq!(settings.proof_size, 1_000_000);
        assert_eq!(settings.origin_kind, OriginKind::Superuser);
        assert_eq!(settings.fee, FeeMode::Unpaid);
    }
}
