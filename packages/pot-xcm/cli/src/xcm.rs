use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use pot_xcm::command::{Command, CommandOutput, ProposeXcmParams, XcmOverrides};
use pot_xcm::xcm::ProposalOutcome;

use crate::origin::OriginKindArg;
use crate::session::Invocation;

#[derive(Args)]
pub struct ProposeXcmArgs {
    /// Relay-chain call encoded as hex, e.g. "4604ea070000"
    #[arg(short, long)]
    transact: String,
    /// Print the encoded proposal instead of submitting it
    #[arg(long)]
    dry_run: bool,
    /// How the relay chain dispatches the call
    #[arg(long, value_enum)]
    origin_kind: Option<OriginKindArg>,
    /// Weight limit (ref_time) for the call
    #[arg(long)]
    ref_time: Option<u64>,
    /// Weight limit (proof_size) for the call
    #[arg(long)]
    proof_size: Option<u64>,
    /// Parachain receiving refunded fees
    #[arg(long)]
    para_id: Option<u32>,
    /// Use UnpaidExecution instead of buying execution
    #[arg(long)]
    unpaid: bool,
}

pub async fn handle_command(session: &Invocation, args: ProposeXcmArgs) -> Result<bool> {
    let overrides = XcmOverrides {
        ref_time: args.ref_time,
        proof_size: args.proof_size,
        origin_kind: args.origin_kind.map(Into::into),
        para_id: args.para_id,
        unpaid: args.unpaid,
    };
    let params = ProposeXcmParams::new(&args.transact, overrides, args.dry_run)?;

    let CommandOutput::Proposal { proposal, outcome } =
        session.execute(Command::ProposeXcm(params)).await?
    else {
        bail!("unexpected output for propose-xcm");
    };

    match outcome {
        ProposalOutcome::DryRun => println!("{}", proposal.render()),
        ProposalOutcome::Submitted(result) => {
            println!("{}", proposal.call.to_hex());
            eprintln!(
                "{} proposal {:?} in {}",
                "✓".green(),
                result.status,
                result.block_hash.as_deref().unwrap_or("unknown block")
            );
        }
    }
    Ok(true)
}
