use anyhow::{bail, Result};
use clap::Args;
use pot_xcm::command::{Command, CommandOutput, CreatePotsParams, RegisterUsersParams};

use crate::report::print_report;
use crate::session::Invocation;

#[derive(Args)]
pub struct CreatePotsArgs {
    /// Number of pots to create
    #[arg(short = 'p', long = "pots", default_value_t = 1)]
    count: u32,
    /// Id of the first pot
    #[arg(short = 's', long, default_value_t = 0)]
    start_id: u32,
    /// Print the encoded batches instead of submitting them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
pub struct RegisterUsersArgs {
    /// Pot the users belong to
    #[arg(long)]
    pot_id: u32,
    /// Number of users to register
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,
    /// Index of the first user
    #[arg(short = 's', long, default_value_t = 0)]
    start_offset: u32,
    /// Root secret the users are derived from (mnemonic, hex seed or secret URI)
    #[arg(long, env = "POT_XCM_SEED", hide_env_values = true)]
    seed: String,
    /// Check that the pot exists on chain first
    #[arg(long)]
    verify_pot: bool,
    /// Print the encoded batches instead of submitting them
    #[arg(long)]
    dry_run: bool,
}

pub async fn handle_create_pots(session: &Invocation, args: CreatePotsArgs) -> Result<bool> {
    let command = Command::CreatePots(CreatePotsParams {
        count: args.count,
        start_id: args.start_id,
        dry_run: args.dry_run,
    });

    let CommandOutput::Pots { pots, report } = session.execute(command).await? else {
        bail!("unexpected output for create-pots");
    };
    for pot in &pots {
        println!("{}", pot.id);
    }
    print_report(&report);
    Ok(report.is_success())
}

pub async fn handle_register_users(session: &Invocation, args: RegisterUsersArgs) -> Result<bool> {
    let params = RegisterUsersParams::new(
        args.pot_id,
        args.count,
        args.start_offset,
        &args.seed,
        args.verify_pot,
        args.dry_run,
    )?;

    let CommandOutput::Users { users, report } =
        session.execute(Command::RegisterUsers(params)).await?
    else {
        bail!("unexpected output for register-users");
    };
    for user in &users {
        println!("{} {}", user.path(), user.address());
    }
    print_report(&report);
    Ok(report.is_success())
}
