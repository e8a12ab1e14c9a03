//! Origin kind argument type for `propose-xcm`

use clap::ValueEnum;
use pot_xcm::xcm::types::OriginKind;

/// CLI argument type for the `Transact` origin kind
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OriginKindArg {
    Native,
    SovereignAccount,
    Superuser,
    Xcm,
}

impl From<OriginKindArg> for OriginKind {
    fn from(arg: OriginKindArg) -> Self {
        match arg {
            OriginKindArg::Native => OriginKind::Native,
            OriginKindArg::SovereignAccount => OriginKind::SovereignAccount,
            OriginKindArg::Superuser => OriginKind::Superuser,
            OriginKindArg::Xcm => OriginKind::Xcm,
        }
    }
}
