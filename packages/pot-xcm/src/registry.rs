//! Pots and their users for one invocation
//!
//! The registry only tracks logical identity. Whether a pot exists on chain
//! is a question for [`crate::client::ChainClient::pot_exists`].

use crate::derive::{AddressDeriver, DerivationPath, DerivedAccount};
use crate::error::PotXcmError;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use subxt_signer::sr25519::Keypair;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pot {
    pub id: u32,
    /// One past the highest user index registered so far
    pub user_count: u32,
}

/// A derived account inside a pot
pub struct User {
    pub pot_id: u32,
    pub index: u32,
    account: DerivedAccount,
}

impl User {
    pub fn address(&self) -> &str {
        &self.account.address
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.account.public_key
    }

    pub fn path(&self) -> DerivationPath {
        self.account.path
    }

    pub fn keypair(&self) -> &Keypair {
        self.account.keypair()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("pot_id", &self.pot_id)
            .field("index", &self.index)
            .field("address", &self.account.address)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct PotRegistry {
    pots: BTreeMap<u32, Pot>,
}

impl PotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `count` pots with ids `start_id..start_id + count`
    pub fn create_pots(&mut self, count: u32, start_id: u32) -> Result<Vec<Pot>, PotXcmError> {
        let ids = index_range(count, start_id, "pot id")?;

        if let Some(taken) = ids.clone().find(|id| self.pots.contains_key(id)) {
            return Err(PotXcmError::InvalidRange(format!(
                "pot {} already exists in this run",
                taken
            )));
        }

        let pots: Vec<Pot> = ids.map(|id| Pot { id, user_count: 0 }).collect();
        for pot in &pots {
            self.pots.insert(pot.id, *pot);
        }
        debug!(count, start_id, "pots created");
        Ok(pots)
    }

    /// Admit a pot created by an earlier run
    pub fn adopt_pot(&mut self, pot_id: u32) -> Pot {
        *self.pots.entry(pot_id).or_insert(Pot {
            id: pot_id,
            user_count: 0,
        })
    }

    pub fn pot(&self, pot_id: u32) -> Option<&Pot> {
        self.pots.get(&pot_id)
    }

    pub fn pots(&self) -> impl Iterator<Item = &Pot> {
        self.pots.values()
    }

    /// Derive `count` users of `pot_id` with indices `start_offset..start_offset + count`
    ///
    /// All accounts are derived before anything is recorded, so a failure
    /// leaves the registry untouched.
    pub fn register_users(
        &mut self,
        deriver: &AddressDeriver,
        pot_id: u32,
        count: u32,
        start_offset: u32,
    ) -> Result<Vec<User>, PotXcmError> {
        let pot = self
            .pots
            .get_mut(&pot_id)
            .ok_or(PotXcmError::UnknownPot(pot_id))?;
        let indices = index_range(count, start_offset, "user index")?;
        let last = *indices.end();

        let users = indices
            .map(|index| {
                deriver.derive(pot_id, index).map(|account| User {
                    pot_id,
                    index,
                    account,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        pot.user_count = pot.user_count.max(last.saturating_add(1));
        debug!(pot_id, count, start_offset, "users derived");
        Ok(users)
    }
}

fn index_range(count: u32, start: u32, what: &str) -> Result<RangeInclusive<u32>, PotXcmError> {
    if count == 0 {
        return Err(PotXcmError::InvalidRange(
            "count must be at least 1".to_string(),
        ));
    }
    let last = start.checked_add(count - 1).ok_or_else(|| {
        PotXcmError::InvalidRange(format!(
            "{} range {}+{} overflows u32",
            what, start, count
        ))
    })?;
    Ok(start..=last)
}
