//! Deterministic sr25519 account derivation
//!
//! Every user account is derived from one root secret along the path
//! `//{pot_id}/{user_index}`: a hard junction for the pot and a soft junction
//! for the user. Numeric junctions are SCALE-encoded as `u64`, which is how
//! Substrate tooling parses `//0/5` in a secret URI, so
//! `subkey inspect "<seed>//0/5"` yields the same account.

use crate::address::encode_ss58;
use crate::error::PotXcmError;
use std::fmt;
use std::str::FromStr;
use subxt_signer::{sr25519::Keypair, DeriveJunction, SecretUri};

/// Root secret for one invocation: mnemonic, `0x` hex seed or secret URI
pub struct Seed {
    uri: SecretUri,
}

impl Seed {
    pub fn parse(secret: &str) -> Result<Self, PotXcmError> {
        if secret.trim().is_empty() {
            return Err(PotXcmError::Derivation("seed must not be empty".to_string()));
        }
        let uri = SecretUri::from_str(secret)
            .map_err(|e| PotXcmError::Derivation(format!("malformed seed: {}", e)))?;
        Ok(Self { uri })
    }

    /// Keypair of the secret itself, e.g. the signing account
    pub fn keypair(&self) -> Result<Keypair, PotXcmError> {
        Keypair::from_uri(&self.uri)
            .map_err(|e| PotXcmError::Derivation(format!("malformed seed: {}", e)))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// Location of one user account below the root secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DerivationPath {
    pub pot_id: u32,
    pub user_index: u32,
}

impl DerivationPath {
    pub fn new(pot_id: u32, user_index: u32) -> Self {
        Self { pot_id, user_index }
    }

    fn junctions(&self) -> [DeriveJunction; 2] {
        [
            DeriveJunction::hard(self.pot_id as u64),
            DeriveJunction::soft(self.user_index as u64),
        ]
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}/{}", self.pot_id, self.user_index)
    }
}

impl FromStr for DerivationPath {
    type Err = PotXcmError;

    /// Parse the `//{pot_id}/{user_index}` notation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PotXcmError::Derivation(format!("malformed derivation path: {}", s));

        let rest = s.strip_prefix("//").ok_or_else(malformed)?;
        let (pot, user) = rest.split_once('/').ok_or_else(malformed)?;
        if user.starts_with('/') {
            return Err(malformed());
        }

        let segment = |value: &str| {
            value.parse::<u32>().map_err(|e| {
                PotXcmError::Derivation(format!("path segment {:?} is not a u32: {}", value, e))
            })
        };
        Ok(Self::new(segment(pot)?, segment(user)?))
    }
}

/// A derived user account and its keys
pub struct DerivedAccount {
    pub path: DerivationPath,
    pub public_key: [u8; 32],
    pub address: String,
    keypair: Keypair,
}

impl DerivedAccount {
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for DerivedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedAccount")
            .field("path", &self.path)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derives pot user accounts from a root secret
///
/// The root keypair is computed once; each [`AddressDeriver::derive`] call is
/// then a pure function of `(pot_id, user_index)`.
pub struct AddressDeriver {
    root: Keypair,
    ss58_prefix: u16,
}

impl AddressDeriver {
    pub fn new(seed: Seed, ss58_prefix: u16) -> Result<Self, PotXcmError> {
        let root = seed.keypair()?;
        // Fail early on a prefix that cannot be encoded
        encode_ss58(&root.public_key().0, ss58_prefix)?;
        Ok(Self { root, ss58_prefix })
    }

    pub fn ss58_prefix(&self) -> u16 {
        self.ss58_prefix
    }

    /// Address of the root secret itself
    pub fn root_address(&self) -> Result<String, PotXcmError> {
        encode_ss58(&self.root.public_key().0, self.ss58_prefix)
    }

    pub fn derive(&self, pot_id: u32, user_index: u32) -> Result<DerivedAccount, PotXcmError> {
        self.derive_path(DerivationPath::new(pot_id, user_index))
    }

    pub fn derive_path(&self, path: DerivationPath) -> Result<DerivedAccount, PotXcmError> {
        let keypair = self.root.derive(path.junctions());
        let public_key = keypair.public_key().0;
        let address = encode_ss58(&public_key, self.ss58_prefix)?;
        Ok(DerivedAccount {
            path,
            public_key,
            address,
            keypair,
        })
    }
}

impl fmt::Debug for AddressDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressDeriver")
            .field("ss58_prefix", &self.ss58_prefix)
            .finish_non_exhaustive()
    }
}
