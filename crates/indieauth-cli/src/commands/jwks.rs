//! `indieauth jwks`

use std::io::Write;

use indieauth_token::{Jwk, Jwks};
use jsonwebtoken::Algorithm;
use tracing::{info, warn};

use super::{load_jwks, write_json};
use crate::cli::{JwksCommands, KeyAlgorithm};
use crate::config::Settings;

impl From<KeyAlgorithm> for Algorithm {
    fn from(alg: KeyAlgorithm) -> Self {
        match alg {
            KeyAlgorithm::Es256 => Algorithm::ES256,
            KeyAlgorithm::Rs256 => Algorithm::RS256,
            KeyAlgorithm::Rs384 => Algorithm::RS384,
            KeyAlgorithm::Rs512 => Algorithm::RS512,
            KeyAlgorithm::Ps256 => Algorithm::PS256,
            KeyAlgorithm::Ps384 => Algorithm::PS384,
            KeyAlgorithm::Ps512 => Algorithm::PS512,
        }
    }
}

/// Private key set with one `alg` key per kid
pub fn generate(kids: &[String], alg: KeyAlgorithm, bits: usize) -> indieauth_token::Result<Jwks> {
    let keys = kids
        .iter()
        .map(|kid| match alg {
            KeyAlgorithm::Es256 => Ok(Jwk::generate_es256(kid.as_str())),
            rsa => Jwk::generate_rsa(kid.as_str(), rsa.into(), bits),
        })
        .collect::<indieauth_token::Result<Vec<_>>>()?;
    Ok(Jwks::new(keys))
}

pub(crate) fn execute(
    cmd: JwksCommands,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match cmd {
        JwksCommands::Generate { kids, alg, bits } => {
            let jwks = generate(&kids, alg, bits)?;
            info!(kids = ?jwks.kids(), ?alg, "generated JWKS");
            warn!("output contains private keys");
            write_json(out, &jwks)
        }
        JwksCommands::Public { keys } => {
            let jwks = load_jwks(&settings.jwks_or(keys.jwks)?)?;
            write_json(out, &jwks.to_public())
        }
    }
}
