//! `indieauth pkce`

use std::io::Write;

use indieauth_pkce::{ChallengeMethod, PkcePair, code_challenge, code_verifier};
use serde_json::json;

use super::write_json;
use crate::cli::{Method, PkceCommands};

impl From<Method> for ChallengeMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Plain => ChallengeMethod::Plain,
            Method::S256 => ChallengeMethod::S256,
        }
    }
}

pub(crate) fn execute(cmd: PkceCommands, out: &mut dyn Write) -> anyhow::Result<()> {
    match cmd {
        PkceCommands::Verifier { length, seed } => {
            writeln!(out, "{}", code_verifier(length, seed)?)?;
        }
        PkceCommands::Challenge { verifier, method } => {
            writeln!(out, "{}", code_challenge(&verifier, method.into()))?;
        }
        PkceCommands::Pair { length, method } => {
            let pair = PkcePair::generate(length, method.into())?;
            write_json(
                out,
                &json!({
                    "code_verifier": pair.code_verifier,
                    "code_challenge": pair.code_challenge,
                    "code_challenge_method": pair.method.as_str(),
                }),
            )?;
        }
    }
    Ok(())
}
