//! `setup`: validate a host + token and persist a new entry.

use secrecy::SecretString;

use thingsbridge_core::validate_input;

use crate::cli::{GlobalOpts, SetupArgs};
use crate::config::{self, TokenSource};
use crate::error::CliError;
use crate::output::Printer;

use super::util;

pub async fn handle(args: SetupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;
    let (token, source) = resolve_token(&args)?;
    let http = config::transport(&cfg, global).build_client()?;

    let bar = util::spinner(&format!("Connecting to {}", args.host), global.quiet);
    let validated = validate_input(&http, &args.host, &token).await;
    bar.finish_and_clear();
    let validated = validated?;

    let entry_id = cfg.add_entry(&validated, &token, source)?;
    config::save(&cfg, global)?;

    let printer = Printer::new(global);
    printer.note(&format!("Created entry for {}", validated.title));
    printer.line(&entry_id);
    Ok(())
}

/// Token from `--token`, `--token-env`, or an interactive prompt.
fn resolve_token(args: &SetupArgs) -> Result<(SecretString, TokenSource), CliError> {
    if let Some(ref token) = args.token {
        return Ok((
            SecretString::from(token.clone()),
            TokenSource::Plaintext(token.clone()),
        ));
    }

    if let Some(ref name) = args.token_env {
        let token = std::env::var(name).map_err(|_| CliError::Validation {
            field: "token-env".into(),
            reason: format!("environment variable {name} is not set"),
        })?;
        return Ok((SecretString::from(token), TokenSource::Env(name.clone())));
    }

    let token = rpassword::prompt_password("Device access token: ")?;
    if token.trim().is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "access token is required".into(),
        });
    }
    Ok((SecretString::from(token.clone()), TokenSource::Plaintext(token)))
}
