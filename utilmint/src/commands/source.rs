// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use std::path::Path;

use super::{print_outcome, Session};
use crate::request::Request;
use crate::types::AccountName;

/// Authorize `account` to submit reports
pub fn add(config_path: &Path, caller: Option<&AccountName>, account: AccountName) -> Result<()> {
    let session = Session::open(config_path)?;
    let outcome = session.execute(caller, &Request::AddSource { account })?;
    print_outcome(&outcome);
    Ok(())
}

/// Revoke `account`'s reporting authorization
pub fn remove(
    config_path: &Path,
    caller: Option<&AccountName>,
    account: AccountName,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let outcome = session.execute(caller, &Request::RemoveSource { account })?;
    print_outcome(&outcome);
    Ok(())
}

/// Show whether `account` is an authorized source
pub fn check(config_path: &Path, caller: Option<&AccountName>, account: &AccountName) -> Result<()> {
    let session = Session::open(config_path)?;
    let state = session
        .store
        .load_state()
        .context("Failed to load engine state")?;

    let caller = caller.unwrap_or(&session.config.admin);
    let authorized = session.engine.is_source(&state, caller, account)?;
    if authorized {
        println!("{} is an authorized source", account);
    } else {
        println!("{} is not an authorized source", account);
    }
    Ok(())
}

/// List authorized sources
pub fn list(config_path: &Path) -> Result<()> {
    let session = Session::open(config_path)?;
    let state = session
        .store
        .load_state()
        .context("Failed to load engine state")?;

    if state.sources.is_empty() {
        println!("No authorized sources");
        return Ok(());
    }
    for source in state.sources.iter() {
        println!("{}", source);
    }
    Ok(())
}
