// Copyright (c) 2024 Botho Foundation

//! Accounts allowed to submit usage reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ResourceError;
use crate::types::AccountName;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRegistry {
    sources: BTreeSet<AccountName>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, id: AccountName) -> Result<(), ResourceError> {
        if self.sources.contains(&id) {
            return Err(ResourceError::SourceAlreadyAuthorized(id));
        }
        self.sources.insert(id);
        Ok(())
    }

    pub fn remove_source(&mut self, id: &AccountName) -> Result<(), ResourceError> {
        if !self.sources.remove(id) {
            return Err(ResourceError::SourceNotFound(id.clone()));
        }
        Ok(())
    }

    pub fn is_source(&self, id: &AccountName) -> bool {
        self.sources.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountName> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<AccountName> for SourceRegistry {
    fn from_iter<T: IntoIterator<Item = AccountName>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}
