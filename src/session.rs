// src/session.rs
use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};

use crate::app_log;

/// Company identity of the authenticated reviewer.
///
/// Set once when a session starts and cleared on logout. Cloned handles
/// share the same slot, so a controller built with one observes sign-out.
#[derive(Debug, Clone, Default)]
pub struct CompanySession {
    company_id: Arc<RwLock<Option<String>>>,
}

impl CompanySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already signed in to `company_id`
    pub fn for_company(company_id: &str) -> Result<Self> {
        let session = Self::new();
        session.sign_in(company_id)?;
        Ok(session)
    }

    pub fn sign_in(&self, company_id: &str) -> Result<()> {
        let company_id = company_id.trim();
        if company_id.is_empty() {
            anyhow::bail!("Company identifier must not be empty");
        }

        let mut slot = self.company_id.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_deref() {
            Some(current) if current == company_id => Ok(()),
            Some(current) => anyhow::bail!(
                "Session already belongs to company {}; sign out first",
                current
            ),
            None => {
                app_log!(info, "Session started for company {}", company_id);
                *slot = Some(company_id.to_string());
                Ok(())
            }
        }
    }

    pub fn sign_out(&self) {
        let mut slot = self.company_id.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(company_id) = slot.take() {
            app_log!(info, "Session ended for company {}", company_id);
        }
    }

    pub fn company_id(&self) -> Option<String> {
        self.company_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
