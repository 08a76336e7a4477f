// src/web/registry.rs
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::app_log;
use crate::core::ReviewApi;
use crate::environment::ReviewConfig;
use crate::reconciler::CandidateReconciler;
use crate::session::CompanySession;

/// One review controller per signed-in company
pub struct ReviewRegistry {
    api: Arc<dyn ReviewApi>,
    config: ReviewConfig,
    controllers: Mutex<HashMap<String, Arc<CandidateReconciler>>>,
}

impl ReviewRegistry {
    pub fn new(api: Arc<dyn ReviewApi>, config: ReviewConfig) -> Self {
        Self {
            api,
            config,
            controllers: Mutex::new(HashMap::new()),
        }
    }

    /// Controller for `company_id`, and whether it was just created
    pub async fn controller(&self, company_id: &str) -> Result<(Arc<CandidateReconciler>, bool)> {
        let mut controllers = self.controllers.lock().await;
        if let Some(controller) = controllers.get(company_id) {
            return Ok((controller.clone(), false));
        }

        let session = CompanySession::for_company(company_id)?;
        let controller = Arc::new(CandidateReconciler::new(
            self.api.clone(),
            session,
            &self.config,
        ));
        controllers.insert(company_id.to_string(), controller.clone());
        app_log!(info, "Created review controller for company {}", company_id);
        Ok((controller, true))
    }

    /// Tear down the company's controller; false if there was none
    pub async fn logout(&self, company_id: &str) -> bool {
        let removed = self.controllers.lock().await.remove(company_id);
        match removed {
            Some(controller) => {
                controller.reset().await;
                controller.session().sign_out();
                true
            }
            None => false,
        }
    }
}
