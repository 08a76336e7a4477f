// src/web/session.rs
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;

use crate::app_log;

/// Header set by the upstream authentication layer
pub const COMPANY_HEADER: &str = "X-Company-Id";

/// Company the request acts for
pub struct CompanyIdentity(pub String);

impl CompanyIdentity {
    pub fn company_id(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub enum SessionError {
    MissingCompany,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CompanyIdentity {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req
            .headers()
            .get_one(COMPANY_HEADER)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(company_id) => Outcome::Success(CompanyIdentity(company_id.to_string())),
            None => {
                app_log!(warn, "Request to {} without company identity", req.uri());
                Outcome::Error((Status::Unauthorized, SessionError::MissingCompany))
            }
        }
    }
}
