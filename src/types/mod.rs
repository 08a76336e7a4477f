pub mod candidate;
pub mod response;

pub use candidate::{CandidateRow, Decision, RowKey, StatusLabel};
pub use response::{
    CandidateEntry, CompanyJobsResponse, DecisionRequest, JobListing, StatusLookupResponse,
    StatusRecord,
};
