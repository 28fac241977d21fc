//! Job application endpoints

use serde_json::json;

use super::transport::ApiRequest;
use super::wire::{ApplicationResponse, ApplicationsResponse};
use super::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::models::{ApplicationId, JobApplication, UserId};

impl ApiClient {
    /// Apply to an employer for a job (students only)
    pub fn apply_for_job(&self, employer_id: UserId, job_title: &str) -> Result<JobApplication, ApiError> {
        let job_title = job_title.trim();
        if job_title.is_empty() {
            return Err(ValidationError::MissingField("Job title is required").into());
        }

        let request = ApiRequest::post("/jobs/applications")
            .json(json!({ "employer_id": employer_id, "job_title": job_title }));
        let response: ApplicationResponse = self.send_json(request)?;
        Ok(response.application)
    }

    /// Accept an application addressed to the current employer
    pub fn accept_application(&self, id: ApplicationId) -> Result<JobApplication, ApiError> {
        self.decide_application(id, "accept")
    }

    /// Reject an application addressed to the current employer
    pub fn reject_application(&self, id: ApplicationId) -> Result<JobApplication, ApiError> {
        self.decide_application(id, "reject")
    }

    /// Students see their own applications; employers see those sent to them
    pub fn list_applications(&self) -> Result<Vec<JobApplication>, ApiError> {
        let response: ApplicationsResponse = self.send_json(ApiRequest::get("/jobs/applications"))?;
        Ok(response.applications)
    }

    fn decide_application(&self, id: ApplicationId, decision: &str) -> Result<JobApplication, ApiError> {
        let request = ApiRequest::post(format!("/jobs/applications/{}/{}", id, decision));
        let response: ApplicationResponse = self.send_json(request)?;
        Ok(response.application)
    }
}
