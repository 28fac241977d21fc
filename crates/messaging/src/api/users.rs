//! Users endpoints

use super::transport::ApiRequest;
use super::wire::StudentsResponse;
use super::ApiClient;
use crate::error::ApiError;
use crate::models::User;

impl ApiClient {
    /// List all students (employer-only on the server)
    pub fn list_students(&self) -> Result<Vec<User>, ApiError> {
        let response: StudentsResponse = self.send_json(ApiRequest::get("/users/students"))?;
        Ok(response.students)
    }
}
