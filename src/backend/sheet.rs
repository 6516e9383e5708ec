use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};

use crate::models::booking::BookingRecord;

use super::{BackendError, PersistenceBackend};

/// Backend for a hosted spreadsheet-style API. Rows live under
/// `{base_url}/rows`: GET returns the full JSON array, POST appends one row,
/// PUT replaces the whole range. Authentication is a bearer token.
pub struct SheetBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl SheetBackend {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| BackendError::Unavailable(format!("failed to build client: {}", err)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn rows_url(&self) -> String {
        format!("{}/rows", self.base_url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

impl PersistenceBackend for SheetBackend {
    fn load(&self) -> Result<Vec<BookingRecord>, BackendError> {
        let response = self
            .authed(self.client.get(self.rows_url()))
            .send()
            .map_err(|err| BackendError::Unavailable(format!("sheet unreachable: {}", err)))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| BackendError::Unavailable(format!("failed to read sheet: {}", err)))?;
        if !status.is_success() {
            return Err(BackendError::Unavailable(format!(
                "sheet read failed with status {}: {}",
                status, text
            )));
        }
        serde_json::from_str(&text).map_err(|err| {
            BackendError::Unavailable(format!("sheet returned unparsable rows: {}", err))
        })
    }

    fn append(&self, record: &BookingRecord) -> Result<(), BackendError> {
        let response = self
            .authed(self.client.post(self.rows_url()))
            .json(record)
            .send()
            .map_err(|err| BackendError::Unavailable(format!("sheet unreachable: {}", err)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(BackendError::Rejected(format!(
                "sheet append failed with status {}: {}",
                status, text
            )));
        }
        Ok(())
    }

    fn replace_all(&self, records: &[BookingRecord]) -> Result<(), BackendError> {
        let response = self
            .authed(self.client.put(self.rows_url()))
            .json(&records)
            .send()
            .map_err(|err| BackendError::Unavailable(format!("sheet unreachable: {}", err)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(BackendError::Rejected(format!(
                "sheet replace failed with status {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}
