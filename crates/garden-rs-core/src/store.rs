//! Record store client for the spreadsheet-backed endpoint.

use crate::draft::NewRecord;
use crate::error::StoreError;
use async_trait::async_trait;
use garden_rs_config::GardenConfig;
use garden_rs_protocol::{
    BackendReply, CreateForm, MemoryRecord, RecordId, RecordRow, WaterForm,
};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

/// Records returned by a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub records: Vec<MemoryRecord>,
    /// Rows dropped because they could not be read as records.
    pub skipped: usize,
}

/// Result of a successful create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Created {
    /// Id the backend assigned, when it reported one.
    pub assigned_id: Option<RecordId>,
}

/// Remote storage for memories. Records are append-only: there is no
/// edit or delete.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every record.
    async fn list_records(&self) -> Result<Listing, StoreError>;

    /// Submit a new record.
    async fn create_record(&self, record: &NewRecord) -> Result<Created, StoreError>;

    /// Mark a record as freshly watered.
    async fn water_record(&self, id: &RecordId) -> Result<(), StoreError>;
}

/// Turn a listing payload into records, skipping rows that cannot be read.
///
/// Anything other than a JSON array is treated as an empty listing.
pub fn parse_listing(payload: Value) -> Listing {
    let rows = match payload {
        Value::Array(rows) => rows,
        other => {
            warn!("listing payload is not an array; treating as empty (payload={other})");
            return Listing::default();
        }
    };

    let mut listing = Listing::default();
    for (index, raw) in rows.into_iter().enumerate() {
        let row: RecordRow = match serde_json::from_value(raw) {
            Ok(row) => row,
            Err(err) => {
                warn!("skipping unreadable row (index={index}, error={err})");
                listing.skipped += 1;
                continue;
            }
        };
        if !row.has_known_icon() {
            warn!(
                "unknown icon, falling back to 1 (index={index}, icon={})",
                row.icon
            );
        }
        match row.into_record() {
            Ok(record) => listing.records.push(record),
            Err(err) => {
                warn!("skipping row (index={index}, error={err})");
                listing.skipped += 1;
            }
        }
    }
    listing
}

/// Interpret a `POST` reply body.
pub fn parse_reply(payload: Value) -> Result<BackendReply, StoreError> {
    let reply: BackendReply = serde_json::from_value(payload.clone())?;
    if reply.success {
        return Ok(reply);
    }
    let message = reply
        .error
        .filter(|error| !error.is_empty())
        .unwrap_or_else(|| payload.to_string());
    Err(StoreError::Backend(message))
}

/// HTTP implementation of [`RecordStore`].
#[derive(Clone, Debug)]
pub struct HttpRecordStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecordStore {
    /// Create a store for an endpoint using default client settings.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_user_agent(endpoint, None)
    }

    /// Create a store from the configured backend.
    pub fn from_config(config: &GardenConfig) -> Result<Self, StoreError> {
        let endpoint = config.require_endpoint()?;
        Self::with_user_agent(endpoint, config.backend.user_agent.as_deref())
    }

    fn with_user_agent(
        endpoint: impl Into<String>,
        user_agent: Option<&str>,
    ) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_form<F: Serialize + Sync>(&self, form: &F) -> Result<BackendReply, StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(form)
            .send()
            .await?;
        let payload = Self::read_json(response).await?;
        parse_reply(payload)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_records(&self) -> Result<Listing, StoreError> {
        debug!("listing records (endpoint={})", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        let payload = Self::read_json(response).await?;
        let listing = parse_listing(payload);
        debug!(
            "listed records (count={}, skipped={})",
            listing.records.len(),
            listing.skipped
        );
        Ok(listing)
    }

    async fn create_record(&self, record: &NewRecord) -> Result<Created, StoreError> {
        record.ensure_valid()?;
        debug!(
            "creating record (position={}, icon={}, title_len={})",
            record.position,
            record.icon,
            record.title.len()
        );
        let form = CreateForm::new(record.position, &record.title, &record.body, record.icon);
        let reply = self.post_form(&form).await?;
        Ok(Created {
            assigned_id: reply
                .lastwatered
                .filter(|id| !id.trim().is_empty())
                .map(RecordId::new),
        })
    }

    async fn water_record(&self, id: &RecordId) -> Result<(), StoreError> {
        debug!("watering record (id={id})");
        self.post_form(&WaterForm::new(id)).await?;
        Ok(())
    }
}
