use std::fmt;

/// A usage metric the reporting service knows how to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    DataTransferRequest,
    WorkersRequests,
    WorkersKvRead,
    WorkersKvWrite,
    WorkersKvStorage,
    StreamMinutesViewed,
    StreamMinutesStored,
    ImagesTransformations,
    ImagesStored,
    ImagesDelivered,
    Unknown(String),
}

impl Endpoint {
    pub const KNOWN: [Endpoint; 10] = [
        Endpoint::DataTransferRequest,
        Endpoint::WorkersRequests,
        Endpoint::WorkersKvRead,
        Endpoint::WorkersKvWrite,
        Endpoint::WorkersKvStorage,
        Endpoint::StreamMinutesViewed,
        Endpoint::StreamMinutesStored,
        Endpoint::ImagesTransformations,
        Endpoint::ImagesStored,
        Endpoint::ImagesDelivered,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Endpoint::DataTransferRequest => "data_transfer_request",
            Endpoint::WorkersRequests => "workers_requests",
            Endpoint::WorkersKvRead => "workers_kv_read",
            Endpoint::WorkersKvWrite => "workers_kv_write",
            Endpoint::WorkersKvStorage => "workers_kv_storage",
            Endpoint::StreamMinutesViewed => "stream_minutes_viewed",
            Endpoint::StreamMinutesStored => "stream_minutes_stored",
            Endpoint::ImagesTransformations => "images_transformations",
            Endpoint::ImagesStored => "images_stored",
            Endpoint::ImagesDelivered => "images_delivered",
            Endpoint::Unknown(raw) => raw,
        }
    }

    /// Human-readable label used when the catalog has none.
    pub fn default_label(&self) -> &str {
        match self {
            Endpoint::DataTransferRequest => "Data Transfer & Requests",
            Endpoint::WorkersRequests => "Workers Requests",
            Endpoint::WorkersKvRead => "Workers KV Reads",
            Endpoint::WorkersKvWrite => "Workers KV Writes",
            Endpoint::WorkersKvStorage => "Workers KV Storage",
            Endpoint::StreamMinutesViewed => "Stream Minutes Viewed",
            Endpoint::StreamMinutesStored => "Stream Minutes Stored",
            Endpoint::ImagesTransformations => "Images Transformations",
            Endpoint::ImagesStored => "Images Stored",
            Endpoint::ImagesDelivered => "Images Delivered",
            Endpoint::Unknown(raw) => raw,
        }
    }

    pub fn from_label(raw: &str) -> Self {
        Endpoint::KNOWN
            .into_iter()
            .find(|known| known.as_str() == raw)
            .unwrap_or_else(|| Endpoint::Unknown(raw.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
