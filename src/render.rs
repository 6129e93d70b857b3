//! Turns raw per-endpoint JSON into display lines.

use std::fmt;

use log::warn;
use serde_json::Value;

use crate::directory::EndpointCatalog;
use crate::endpoint::Endpoint;
use crate::query::ResultBundle;
use crate::units::{
    format_bytes, format_count, format_cpu_time, format_minutes_k, format_opt_bytes,
    format_opt_number, format_stream_minutes, format_transformations,
};

pub const NO_DATA: &str = "No data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Bytes,
    Number,
    CpuTime,
    MinutesK,
    StreamMinutes,
    Transformations,
}

impl Format {
    fn apply(self, value: &Value) -> Option<String> {
        // Counts may arrive pre-formatted as strings; bytes and CPU time must be numeric.
        if let Value::String(text) = value {
            return match self {
                Format::Number | Format::StreamMinutes | Format::Transformations => {
                    Some(text.clone())
                }
                Format::Bytes | Format::CpuTime | Format::MinutesK => None,
            };
        }
        // A reported null is a known field without a value; an absent key is not.
        if value.is_null() {
            return match self {
                Format::Bytes => Some(format_opt_bytes(None)),
                Format::Number => Some(format_opt_number(None)),
                _ => None,
            };
        }
        let number = value.as_f64()?;
        Some(match self {
            Format::Bytes => format_bytes(number),
            Format::Number => format_count(number, &value.to_string()),
            Format::CpuTime => format_cpu_time(number),
            Format::MinutesK => format_minutes_k(number),
            Format::StreamMinutes => format_stream_minutes(number),
            Format::Transformations => format_transformations(number),
        })
    }
}

struct Field {
    key: &'static str,
    label: &'static str,
    format: Format,
}

const fn field(key: &'static str, label: &'static str, format: Format) -> Field {
    Field { key, label, format }
}

fn layout(endpoint: &Endpoint) -> Option<&'static [Field]> {
    const DATA_TRANSFER: &[Field] = &[
        field("totalBytes", "Data Transferred", Format::Bytes),
        field("totalRequests", "Total Requests", Format::Number),
    ];
    const WORKERS: &[Field] = &[
        field("requests", "Workers Requests", Format::Number),
        field("cpuTimeUs", "CPU Time", Format::CpuTime),
    ];
    const KV_READ: &[Field] = &[field("reads", "KV Reads", Format::Number)];
    const KV_WRITE: &[Field] = &[field("writes", "KV Writes", Format::Number)];
    const KV_STORAGE: &[Field] = &[
        field("storedBytes", "KV Storage", Format::Bytes),
        field("keyCount", "KV Keys", Format::Number),
    ];
    const STREAM_VIEWED: &[Field] =
        &[field("minutesViewed", "Minutes Viewed", Format::StreamMinutes)];
    const STREAM_STORED: &[Field] = &[field("minutesStored", "Minutes Stored", Format::MinutesK)];
    const IMAGES_TRANSFORMATIONS: &[Field] = &[field(
        "transformations",
        "Transformations",
        Format::Transformations,
    )];
    const IMAGES_STORED: &[Field] = &[field("storedImages", "Images Stored", Format::Number)];
    const IMAGES_DELIVERED: &[Field] =
        &[field("deliveredImages", "Images Delivered", Format::Number)];

    match endpoint {
        Endpoint::DataTransferRequest => Some(DATA_TRANSFER),
        Endpoint::WorkersRequests => Some(WORKERS),
        Endpoint::WorkersKvRead => Some(KV_READ),
        Endpoint::WorkersKvWrite => Some(KV_WRITE),
        Endpoint::WorkersKvStorage => Some(KV_STORAGE),
        Endpoint::StreamMinutesViewed => Some(STREAM_VIEWED),
        Endpoint::StreamMinutesStored => Some(STREAM_STORED),
        Endpoint::ImagesTransformations => Some(IMAGES_TRANSFORMATIONS),
        Endpoint::ImagesStored => Some(IMAGES_STORED),
        Endpoint::ImagesDelivered => Some(IMAGES_DELIVERED),
        Endpoint::Unknown(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLine {
    pub label: &'static str,
    pub value: String,
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Display form of one endpoint's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    Metrics(Vec<MetricLine>),
    NoData,
    ServiceError(String),
    Raw(String),
}

impl Summary {
    pub fn lines(&self) -> Vec<String> {
        match self {
            Summary::Metrics(lines) => lines.iter().map(ToString::to_string).collect(),
            Summary::NoData => vec![NO_DATA.to_string()],
            Summary::ServiceError(message) => vec![format!("Error: {message}")],
            Summary::Raw(dump) => vec![dump.clone()],
        }
    }
}

fn service_error(raw: &Value) -> Option<String> {
    let first = raw.get("errors")?.as_array()?.first()?;
    let message = match first.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => match first {
            Value::String(message) => message.clone(),
            _ => "Unknown error".to_string(),
        },
    };
    Some(message)
}

/// Render one endpoint's raw result.
pub fn render_result(endpoint: &Endpoint, raw: &Value) -> Summary {
    if let Some(message) = service_error(raw) {
        return Summary::ServiceError(message);
    }
    let Some(fields) = layout(endpoint) else {
        return Summary::Raw(
            serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string()),
        );
    };
    if !raw.is_object() {
        if !raw.is_null() {
            warn!("Unexpected result shape for {endpoint}: {raw}");
        }
        return Summary::NoData;
    }

    let mut lines = Vec::with_capacity(fields.len());
    for field in fields {
        match raw.get(field.key).and_then(|value| field.format.apply(value)) {
            Some(value) => lines.push(MetricLine {
                label: field.label,
                value,
            }),
            None => {
                warn!("Unexpected result shape for {endpoint}: {raw}");
                return Summary::NoData;
            }
        }
    }
    Summary::Metrics(lines)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEndpoint {
    pub id: String,
    pub label: String,
    pub summary: Summary,
}

/// Render every entry of a bundle in selection order.
pub fn render_bundle(bundle: &ResultBundle, catalog: &EndpointCatalog) -> Vec<RenderedEndpoint> {
    bundle
        .iter()
        .map(|(id, raw)| {
            let endpoint = Endpoint::from_label(id);
            let label = match catalog.label(id) {
                Some(label) => label.to_string(),
                None => endpoint.default_label().to_string(),
            };
            RenderedEndpoint {
                id: id.to_string(),
                label,
                summary: render_result(&endpoint, raw),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, Once};

    use super::*;
    use serde_json::json;

    static WARNINGS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct CapturingLogger;

    impl log::Log for CapturingLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                WARNINGS.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger;

    fn install_capturing_logger() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(log::LevelFilter::Warn);
        });
    }

    // Tests share the global logger, so each one counts only its own marker.
    fn warnings_mentioning(marker: &str) -> usize {
        WARNINGS
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(marker))
            .count()
    }

    fn lines(endpoint: Endpoint, raw: Value) -> Vec<String> {
        render_result(&endpoint, &raw).lines()
    }

    #[test]
    fn every_known_endpoint_renders_its_canonical_shape() {
        let cases = [
            (
                "data_transfer_request",
                json!({"totalBytes": 2048, "totalRequests": 1500000}),
                vec!["Data Transferred: 2.05 kB", "Total Requests: 1.50MM (1500000)"],
            ),
            (
                "workers_requests",
                json!({"requests": 12345, "cpuTimeUs": 2_500_000_000u64}),
                vec![
                    "Workers Requests: 12,345",
                    "CPU Time: 2.50MM ms (2,500,000 ms)",
                ],
            ),
            (
                "workers_kv_read",
                json!({"reads": 987}),
                vec!["KV Reads: 987"],
            ),
            (
                "workers_kv_write",
                json!({"writes": 5}),
                vec!["KV Writes: 5"],
            ),
            (
                "workers_kv_storage",
                json!({"storedBytes": 1500000, "keyCount": 42}),
                vec!["KV Storage: 1.50 MB", "KV Keys: 42"],
            ),
            (
                "stream_minutes_viewed",
                json!({"minutesViewed": 12346}),
                vec!["Minutes Viewed: 12.35k (12,346)"],
            ),
            (
                "stream_minutes_stored",
                json!({"minutesStored": 500}),
                vec!["Minutes Stored: 0.500k"],
            ),
            (
                "images_transformations",
                json!({"transformations": 1500}),
                vec!["Transformations: 1.50k (1500)"],
            ),
            (
                "images_stored",
                json!({"storedImages": 1234}),
                vec!["Images Stored: 1,234"],
            ),
            (
                "images_delivered",
                json!({"deliveredImages": 2500000}),
                vec!["Images Delivered: 2.50MM (2500000)"],
            ),
        ];

        assert_eq!(cases.len(), Endpoint::KNOWN.len());
        for (id, raw, expected) in cases {
            let endpoint = Endpoint::from_label(id);
            assert!(layout(&endpoint).is_some(), "{id} has no layout");
            assert_eq!(lines(endpoint, raw), expected, "{id}");
        }
    }

    #[test]
    fn null_values_use_placeholders() {
        assert_eq!(
            lines(
                Endpoint::DataTransferRequest,
                json!({"totalBytes": null, "totalRequests": null})
            ),
            ["Data Transferred: 0 B", "Total Requests: N/A"]
        );
        assert_eq!(
            lines(
                Endpoint::WorkersRequests,
                json!({"requests": 10, "cpuTimeUs": null})
            ),
            [NO_DATA]
        );
    }

    #[test]
    fn large_counts_keep_every_raw_digit() {
        let raw: Value =
            serde_json::from_str(r#"{"totalBytes": 0, "totalRequests": 9007199254740993}"#)
                .unwrap();
        assert_eq!(
            lines(Endpoint::DataTransferRequest, raw),
            [
                "Data Transferred: 0 B",
                "Total Requests: 9007199254.74MM (9007199254740993)"
            ]
        );
    }

    #[test]
    fn data_transfer_renders_bytes_and_requests() {
        assert_eq!(
            lines(
                Endpoint::DataTransferRequest,
                json!({"totalBytes": 2048, "totalRequests": 1500000})
            ),
            ["Data Transferred: 2.05 kB", "Total Requests: 1.50MM (1500000)"]
        );
    }

    #[test]
    fn workers_render_cpu_time() {
        assert_eq!(
            lines(
                Endpoint::WorkersRequests,
                json!({"requests": 12345, "cpuTimeUs": 2_500_000_000u64})
            ),
            [
                "Workers Requests: 12,345",
                "CPU Time: 2.50MM ms (2,500,000 ms)"
            ]
        );
    }

    #[test]
    fn stream_and_images_use_thousands() {
        assert_eq!(
            lines(Endpoint::StreamMinutesViewed, json!({"minutesViewed": 42})),
            ["Minutes Viewed: 0.042k (42)"]
        );
        assert_eq!(
            lines(Endpoint::StreamMinutesStored, json!({"minutesStored": 1500})),
            ["Minutes Stored: 1.50k"]
        );
        assert_eq!(
            lines(
                Endpoint::ImagesTransformations,
                json!({"transformations": "unmetered"})
            ),
            ["Transformations: unmetered"]
        );
    }

    #[test]
    fn missing_field_degrades_to_placeholder() {
        install_capturing_logger();

        let summary = render_result(
            &Endpoint::DataTransferRequest,
            &json!({"totalBytesMissingRequests": 2048}),
        );
        assert_eq!(summary, Summary::NoData);
        assert_eq!(summary.lines(), [NO_DATA]);
        assert_eq!(warnings_mentioning("totalBytesMissingRequests"), 1);
    }

    #[test]
    fn non_canonical_kv_shape_is_not_guessed() {
        install_capturing_logger();

        assert_eq!(
            render_result(&Endpoint::WorkersKvRead, &json!(987_654_321)),
            Summary::NoData
        );
        assert_eq!(warnings_mentioning("987654321"), 1);

        let nested = json!({"data": {"viewer": {"accountsByTag": []}}});
        assert_eq!(
            render_result(&Endpoint::WorkersKvRead, &nested),
            Summary::NoData
        );
        assert_eq!(warnings_mentioning("accountsByTag"), 1);
    }

    #[test]
    fn service_errors_pass_through() {
        let raw = json!({"errors": [{"message": "quota exceeded"}, {"message": "second"}]});
        let summary = render_result(&Endpoint::WorkersKvRead, &raw);
        assert_eq!(summary.lines(), ["Error: quota exceeded"]);

        let odd = json!({"errors": [42]});
        assert_eq!(
            render_result(&Endpoint::ImagesStored, &odd),
            Summary::ServiceError("Unknown error".to_string())
        );
    }

    #[test]
    fn unknown_endpoint_dumps_json() {
        let raw = json!({"objects": 3});
        assert_eq!(
            render_result(&Endpoint::from_label("r2_storage"), &raw),
            Summary::Raw("{\n  \"objects\": 3\n}".to_string())
        );
    }

    #[test]
    fn bundle_renders_each_endpoint_independently() {
        let serde_json::Value::Object(response) = json!({
            "data_transfer_request": {"totalBytes": 0, "totalRequests": 10},
            "workers_kv_read": {"errors": [{"message": "boom"}]},
        }) else {
            unreachable!()
        };
        let selected = vec![
            "data_transfer_request".to_string(),
            "workers_kv_read".to_string(),
        ];
        let bundle = ResultBundle::from_response(&selected, response);
        let rendered = render_bundle(&bundle, &EndpointCatalog::builtin());

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].label, "Data Transfer & Requests");
        assert_eq!(
            rendered[0].summary.lines(),
            ["Data Transferred: 0 B", "Total Requests: 10"]
        );
        assert_eq!(rendered[1].summary.lines(), ["Error: boom"]);
    }
}
