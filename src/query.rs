//! Selection validation, request building and the single-flight query
//! controller.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{ClientError, ReportingClient};
use crate::directory::Directories;
use crate::locale::Locale;
use crate::units::format_date;

/// What the operator picked. Every field is required before a submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub customer: Option<String>,
    pub endpoints: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a customer")]
    MissingCustomer,
    #[error("Please select a start date")]
    MissingStartDate,
    #[error("Please select an end date")]
    MissingEndDate,
    #[error("Please select at least one endpoint")]
    MissingEndpoints,
    #[error("Unknown customer: {0}")]
    UnknownCustomer(String),
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl ValidationError {
    pub fn message(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.to_string(),
            Locale::Ko => match self {
                ValidationError::MissingCustomer => "고객을 선택해 주세요".to_string(),
                ValidationError::MissingStartDate => "시작일을 선택해 주세요".to_string(),
                ValidationError::MissingEndDate => "종료일을 선택해 주세요".to_string(),
                ValidationError::MissingEndpoints => {
                    "엔드포인트를 하나 이상 선택해 주세요".to_string()
                }
                ValidationError::UnknownCustomer(name) => format!("알 수 없는 고객입니다: {name}"),
                ValidationError::EndBeforeStart { start, end } => {
                    format!("종료일({end})이 시작일({start})보다 빠릅니다")
                }
            },
        }
    }
}

impl Selection {
    /// Check the four required inputs. Needs no directory data, so it can run
    /// before anything touches the network.
    pub fn check_required(&self) -> Result<(), ValidationError> {
        if self.customer.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(ValidationError::MissingCustomer);
        }
        let start = self.start.ok_or(ValidationError::MissingStartDate)?;
        let end = self.end.ok_or(ValidationError::MissingEndDate)?;
        if self.endpoints.iter().all(|id| id.trim().is_empty()) {
            return Err(ValidationError::MissingEndpoints);
        }
        if end < start {
            return Err(ValidationError::EndBeforeStart { start, end });
        }
        Ok(())
    }
}

/// Body of the query POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub account_tag: String,
    pub customer_name: String,
    pub start_date: String,
    pub end_date: String,
    pub endpoints: Vec<String>,
    pub zone_ids: Vec<String>,
}

pub fn build_request(
    selection: &Selection,
    directories: &Directories,
) -> Result<QueryRequest, ValidationError> {
    selection.check_required()?;
    let (Some(customer), Some(start), Some(end)) =
        (selection.customer.as_deref(), selection.start, selection.end)
    else {
        return Err(ValidationError::MissingCustomer);
    };
    let customer = customer.trim();
    let account_tag = directories
        .accounts
        .account_tag(customer)
        .ok_or_else(|| ValidationError::UnknownCustomer(customer.to_string()))?;

    let selected: Vec<String> = selection
        .endpoints
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let endpoints = directories.catalog.expand(&selected);
    if endpoints.is_empty() {
        return Err(ValidationError::MissingEndpoints);
    }

    Ok(QueryRequest {
        account_tag: account_tag.to_string(),
        customer_name: customer.to_string(),
        start_date: format_date(start),
        end_date: format_date(end),
        endpoints,
        zone_ids: directories.zones.zone_ids(customer).to_vec(),
    })
}

/// Results of one query, restricted to the endpoints that were asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultBundle {
    order: Vec<String>,
    results: BTreeMap<String, Value>,
}

impl ResultBundle {
    pub fn from_response(selected: &[String], response: Map<String, Value>) -> Self {
        let mut results = BTreeMap::new();
        for (key, value) in response {
            if selected.contains(&key) {
                results.insert(key, value);
            } else {
                warn!("Dropping result for unrequested endpoint {key}");
            }
        }
        ResultBundle {
            order: selected.to_vec(),
            results,
        }
    }

    /// Entries in selection order; endpoints without a result are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|id| self.results.get(id).map(|value| (id.as_str(), value)))
    }

    pub fn get(&self, endpoint: &str) -> Option<&Value> {
        self.results.get(endpoint)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(id, value)| (id.to_string(), value.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a query is already in flight")]
    Busy,
    #[error(transparent)]
    Request(#[from] ClientError),
}

impl QueryError {
    /// Operator-facing message. Request failures collapse into one generic
    /// message; details go to the debug log.
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            QueryError::Invalid(err) => err.message(locale),
            QueryError::Busy => locale.request_in_flight().to_string(),
            QueryError::Request(_) => locale.request_failed().to_string(),
        }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Submits queries, at most one at a time.
#[derive(Debug)]
pub struct QueryController {
    client: ReportingClient,
    in_flight: AtomicBool,
}

impl QueryController {
    pub fn new(client: ReportingClient) -> Self {
        QueryController {
            client,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &ReportingClient {
        &self.client
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate, then issue exactly one POST. An invalid selection or a
    /// submit while another is running never reaches the network.
    pub async fn submit(
        &self,
        selection: &Selection,
        directories: &Directories,
    ) -> Result<ResultBundle, QueryError> {
        let request = build_request(selection, directories)?;
        let _guard = InFlight::acquire(&self.in_flight).ok_or(QueryError::Busy)?;
        info!(
            "Querying {} endpoints for {} ({} to {})",
            request.endpoints.len(),
            request.customer_name,
            request.start_date,
            request.end_date
        );
        let response = self.client.execute_query(&request).await?;
        Ok(ResultBundle::from_response(&request.endpoints, response))
    }
}
