pub mod cli;
pub mod cli_helpers;
pub mod client;
pub mod config;
pub mod directory;
pub mod endpoint;
pub mod locale;
pub mod query;
pub mod render;
pub mod units;

pub use client::{ClientError, ReportingClient};
pub use config::{load_config, resolve_config_path, Config};
pub use directory::{
    AccountDirectory, Directories, EndpointCatalog, EndpointEntry, ZoneDirectory,
};
pub use endpoint::Endpoint;
pub use locale::Locale;
pub use query::{
    build_request, QueryController, QueryError, QueryRequest, ResultBundle, Selection,
    ValidationError,
};
pub use render::{render_bundle, render_result, Summary};
