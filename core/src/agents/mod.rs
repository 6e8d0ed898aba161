pub mod config;
pub mod orchestrator;
pub mod providers;
pub mod transport;

pub use config::{GenerateOptions, ProviderConfig, ProviderKind};
pub use orchestrator::{HealthStatus, ModelAdapter, REQUEST_TIMEOUT};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
