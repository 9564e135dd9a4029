//! Provider adapter: endpoints, headers and message shapes per provider.

pub mod endpoint;
pub mod fixtures;
pub mod http;
pub mod key;
pub mod messages;

pub use endpoint::{default_base_url, provider_endpoint};
pub use fixtures::{image_media, pdf_media, MediaPayload, MediaSource};
pub use http::provider_headers;
pub use key::{provider_requires_api_key, provider_requires_endpoint, ProviderFamily, ProviderKey};
pub use messages::{build_messages, build_probe_body, ContentType};
