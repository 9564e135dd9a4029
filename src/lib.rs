//! modelprobe: empirical capability probing for LLM provider APIs.
//!
//! Sends small test requests to a provider to find out whether a model
//! accepts images and PDFs, and which wire-encoding quirks it needs, then
//! resolves an effective capability vector per (provider, model) from four
//! layered tiers.
//!
//! # Quick Start
//!
//! ```no_run
//! use modelprobe::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> modelprobe::error::Result<()> {
//! let prober = Prober::with_reqwest(ProbeConfig::from_env())?;
//! let cache = CapabilityCache::new();
//! let target = ProbeTarget::new(ProviderKey::OpenAi, "gpt-4o");
//! let result = prober.probe_model(&target, &CancellationToken::new()).await?;
//! cache.update_from_probe_result(&result)?;
//!
//! let caps = cache.get_capabilities("openai", "gpt-4o");
//! println!("vision: {}", caps.supports_vision);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod prelude;
pub mod probe;
pub mod provider;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
