//! Per-model probe runs and bounded-concurrency bulk runs.

use std::sync::Arc;
use std::time::Instant;

use bon::Builder;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::{classify_response, make_probe_request};
use super::request::ProbeRequestSpec;
use super::result::{ModelProbeResult, ProbeAttemptResult, SubProbeResult, PROBE_VERSION};
use super::transport::{HttpTransport, ReqwestTransport};
use super::variants::run_variant_search;
use crate::cache::CapabilityCache;
use crate::capabilities::infer_capabilities;
use crate::config::{api_key_from_env, endpoint_from_env, ProbeConfig};
use crate::error::{ProbeError, Result};
use crate::provider::{
    build_messages, build_probe_body, image_media, pdf_media, provider_endpoint, provider_headers,
    ContentType, MediaPayload, ProviderKey,
};

pub const SKIPPED_AFTER_TEXT_FAILURE: &str = "Skipped: text probe failed";

/// One (provider, model) to probe.
///
/// Missing keys and endpoints fall back to the environment.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ProbeTarget {
    pub provider: ProviderKey,
    #[builder(into)]
    pub model: String,
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(into)]
    pub endpoint: Option<String>,
}

impl ProbeTarget {
    pub fn new(provider: ProviderKey, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: None,
            endpoint: None,
        }
    }
}

/// Result of one target within a bulk run.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub target: ProbeTarget,
    pub result: Result<ModelProbeResult>,
}

struct ResolvedTarget {
    provider: ProviderKey,
    model: String,
    url: String,
    headers: HeaderMap,
}

/// Runs probes through a transport according to a [`ProbeConfig`].
pub struct Prober {
    transport: Arc<dyn HttpTransport>,
    config: ProbeConfig,
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("transport", &"..")
            .field("config", &self.config)
            .finish()
    }
}

impl Prober {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ProbeConfig) -> Self {
        Self { transport, config }
    }

    /// Prober over a fresh reqwest client.
    pub fn with_reqwest(config: ProbeConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), config))
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    fn resolve(&self, target: &ProbeTarget) -> Result<ResolvedTarget> {
        let provider = target.provider;
        let api_key = target
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| api_key_from_env(provider));
        if provider.requires_api_key() && api_key.is_none() {
            return Err(ProbeError::MissingApiKey(provider.to_string()));
        }

        let endpoint = target
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .or_else(|| endpoint_from_env(provider));
        let url = provider_endpoint(provider, &target.model, endpoint.as_deref())?;

        Ok(ResolvedTarget {
            provider,
            model: target.model.clone(),
            url,
            headers: provider_headers(provider, api_key.as_deref()),
        })
    }

    async fn attempt(
        &self,
        target: &ResolvedTarget,
        content_type: ContentType,
        prompt: &str,
        media: Option<MediaPayload>,
        images_first: bool,
        cancel: &CancellationToken,
    ) -> ProbeAttemptResult {
        let messages = build_messages(
            target.provider,
            prompt,
            content_type,
            media.as_ref(),
            images_first,
        );
        let body = build_probe_body(
            target.provider,
            &target.model,
            messages,
            self.config.max_tokens,
        );
        let spec = ProbeRequestSpec::post(target.url.clone(), target.headers.clone(), body);
        let response =
            make_probe_request(self.transport.as_ref(), &spec, self.config.timeout(), cancel).await;
        classify_response(&response)
    }

    /// Probe one model: text, then image variants, then PDF variants.
    ///
    /// Media dimensions are skipped when the text probe fails. Returns
    /// `Err(Cancelled)` if `cancel` fires at any point, so a partial run
    /// never produces a result.
    pub async fn probe_model(
        &self,
        target: &ProbeTarget,
        cancel: &CancellationToken,
    ) -> Result<ModelProbeResult> {
        let started = Instant::now();
        let resolved = self.resolve(target)?;
        let resolved = &resolved;
        let config = &self.config;
        let policy = config.retry_policy();

        let text_series = policy
            .run(cancel, move || {
                self.attempt(
                    resolved,
                    ContentType::Text,
                    &config.text_prompt,
                    None,
                    false,
                    cancel,
                )
            })
            .await;
        ensure_live(cancel)?;
        let text_probe = text_series
            .last_result()
            .cloned()
            .ok_or(ProbeError::Cancelled)?;

        let (image_probe, pdf_probe) = if text_probe.success {
            let image_probe = run_variant_search(
                "image",
                &config.image_variants,
                &policy,
                cancel,
                move |variant| {
                    let media = image_media(variant.use_base64, &config.image_url);
                    self.attempt(
                        resolved,
                        ContentType::Image,
                        &config.media_prompt,
                        Some(media),
                        variant.images_first,
                        cancel,
                    )
                },
            )
            .await;
            ensure_live(cancel)?;

            let pdf_probe = run_variant_search(
                "pdf",
                &config.pdf_variants,
                &policy,
                cancel,
                move |variant| {
                    let (content_type, media) = if variant.as_pdf_images {
                        (
                            ContentType::Image,
                            image_media(variant.use_base64, &config.image_url),
                        )
                    } else {
                        (
                            ContentType::Pdf,
                            pdf_media(variant.use_base64, &config.pdf_url),
                        )
                    };
                    self.attempt(
                        resolved,
                        content_type,
                        &config.pdf_prompt,
                        Some(media),
                        variant.images_first,
                        cancel,
                    )
                },
            )
            .await;
            ensure_live(cancel)?;
            (image_probe, pdf_probe)
        } else {
            (
                SubProbeResult::skipped(SKIPPED_AFTER_TEXT_FAILURE),
                SubProbeResult::skipped(SKIPPED_AFTER_TEXT_FAILURE),
            )
        };

        let capabilities = infer_capabilities(resolved.provider, &image_probe, &pdf_probe);
        let total_probe_time_ms = started.elapsed().as_millis() as u64;

        info!(
            provider = %resolved.provider,
            model = %resolved.model,
            text = text_probe.success,
            vision = capabilities.supports_vision,
            pdf_native = capabilities.supports_pdf_native,
            elapsed_ms = total_probe_time_ms,
            "Probe finished"
        );

        Ok(ModelProbeResult {
            provider: resolved.provider.to_string(),
            model: resolved.model.clone(),
            probed_at: Utc::now(),
            text_probe,
            image_probe,
            pdf_probe,
            capabilities,
            probe_version: PROBE_VERSION,
            total_probe_time_ms,
        })
    }

    /// Probe `targets` with at most `config.concurrency` in flight,
    /// committing each completed run to `cache`.
    ///
    /// Outcomes arrive in completion order. A persistence failure is
    /// logged; the in-memory cache is still updated.
    pub async fn probe_many(
        &self,
        targets: Vec<ProbeTarget>,
        cache: &CapabilityCache,
        cancel: &CancellationToken,
    ) -> Vec<ProbeOutcome> {
        stream::iter(targets)
            .map(|target| async move {
                let result = self.probe_model(&target, cancel).await;
                if let Ok(probe) = &result {
                    if let Err(err) = cache.update_from_probe_result(probe) {
                        warn!(
                            provider = %probe.provider,
                            model = %probe.model,
                            error = %err,
                            "Failed to persist probe result"
                        );
                    }
                }
                ProbeOutcome { target, result }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ProbeError::Cancelled)
    } else {
        Ok(())
    }
}
