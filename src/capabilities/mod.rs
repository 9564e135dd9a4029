//! Capability vectors and the knowledge that fills them.

pub mod defaults;
pub mod inference;
pub mod static_overrides;
pub mod summary;

pub use defaults::provider_defaults;
pub use inference::infer_capabilities;
pub use static_overrides::static_override;
pub use summary::{summarize_probe_result, PdfSupport, ProbeSummary, VisionSupport};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a request builder must lay out message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum MessageShape {
    #[serde(rename = "openai.parts")]
    #[strum(serialize = "openai.parts")]
    OpenAiParts,
    #[serde(rename = "anthropic.content")]
    #[strum(serialize = "anthropic.content")]
    AnthropicContent,
    #[serde(rename = "gemini.parts")]
    #[strum(serialize = "gemini.parts")]
    GeminiParts,
}

/// How a request builder must read streamed completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum CompletionShape {
    #[serde(rename = "openai.streaming")]
    #[strum(serialize = "openai.streaming")]
    OpenAiStreaming,
    #[serde(rename = "anthropic.streaming")]
    #[strum(serialize = "anthropic.streaming")]
    AnthropicStreaming,
    #[serde(rename = "gemini.streaming")]
    #[strum(serialize = "gemini.streaming")]
    GeminiStreaming,
}

/// What a (provider, model) pair supports and requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbedCapabilities {
    pub supports_vision: bool,
    pub supports_pdf_native: bool,
    pub supports_pdf_as_images: bool,
    pub requires_base64_images: bool,
    pub requires_images_first: bool,
    pub message_shape: MessageShape,
    pub completion_shape: CompletionShape,
}

impl Default for ProbedCapabilities {
    fn default() -> Self {
        default_capabilities()
    }
}

/// Conservative baseline: no multimodal support, inline images, OpenAI shapes.
pub const fn default_capabilities() -> ProbedCapabilities {
    ProbedCapabilities {
        supports_vision: false,
        supports_pdf_native: false,
        supports_pdf_as_images: false,
        requires_base64_images: true,
        requires_images_first: false,
        message_shape: MessageShape::OpenAiParts,
        completion_shape: CompletionShape::OpenAiStreaming,
    }
}

/// Partial capability vector. Only `Some` fields override lower tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_vision: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_pdf_native: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_pdf_as_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_base64_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_images_first: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_shape: Option<MessageShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_shape: Option<CompletionShape>,
}

impl CapabilityPatch {
    /// Only the fields a probe run measures; shapes stay with lower tiers.
    pub fn measured(caps: &ProbedCapabilities) -> Self {
        Self {
            supports_vision: Some(caps.supports_vision),
            supports_pdf_native: Some(caps.supports_pdf_native),
            supports_pdf_as_images: Some(caps.supports_pdf_as_images),
            requires_base64_images: Some(caps.requires_base64_images),
            requires_images_first: Some(caps.requires_images_first),
            message_shape: None,
            completion_shape: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the set fields onto `caps`, leaving the rest untouched.
    pub fn apply_to(&self, caps: &mut ProbedCapabilities) {
        if let Some(v) = self.supports_vision {
            caps.supports_vision = v;
        }
        if let Some(v) = self.supports_pdf_native {
            caps.supports_pdf_native = v;
        }
        if let Some(v) = self.supports_pdf_as_images {
            caps.supports_pdf_as_images = v;
        }
        if let Some(v) = self.requires_base64_images {
            caps.requires_base64_images = v;
        }
        if let Some(v) = self.requires_images_first {
            caps.requires_images_first = v;
        }
        if let Some(v) = self.message_shape {
            caps.message_shape = v;
        }
        if let Some(v) = self.completion_shape {
            caps.completion_shape = v;
        }
    }

    /// Overlay `other` onto `self`; fields set in `other` win.
    pub fn merge(&mut self, other: &CapabilityPatch) {
        self.supports_vision = other.supports_vision.or(self.supports_vision);
        self.supports_pdf_native = other.supports_pdf_native.or(self.supports_pdf_native);
        self.supports_pdf_as_images = other.supports_pdf_as_images.or(self.supports_pdf_as_images);
        self.requires_base64_images = other.requires_base64_images.or(self.requires_base64_images);
        self.requires_images_first = other.requires_images_first.or(self.requires_images_first);
        self.message_shape = other.message_shape.or(self.message_shape);
        self.completion_shape = other.completion_shape.or(self.completion_shape);
    }
}

impl From<ProbedCapabilities> for CapabilityPatch {
    fn from(caps: ProbedCapabilities) -> Self {
        Self {
            message_shape: Some(caps.message_shape),
            completion_shape: Some(caps.completion_shape),
            ..Self::measured(&caps)
        }
    }
}
