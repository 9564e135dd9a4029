//! Provider-specific message and request-body shapes for probes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::fixtures::{MediaPayload, MediaSource};
use super::key::{ProviderFamily, ProviderKey};

/// What a probe message carries besides the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Pdf,
}

const PROBE_PDF_FILENAME: &str = "probe.pdf";

/// Build the message list for one probe.
///
/// Text probes are a single user message with string content, identical
/// for every provider. Image and PDF probes are a two-part content array
/// in the provider family's part shape; `images_first` puts the media part
/// before the text part. A media probe without media degrades to text.
pub fn build_messages(
    provider: ProviderKey,
    prompt: &str,
    content_type: ContentType,
    media: Option<&MediaPayload>,
    images_first: bool,
) -> Vec<Value> {
    let media = match (content_type, media) {
        (ContentType::Text, _) | (_, None) => {
            return vec![json!({ "role": "user", "content": prompt })];
        }
        (_, Some(media)) => media,
    };

    let family = provider.family();
    let text_part = text_part(family, prompt);
    let media_part = match content_type {
        ContentType::Pdf => pdf_part(family, media),
        _ => image_part(family, media),
    };

    let content = if images_first {
        vec![media_part, text_part]
    } else {
        vec![text_part, media_part]
    };
    vec![json!({ "role": "user", "content": content })]
}

/// Wrap messages into the provider's minimal request body.
pub fn build_probe_body(
    provider: ProviderKey,
    model: &str,
    messages: Vec<Value>,
    max_tokens: u32,
) -> Value {
    match provider.family() {
        ProviderFamily::Anthropic => json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": messages,
        }),
        ProviderFamily::Gemini => json!({
            "contents": messages.into_iter().map(gemini_content).collect::<Vec<_>>(),
            "generationConfig": { "maxOutputTokens": max_tokens },
        }),
        ProviderFamily::OpenAi if provider == ProviderKey::OpenAi => json!({
            "model": model,
            "max_completion_tokens": max_tokens,
            "messages": messages,
        }),
        ProviderFamily::OpenAi => json!({
            "model": model,
            "max_tokens": max_tokens,
            "stream": false,
            "messages": messages,
        }),
    }
}

fn text_part(family: ProviderFamily, prompt: &str) -> Value {
    match family {
        ProviderFamily::Gemini => json!({ "text": prompt }),
        _ => json!({ "type": "text", "text": prompt }),
    }
}

fn image_part(family: ProviderFamily, media: &MediaPayload) -> Value {
    match family {
        ProviderFamily::OpenAi => json!({
            "type": "image_url",
            "image_url": { "url": media.as_url() },
        }),
        ProviderFamily::Anthropic => json!({
            "type": "image",
            "source": anthropic_source(media),
        }),
        ProviderFamily::Gemini => gemini_media_part(media),
    }
}

fn pdf_part(family: ProviderFamily, media: &MediaPayload) -> Value {
    match family {
        ProviderFamily::OpenAi => json!({
            "type": "file",
            "file": { "filename": PROBE_PDF_FILENAME, "file_data": media.as_url() },
        }),
        ProviderFamily::Anthropic => json!({
            "type": "document",
            "source": anthropic_source(media),
        }),
        ProviderFamily::Gemini => gemini_media_part(media),
    }
}

fn anthropic_source(media: &MediaPayload) -> Value {
    match &media.source {
        MediaSource::Base64(data) => json!({
            "type": "base64",
            "media_type": media.media_type,
            "data": data,
        }),
        MediaSource::Url(url) => json!({ "type": "url", "url": url }),
    }
}

fn gemini_media_part(media: &MediaPayload) -> Value {
    match &media.source {
        MediaSource::Base64(data) => json!({
            "inline_data": { "mime_type": media.media_type, "data": data },
        }),
        MediaSource::Url(url) => json!({
            "file_data": { "mime_type": media.media_type, "file_uri": url },
        }),
    }
}

fn gemini_content(message: Value) -> Value {
    let parts = match message.get("content") {
        Some(Value::String(text)) => vec![json!({ "text": text })],
        Some(Value::Array(parts)) => parts.clone(),
        _ => Vec::new(),
    };
    json!({ "role": "user", "parts": parts })
}
