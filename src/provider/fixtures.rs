//! Tiny media payloads attached to image and PDF probes.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A 1x1 transparent PNG.
pub const PROBE_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const PNG_MEDIA_TYPE: &str = "image/png";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

static PROBE_PDF: OnceLock<String> = OnceLock::new();

/// Where a media part's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Base64(String),
    Url(String),
}

/// One media attachment for a probe message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub media_type: String,
    pub source: MediaSource,
}

impl MediaPayload {
    /// `data:` URL for base64 sources, the URL itself otherwise.
    pub fn as_url(&self) -> String {
        match &self.source {
            MediaSource::Base64(data) => format!("data:{};base64,{data}", self.media_type),
            MediaSource::Url(url) => url.clone(),
        }
    }

    pub fn is_base64(&self) -> bool {
        matches!(self.source, MediaSource::Base64(_))
    }
}

/// The probe image, inline or by reference.
pub fn image_media(use_base64: bool, image_url: &str) -> MediaPayload {
    MediaPayload {
        media_type: PNG_MEDIA_TYPE.to_string(),
        source: if use_base64 {
            MediaSource::Base64(PROBE_PNG_BASE64.to_string())
        } else {
            MediaSource::Url(image_url.to_string())
        },
    }
}

/// The probe PDF, inline or by reference.
pub fn pdf_media(use_base64: bool, pdf_url: &str) -> MediaPayload {
    MediaPayload {
        media_type: PDF_MEDIA_TYPE.to_string(),
        source: if use_base64 {
            MediaSource::Base64(probe_pdf_base64().to_string())
        } else {
            MediaSource::Url(pdf_url.to_string())
        },
    }
}

/// Base64 of a one-page PDF reading "Probe".
pub fn probe_pdf_base64() -> &'static str {
    PROBE_PDF.get_or_init(|| STANDARD.encode(build_probe_pdf()))
}

fn build_probe_pdf() -> Vec<u8> {
    let stream = "BT /F1 24 Tf 72 720 Td (Probe) Tj ET";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", index + 1));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}
