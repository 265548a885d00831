//! Output types returned by the render entry points.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A finished PDF plus the filename clients should save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
    filename: String,
}

impl RenderedDocument {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Byte length, for `Content-Length`.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// JSON carries the PDF as base64 so `--json` output stays printable.
impl Serialize for RenderedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RenderedDocument", 3)?;
        s.serialize_field("filename", &self.filename)?;
        s.serialize_field("byte_length", &self.bytes.len())?;
        s.serialize_field("data_base64", &BASE64.encode(&self.bytes))?;
        s.end()
    }
}

/// Timing for one render, per stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderStats {
    pub launch_ms: u64,
    pub content_load_ms: u64,
    pub diagram_render_ms: u64,
    pub export_ms: u64,
    pub total_ms: u64,
    pub pdf_bytes: usize,
    pub screenshot_captured: bool,
}

/// A rendered document and the stats of the run that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub document: RenderedDocument,
    pub stats: RenderStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_reports_length_up_front() {
        let doc = RenderedDocument::new(b"%PDF-1.7 fake".to_vec(), "process-diagram.pdf");
        assert_eq!(doc.len(), 13);
        assert!(!doc.is_empty());
        assert_eq!(doc.filename(), "process-diagram.pdf");
    }

    #[test]
    fn json_carries_base64_payload() {
        let doc = RenderedDocument::new(b"%PDF".to_vec(), "x.pdf");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["filename"], "x.pdf");
        assert_eq!(json["byte_length"], 4);
        assert_eq!(json["data_base64"], "JVBERg==");
    }
}
