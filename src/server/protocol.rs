use serde::{Deserialize, Serialize};

/// A request to compare two base64-encoded images
#[derive(Deserialize)]
pub struct CompareRequest {
    pub image1: String,
    pub image2: String,

    /// "pixel" (default) or "color_histogram"; unknown values fall back
    /// to "pixel"
    #[serde(default)]
    pub method: Option<String>,
}

impl std::fmt::Debug for CompareRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Elide the payloads; they are large and unreadable
        write!(
            f,
            "CompareRequest {{ image1: <{} b64 chars>, image2: <{} b64 chars>, method: {:?} }}",
            self.image1.len(),
            self.image2.len(),
            self.method
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub similarity: f64,
}

/// Pool introspection returned by GET /status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub workers: usize,
}
