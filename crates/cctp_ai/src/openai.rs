use cctp_core::error::AppError;

/// Connection settings for an OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`. A trailing slash is trimmed.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::new(
                "AI_NOT_CONFIGURED",
                "No API key configured for the text generation service",
            ));
        }

        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let has_host = base_url
            .strip_prefix("https://")
            .or_else(|| base_url.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'));
        if !has_host {
            return Err(AppError::new(
                "AI_NOT_CONFIGURED",
                "Text generation base URL must be an http(s) URL",
            )
            .with_details(format!("base_url={base_url}")));
        }

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            timeout_secs: timeout_secs.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    pub(crate) fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/models", self.base_url);
        let resp = ureq::get(&url)
            .set("Authorization", &self.authorization())
            .timeout(std::time::Duration::from_secs(5))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_SERVICE_UNHEALTHY", "Text generation health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "AI_SERVICE_UNREACHABLE",
                "Failed to reach the text generation service",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}
