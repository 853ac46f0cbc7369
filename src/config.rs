//! Client configuration.

/// Connection settings for one view session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the execution engine's HTTP API.
    pub base_url: String,
    /// Workflow name namespacing every request in this session.
    pub workflow: String,
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:4000";

    pub fn new(base_url: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            workflow: workflow.into(),
        }
    }

    /// Resolve the base URL from `LOOMVIEW_API_BASE`, loading `.env` first if
    /// one is present, and falling back to [`Self::DEFAULT_BASE_URL`].
    pub fn from_env(workflow: impl Into<String>) -> Self {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("LOOMVIEW_API_BASE")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());
        Self::new(base_url, workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_resolves_base_url() {
        unsafe { std::env::remove_var("LOOMVIEW_API_BASE") };
        let config = ClientConfig::from_env("encode-job");
        assert_eq!(config.base_url, ClientConfig::DEFAULT_BASE_URL);
        assert_eq!(config.workflow, "encode-job");

        unsafe { std::env::set_var("LOOMVIEW_API_BASE", "http://engine:9000") };
        let config = ClientConfig::from_env("encode-job");
        assert_eq!(config.base_url, "http://engine:9000");
        unsafe { std::env::remove_var("LOOMVIEW_API_BASE") };
    }
}
