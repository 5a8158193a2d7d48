#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::from_list("http://localhost:3000,http://localhost:5173")
    }
}

impl CorsConfig {
    /// Reads the comma-separated `ALLOWED_ORIGINS`.
    pub fn from_env() -> Self {
        std::env::var("ALLOWED_ORIGINS")
            .map(|list| Self::from_list(&list))
            .unwrap_or_default()
    }

    pub fn from_list(list: &str) -> Self {
        let allowed_origins = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }

    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
