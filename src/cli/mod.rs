use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Inference backend for chat completion (ollama, openai, echo)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL of the inference backend (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the inference backend, sent as a bearer token
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name (e.g., Qwen/Qwen2.5-7B-Instruct, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Optional JSON file overriding the persona template and turn labels.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Generation Policy Args ---
    /// Token limit used when the request does not carry `max_tokens`.
    #[arg(long, env = "DEFAULT_MAX_TOKENS", default_value = "5000")]
    pub default_max_tokens: u32,

    /// Upper bound applied to every token limit (e.g. 300 for small models).
    #[arg(long, env = "MAX_TOKENS_CAP")]
    pub max_tokens_cap: Option<u32>,

    /// Answer with an apology message instead of an error when generation fails.
    #[arg(long, env = "APOLOGY_ON_ERROR", default_value = "true", action = clap::ArgAction::Set)]
    pub apology_on_error: bool,

    /// Timeout in seconds for a single call to the inference backend.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "300")]
    pub request_timeout_secs: u64,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8080")]
    pub server_addr: String,

    /// Maximum number of chat requests processed at the same time.
    #[arg(long, env = "MAX_CONCURRENT_REQUESTS", default_value = "10")]
    pub max_concurrent_requests: usize,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

/// Options of the `clean-descriptions` tool.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Strip a sentence pattern from metadata descriptions", long_about = None)]
pub struct CleanArgs {
    /// JSON file holding the array of metadata records. Rewritten in place.
    #[arg(long, default_value = "public/context/summary_metadata_with_vercel_urls.json")]
    pub file: String,

    /// Phrase marking the sentences to remove.
    #[arg(long, default_value = "This sword")]
    pub pattern: String,

    /// Report what would change without writing the file.
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let args = Args::parse_from(["plottwist-llm"]);
        assert_eq!(args.default_max_tokens, 5000);
        assert_eq!(args.max_tokens_cap, None);
        assert!(args.apology_on_error);
        assert_eq!(args.max_concurrent_requests, 10);
    }

    #[test]
    fn default_bind_does_not_shadow_local_upstream() {
        let args = Args::parse_from(["plottwist-llm"]);
        assert_eq!(args.server_addr, "127.0.0.1:8080");
        assert!(!args.server_addr.ends_with(":8000"));
    }

    #[test]
    fn apology_can_be_disabled() {
        let args = Args::parse_from(["plottwist-llm", "--apology-on-error", "false"]);
        assert!(!args.apology_on_error);
    }

    #[test]
    fn clean_defaults() {
        let args = CleanArgs::parse_from(["clean-descriptions", "--file", "data.json"]);
        assert_eq!(args.file, "data.json");
        assert_eq!(args.pattern, "This sword");
        assert!(!args.dry_run);
    }

    #[test]
    fn clean_args_ignore_environment() {
        std::env::set_var("METADATA_FILE", "from-env.json");
        std::env::set_var("STRIP_PATTERN", "That axe");
        let args = CleanArgs::parse_from(["clean-descriptions"]);
        assert_eq!(args.file, "public/context/summary_metadata_with_vercel_urls.json");
        assert_eq!(args.pattern, "This sword");
    }
}
