//! Service configuration.
//!
//! Every setting has a compiled-in default and can be overridden through an
//! environment variable. Credentials are not part of the configuration: they
//! arrive with each request.

use std::env;
use std::time::Duration;

/// Default OpenAI REST base.
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default LinkedIn REST base.
pub const DEFAULT_LINKEDIN_API_BASE: &str = "https://api.linkedin.com/v2";

/// Default Gmail SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default Gmail SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default and upper bound for the post length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 3000;

/// Lower bound for the post length, in characters.
pub const MIN_POST_LENGTH: usize = 100;

/// Top-level configuration for the service.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// OpenAI settings.
    pub openai: OpenAIConfig,
    /// Link research settings.
    pub research: ResearchConfig,
    /// Post shaping settings.
    pub post: PostConfig,
    /// LinkedIn settings.
    pub linkedin: LinkedInConfig,
    /// SMTP settings.
    pub smtp: SmtpConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// # Environment Variables
    /// - `POSTER_BIND` / `POSTER_PORT`: listener address (default 0.0.0.0:8080)
    /// - `REQUEST_TIMEOUT_SECS`: whole-request budget (default 300)
    /// - `OPENAI_API_BASE`, `OPENAI_MODEL`, `OPENAI_IMAGE_MODEL`,
    ///   `OPENAI_SEARCH_MODEL`, `OPENAI_TEMPERATURE`, `OPENAI_MAX_TOKENS`,
    ///   `OPENAI_TIMEOUT_SECS`
    /// - `RESEARCH_TIMEOUT_SECS`, `RESEARCH_MAX_CHARS`, `RESEARCH_MAX_LINKS`,
    ///   `RESEARCH_WEB_SEARCH`
    /// - `LINKEDIN_API_BASE`, `LINKEDIN_TIMEOUT_SECS`
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_TIMEOUT_SECS`
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                bind: env::var("POSTER_BIND").unwrap_or(defaults.server.bind),
                port: env_parse("POSTER_PORT").unwrap_or(defaults.server.port),
                request_timeout: env_secs("REQUEST_TIMEOUT_SECS")
                    .unwrap_or(defaults.server.request_timeout),
            },
            openai: OpenAIConfig {
                api_base: env::var("OPENAI_API_BASE").unwrap_or(defaults.openai.api_base),
                model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                image_model: env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.openai.image_model),
                search_model: env::var("OPENAI_SEARCH_MODEL")
                    .unwrap_or(defaults.openai.search_model),
                temperature: env_parse("OPENAI_TEMPERATURE").unwrap_or(defaults.openai.temperature),
                max_tokens: env_parse("OPENAI_MAX_TOKENS").unwrap_or(defaults.openai.max_tokens),
                timeout: env_secs("OPENAI_TIMEOUT_SECS").unwrap_or(defaults.openai.timeout),
            },
            research: ResearchConfig {
                timeout: env_secs("RESEARCH_TIMEOUT_SECS").unwrap_or(defaults.research.timeout),
                max_chars: env_parse("RESEARCH_MAX_CHARS").unwrap_or(defaults.research.max_chars),
                max_links: env_parse("RESEARCH_MAX_LINKS").unwrap_or(defaults.research.max_links),
                web_search: env_flag("RESEARCH_WEB_SEARCH").unwrap_or(defaults.research.web_search),
            },
            post: defaults.post,
            linkedin: LinkedInConfig {
                api_base: env::var("LINKEDIN_API_BASE").unwrap_or(defaults.linkedin.api_base),
                timeout: env_secs("LINKEDIN_TIMEOUT_SECS").unwrap_or(defaults.linkedin.timeout),
            },
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: env_parse("SMTP_PORT").unwrap_or(defaults.smtp.port),
                timeout: env_secs("SMTP_TIMEOUT_SECS").unwrap_or(defaults.smtp.timeout),
            },
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Upper bound for a whole request, research to delivery.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// OpenAI settings.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// REST base, without a trailing slash.
    pub api_base: String,
    /// Model used to write the post.
    pub model: String,
    /// Model used for images.
    pub image_model: String,
    /// Search-capable chat model used for web research.
    pub search_model: String,
    /// Sampling temperature for the post.
    pub temperature: f32,
    /// Token budget for the post.
    pub max_tokens: u32,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            search_model: "gpt-4o-search-preview".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Link research settings.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Per-link fetch timeout.
    pub timeout: Duration,
    /// Maximum characters of extracted text kept per source.
    pub max_chars: usize,
    /// Maximum links fetched per request.
    pub max_links: usize,
    /// Also run a generic web search on the topic.
    pub web_search: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_chars: 4000,
            max_links: 5,
            web_search: false,
        }
    }
}

/// Post shaping settings.
#[derive(Debug, Clone)]
pub struct PostConfig {
    /// Upper bound (and default) for `max_length`.
    pub default_max_length: usize,
    /// Lower bound for `max_length`.
    pub min_post_length: usize,
    /// Hashtags the model is allowed to use.
    pub max_hashtags: usize,
    /// Image dimensions requested from the image model.
    pub image_size: String,
    /// Image quality requested from the image model.
    pub image_quality: String,
    /// Characters of the post quoted in the image prompt.
    pub image_prompt_excerpt: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            default_max_length: DEFAULT_MAX_LENGTH,
            min_post_length: MIN_POST_LENGTH,
            max_hashtags: 5,
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            image_prompt_excerpt: 300,
        }
    }
}

impl PostConfig {
    /// Clamp a requested length into the supported range.
    #[must_use]
    pub fn clamp_length(&self, requested: usize) -> usize {
        requested.clamp(self.min_post_length, self.default_max_length)
    }
}

/// LinkedIn settings.
#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    /// REST base, without a trailing slash.
    pub api_base: String,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_LINKEDIN_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// SMTP settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Connection and command timeout.
    pub timeout: Duration,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            timeout: Duration::from_secs(30),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}
