use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct WhatsAppSettings {
    pub access_token: String,
    pub phone_number_id: String,
}

#[derive(Clone, Debug)]
pub struct OracleSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub metrics_port: u16,
    pub whatsapp: Option<WhatsAppSettings>,
    pub webhook_verify_token: String,
    /// App secret for `X-Hub-Signature-256`; verification is skipped when unset.
    pub webhook_app_secret: Option<String>,
    pub oracle: Option<OracleSettings>,
    pub operator_chat_id: String,
    pub timezone: Tz,
    pub business_hours_start: u32,
    pub business_hours_end: u32,
    pub sos_timeout_minutes: i64,
    pub monitor_interval_secs: u64,
    pub healer_interval_secs: u64,
    pub reporter_interval_secs: u64,
    pub daily_check_interval_secs: u64,
    pub conversation_cache_ttl_secs: i64,
    pub conversation_history_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://leaddesk.db?mode=rwc".to_string());

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let metrics_port = env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9000".to_string())
            .parse()
            .unwrap_or(9000);

        let operator_chat_id = env::var("OPERATOR_CHAT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingOperatorChatId)?;

        let webhook_verify_token = env::var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default();
        let whatsapp = match (
            non_empty_var("WHATSAPP_ACCESS_TOKEN"),
            non_empty_var("WHATSAPP_PHONE_NUMBER_ID"),
        ) {
            (Some(access_token), Some(phone_number_id)) => Some(WhatsAppSettings {
                access_token,
                phone_number_id,
            }),
            _ => None,
        };

        let oracle = non_empty_var("NLU_BASE_URL").map(|base_url| OracleSettings {
            base_url,
            api_key: env::var("NLU_API_KEY").unwrap_or_default(),
            model: env::var("NLU_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        });

        let timezone_name = env::var("TIMEZONE").unwrap_or_else(|_| "Asia/Jerusalem".to_string());
        let timezone =
            Tz::from_str(&timezone_name).map_err(|_| ConfigError::InvalidTimezone(timezone_name))?;

        let business_hours_start = parse_or("BUSINESS_HOURS_START", 8);
        let business_hours_end = parse_or("BUSINESS_HOURS_END", 21);
        if business_hours_start >= business_hours_end || business_hours_end > 24 {
            return Err(ConfigError::InvalidBusinessHours {
                start: business_hours_start,
                end: business_hours_end,
            });
        }

        Ok(Config {
            database_url,
            server_host,
            server_port,
            metrics_port,
            whatsapp,
            webhook_verify_token,
            webhook_app_secret: non_empty_var("WHATSAPP_APP_SECRET"),
            oracle,
            operator_chat_id,
            timezone,
            business_hours_start,
            business_hours_end,
            sos_timeout_minutes: parse_or("SOS_TIMEOUT_MINUTES", 30),
            monitor_interval_secs: parse_or("MONITOR_INTERVAL_SECS", 1800),
            healer_interval_secs: parse_or("HEALER_INTERVAL_SECS", 300),
            reporter_interval_secs: parse_or("REPORTER_INTERVAL_SECS", 3600),
            daily_check_interval_secs: parse_or("DAILY_CHECK_INTERVAL_SECS", 60),
            conversation_cache_ttl_secs: parse_or("CONVERSATION_CACHE_TTL_SECS", 1800),
            conversation_history_limit: parse_or("CONVERSATION_HISTORY_LIMIT", 20),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPERATOR_CHAT_ID environment variable not set")]
    MissingOperatorChatId,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid business hours {start}..{end}")]
    InvalidBusinessHours { start: u32, end: u32 },
}
