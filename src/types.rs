use serde::{Deserialize, Serialize};

/// One article as returned by the news API and as stored once announced.
///
/// `published` (unix seconds) is unique at the source and serves as the
/// de-duplication key: an article whose `published` value has already been
/// announced is never announced again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_hd: Option<String>,
    pub published: i64,
}

/// Order-update event pushed by the exchange stream.
///
/// The wire format uses the exchange's compact single-letter keys and encodes
/// decimal fields as strings. Every field is optional: the stream is
/// best-effort and a partially populated event must still render.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdateEvent {
    #[serde(rename = "s", default)]
    pub symbol: Option<String>,
    #[serde(rename = "S", default)]
    pub side: Option<String>,
    #[serde(rename = "o", default)]
    pub order_type: Option<String>,
    #[serde(rename = "X", default)]
    pub order_status: Option<String>,
    #[serde(rename = "x", default)]
    pub execution_type: Option<String>,
    #[serde(rename = "q", default, deserialize_with = "wire::opt_f64")]
    pub quantity: Option<f64>,
    #[serde(rename = "p", default, deserialize_with = "wire::opt_f64")]
    pub price: Option<f64>,
    #[serde(rename = "ap", default, deserialize_with = "wire::opt_f64")]
    pub average_price: Option<f64>,
    #[serde(rename = "rp", default, deserialize_with = "wire::opt_f64")]
    pub realized_profit: Option<f64>,
    #[serde(rename = "m", default)]
    pub is_maker: Option<bool>,
}

mod wire {
    use serde::{Deserialize, Deserializer};

    /// Accept a decimal field either as a JSON number or as a string.
    pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Num(v)) => Some(v),
            Some(Raw::Text(s)) => s.parse().ok(),
            None => None,
        })
    }
}

/// Outbound webhook body: a plain broadcast, a rich embed, or both at once.
#[derive(Debug, Clone, Serialize)]
pub struct Outbound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl Outbound {
    pub fn broadcast(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            // Page size is bounded in the URL; if more than a page of new
            // articles appears between two ticks the overflow is missed.
            api_url: "https://api.watcher.guru/content/data?news=10".to_string(),
            user_agent: "coinherald/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("news API error: {0}")]
    Api(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("delivery queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, HeraldError>;
