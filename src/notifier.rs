use crate::types::{Article, Embed, EmbedField, EmbedThumbnail, OrderUpdateEvent, Outbound};
use tracing::debug;
use url::Url;

/// Embed accent for article announcements.
pub const ARTICLE_COLOR: u32 = 0xFF0000;

const BUY_COLOR: u32 = 0x2ECC71;
const SELL_COLOR: u32 = 0xE74C3C;
const NEUTRAL_COLOR: u32 = 0x95A5A6;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// Accept a thumbnail candidate only if it is an http(s) URL whose path ends
/// in a recognized raster-image extension (case-insensitive).
pub fn acceptable_image_url(raw: &str) -> bool {
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let path = parsed.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Render one article announcement: an `@everyone` broadcast plus one embed.
///
/// A thumbnail URL that fails validation degrades to an embed without a
/// thumbnail; it never fails the render.
pub fn render_article(article: &Article) -> Outbound {
    let thumbnail = match article.image_hd.as_deref() {
        Some(raw) if acceptable_image_url(raw) => Some(EmbedThumbnail {
            url: raw.to_string(),
        }),
        Some(raw) => {
            debug!("Dropping non-image thumbnail URL: {}", raw);
            None
        }
        None => None,
    };

    let embed = Embed {
        title: Some(article.title.clone()),
        url: Some(article.url.clone()),
        description: Some(article.description.clone()),
        color: Some(ARTICLE_COLOR),
        timestamp: chrono::DateTime::from_timestamp(article.published, 0)
            .map(|t| t.to_rfc3339()),
        thumbnail,
        fields: Vec::new(),
    };

    Outbound {
        content: Some("@everyone".to_string()),
        embeds: vec![embed],
    }
}

/// Render one order-update notification. Absent fields render as placeholders
/// ("Unknown" for labels, 0 for quantities) rather than failing.
pub fn render_order_update(event: &OrderUpdateEvent) -> Outbound {
    let symbol = label(&event.symbol);
    let status = label(&event.order_status);
    let side = label(&event.side);

    let color = match side.as_str() {
        "BUY" => BUY_COLOR,
        "SELL" => SELL_COLOR,
        _ => NEUTRAL_COLOR,
    };

    let fields = vec![
        EmbedField::inline("Side", side),
        EmbedField::inline("Type", label(&event.order_type)),
        EmbedField::inline("Execution", label(&event.execution_type)),
        EmbedField::inline("Quantity", amount(event.quantity)),
        EmbedField::inline("Price", amount(event.price)),
        EmbedField::inline("Avg Price", amount(event.average_price)),
        EmbedField::inline("Realized PnL", amount(event.realized_profit)),
        EmbedField::inline(
            "Maker",
            match event.is_maker {
                Some(maker) => maker.to_string(),
                None => "Unknown".to_string(),
            },
        ),
    ];

    let embed = Embed {
        title: Some(format!("{} {}", symbol, status)),
        color: Some(color),
        fields,
        ..Embed::default()
    };

    Outbound::embed(embed)
}

fn label(value: &Option<String>) -> String {
    match value {
        Some(value) if !value.is_empty() => value.clone(),
        _ => "Unknown".to_string(),
    }
}

fn amount(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{}", value),
        None => "0".to_string(),
    }
}
