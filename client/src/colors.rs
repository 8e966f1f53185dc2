use clanboard_shared::activity::ActivityBand;
use clanboard_shared::colors::{avatar_color, rush_color};

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Avatar circle background, stable per player tag.
pub fn avatar_background(tag: &str) -> String {
    let (r, g, b) = avatar_color(tag);
    rgba_css(r, g, b, 0.85)
}

pub fn rush_css(rush_percent: Option<f64>) -> String {
    match rush_percent {
        Some(pct) => {
            let (r, g, b) = rush_color(pct);
            rgba_css(r, g, b, 1.0)
        }
        None => "#5a5860".to_string(),
    }
}

/// Pill background for an activity band.
pub fn band_css(band: ActivityBand, (r, g, b): (u8, u8, u8)) -> String {
    let alpha = match band {
        ActivityBand::High => 0.18,
        ActivityBand::Medium => 0.14,
        ActivityBand::Low => 0.12,
        ActivityBand::Unknown => 0.08,
    };
    rgba_css(r, g, b, alpha)
}
