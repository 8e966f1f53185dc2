/// Deterministic avatar color for a player: CRC32 of the normalized tag picks
/// the hue, saturation and lightness are fixed so every avatar stays legible.
pub fn avatar_color(tag: &str) -> (u8, u8, u8) {
    let key = crate::tag::tag_key(tag);
    let hash = crc32fast::hash(key.as_bytes());
    let hue = (hash % 360) as f64;
    hsl_to_rgb(hue, 0.55, 0.45)
}

const RUSH_OK_HSL: (f64, f64, f64) = (145.0, 0.63, 0.42);
const RUSH_BAD_HSL: (f64, f64, f64) = (0.0, 0.84, 0.60);

/// Rush % chip color, green at 0 % fading to red at 50 % and above.
pub fn rush_color(rush_percent: f64) -> (u8, u8, u8) {
    let t = (rush_percent / 50.0).clamp(0.0, 1.0);
    let (h, s, l) = interpolate_hsl(RUSH_OK_HSL, RUSH_BAD_HSL, t);
    hsl_to_rgb(h, s, l)
}

pub fn css_rgb((r, g, b): (u8, u8, u8)) -> String {
    format!("rgb({r}, {g}, {b})")
}

/// Convert HSL to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    let h = h / 360.0;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Interpolate between two HSL colors using shortest hue path.
pub fn interpolate_hsl(from: (f64, f64, f64), to: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    let mut dh = to.0 - from.0;
    if dh > 180.0 {
        dh -= 360.0;
    } else if dh < -180.0 {
        dh += 360.0;
    }

    let h = (from.0 + dh * t).rem_euclid(360.0);
    let s = from.1 + (to.1 - from.1) * t;
    let l = from.2 + (to.2 - from.2) * t;

    (h, s, l)
}

#[cfg(test)]
mod tests {
    use super::{avatar_color, css_rgb, hsl_to_rgb, interpolate_hsl, rush_color};

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 0.5), (128, 128, 128));
    }

    #[test]
    fn interpolate_hsl_wraps_shortest_path() {
        let mid = interpolate_hsl((350.0, 0.6, 0.4), (10.0, 0.8, 0.5), 0.5);
        assert_close(mid.0, 0.0);
        assert_close(mid.1, 0.7);
        assert_close(mid.2, 0.45);
    }

    #[test]
    fn avatar_color_ignores_tag_spelling() {
        assert_eq!(avatar_color("#q0ly"), avatar_color("Q0LY"));
        assert_eq!(avatar_color("#QOLY"), avatar_color("#Q0LY"));
    }

    #[test]
    fn rush_color_saturates_at_both_ends() {
        assert_eq!(rush_color(-5.0), rush_color(0.0));
        assert_eq!(rush_color(80.0), rush_color(50.0));
        assert_ne!(rush_color(0.0), rush_color(50.0));
    }

    #[test]
    fn css_rgb_format() {
        assert_eq!(css_rgb((1, 22, 255)), "rgb(1, 22, 255)");
    }
}
