use egui::Color32;

pub const CARD_FILL: Color32 = Color32::from_rgb(0x24, 0x24, 0x3e);
pub const FREE_CELL: Color32 = Color32::from_rgb(0x2d, 0x2d, 0x44);
pub const ACCENT: Color32 = Color32::from_rgb(0x6c, 0x63, 0xff);
pub const LIVE: Color32 = Color32::from_rgb(0x4c, 0xaf, 0x50);
pub const WARNING: Color32 = Color32::from_rgb(0xff, 0x52, 0x52);
pub const HIGHLIGHT: Color32 = Color32::WHITE;

/// Parses `#RRGGBB` or `#RGB`. Anything else yields `None`.
pub fn parse_hex_color(raw: &str) -> Option<Color32> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color32::from_rgb(r, g, b))
        }
        3 => {
            let mut channels = hex.chars().map(|c| {
                let v = c.to_digit(16).unwrap_or(0) as u8;
                v * 17
            });
            Some(Color32::from_rgb(
                channels.next()?,
                channels.next()?,
                channels.next()?,
            ))
        }
        _ => None,
    }
}

pub fn owner_color(raw: Option<&str>) -> Color32 {
    raw.and_then(parse_hex_color).unwrap_or(FREE_CELL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_hex_color("#6C63FF"), Some(Color32::from_rgb(0x6c, 0x63, 0xff)));
        assert_eq!(parse_hex_color("#f00"), Some(Color32::from_rgb(255, 0, 0)));
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(owner_color(None), FREE_CELL);
        assert_eq!(owner_color(Some("nope")), FREE_CELL);
    }
}
