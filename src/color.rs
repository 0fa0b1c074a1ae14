//! Background color parsing: hex (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`)
//! and CSS named colors.

use core::str::FromStr;

use thiserror::Error;

use crate::instructions::CanvasColor;

/// The string was neither a hex color nor a known color name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("expected hex color or CSS color name")]
pub struct ParseColorError;

impl FromStr for CanvasColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s).ok_or(ParseColorError)
    }
}

/// Parse a hex or named color. The leading `#` is optional.
///
/// `transparent` maps to [`CanvasColor::Transparent`]; every other result
/// is [`CanvasColor::Srgb`].
///
/// ```
/// use zenresize::{CanvasColor, color::parse_color};
///
/// assert_eq!(parse_color("#f00"), Some(CanvasColor::Srgb { r: 255, g: 0, b: 0, a: 255 }));
/// assert_eq!(parse_color("Transparent"), Some(CanvasColor::Transparent));
/// assert_eq!(parse_color("nope"), None);
/// ```
pub fn parse_color(s: &str) -> Option<CanvasColor> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let hex = s.strip_prefix('#').unwrap_or(s);
    parse_hex(hex).or_else(|| lookup_named(s))
}

fn parse_hex(hex: &str) -> Option<CanvasColor> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let [r, g, b, a] = match hex.len() {
        3 | 4 => {
            // Each nibble doubles: "f" → 0xff.
            let mut out = [0xff_u8; 4];
            for (slot, ch) in out.iter_mut().zip(hex.bytes()) {
                let n = (ch as char).to_digit(16)? as u8;
                *slot = n << 4 | n;
            }
            out
        }
        6 | 8 => {
            let mut out = [0xff_u8; 4];
            for (i, slot) in out.iter_mut().enumerate().take(hex.len() / 2) {
                *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            }
            out
        }
        _ => return None,
    };
    Some(CanvasColor::Srgb { r, g, b, a })
}

fn lookup_named(name: &str) -> Option<CanvasColor> {
    if name.eq_ignore_ascii_case("transparent") {
        return Some(CanvasColor::Transparent);
    }
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, [r, g, b])| CanvasColor::Srgb { r, g, b, a: 255 })
}

/// CSS basic color keywords plus a few common extended ones.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("white", [255, 255, 255]),
    ("maroon", [128, 0, 0]),
    ("red", [255, 0, 0]),
    ("purple", [128, 0, 128]),
    ("fuchsia", [255, 0, 255]),
    ("magenta", [255, 0, 255]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("olive", [128, 128, 0]),
    ("yellow", [255, 255, 0]),
    ("navy", [0, 0, 128]),
    ("blue", [0, 0, 255]),
    ("teal", [0, 128, 128]),
    ("aqua", [0, 255, 255]),
    ("cyan", [0, 255, 255]),
    ("orange", [255, 165, 0]),
    ("lightgray", [211, 211, 211]),
    ("darkgray", [169, 169, 169]),
    ("whitesmoke", [245, 245, 245]),
];
