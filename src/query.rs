//! Query string parsing into [`Instructions`].
//!
//! Parses strings like `?width=800&height=600&mode=crop&format=png` and
//! reports problems as non-fatal warnings. A value that fails validation
//! leaves the field at its default.
//!
//! # Example
//!
//! ```
//! use zenresize::{FitMode, OutputFormat, query};
//!
//! let result = query::parse("w=800&h=600&mode=crop&format=png");
//! assert!(result.warnings.is_empty());
//! assert_eq!(result.instructions.width(), Some(800));
//! assert_eq!(result.instructions.mode(), FitMode::Crop);
//! assert_eq!(result.instructions.format(), OutputFormat::Png);
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::color::parse_color;
use crate::instructions::{FitMode, Instructions, OutputFormat, ScaleMode, ValidationError};

/// Result of parsing a query string.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed instructions.
    pub instructions: Instructions,
    /// Non-fatal parse warnings.
    pub warnings: Vec<ParseWarning>,
}

/// Non-fatal warning from query string parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A key appeared more than once (last valid value wins).
    DuplicateKey { key: String, value: String },
    /// The key is not an instruction.
    KeyNotRecognized { key: String, value: String },
    /// The key is known but the value could not be used.
    ValueInvalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Parse a query string (with or without leading `?`).
pub fn parse(query: &str) -> ParseResult {
    let mut p = Parser::default();
    for pair in query
        .strip_prefix('?')
        .unwrap_or(query)
        .split('&')
        .filter(|s| !s.is_empty())
    {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(raw_key).to_ascii_lowercase();
        let value = percent_decode(raw_value);
        p.dispatch(&key, value.trim());
    }
    ParseResult {
        instructions: p.instructions,
        warnings: p.warnings,
    }
}

#[derive(Default)]
struct Parser {
    instructions: Instructions,
    warnings: Vec<ParseWarning>,
    seen: Vec<&'static str>,
}

impl Parser {
    fn dispatch(&mut self, key: &str, value: &str) {
        match key {
            "w" | "width" => match parse_int(value) {
                Some(w) => {
                    let r = self.instructions.set_width(Some(w));
                    self.apply("width", value, r);
                }
                None => self.invalid("width", value, "expected an integer"),
            },
            "h" | "height" => match parse_int(value) {
                Some(h) => {
                    let r = self.instructions.set_height(Some(h));
                    self.apply("height", value, r);
                }
                None => self.invalid("height", value, "expected an integer"),
            },
            "quality" => match parse_int(value) {
                Some(q) => {
                    let r = self.instructions.set_quality(q);
                    self.apply("quality", value, r);
                }
                None => self.invalid("quality", value, "expected an integer"),
            },
            "mode" => match parse_fit_mode(value) {
                Some(m) => {
                    self.instructions.set_mode(m);
                    self.apply("mode", value, Ok(()));
                }
                None => self.invalid("mode", value, "expected max|pad|crop|stretch"),
            },
            "scale" => match parse_scale_mode(value) {
                Some(s) => {
                    self.instructions.set_scale(s);
                    self.apply("scale", value, Ok(()));
                }
                None => self.invalid("scale", value, "expected down|both|canvas"),
            },
            "format" => match parse_format(value) {
                Some(f) => {
                    self.instructions.set_format(f);
                    self.apply("format", value, Ok(()));
                }
                None => self.invalid("format", value, "expected jpg|jpeg|png"),
            },
            "bgcolor" => match parse_color(value) {
                Some(c) => {
                    self.instructions.set_background(c);
                    self.apply("bgcolor", value, Ok(()));
                }
                None => self.invalid("bgcolor", value, "expected hex color or CSS color name"),
            },
            "ignoreicc" => match parse_bool(value) {
                Some(b) => {
                    self.instructions.set_ignore_icc(b);
                    self.apply("ignoreicc", value, Ok(()));
                }
                None => self.invalid("ignoreicc", value, "expected true|false|1|0|yes|no"),
            },

            // Legacy mode shortcuts; an explicit `mode` takes precedence.
            "crop" if value.eq_ignore_ascii_case("auto") => {
                if !self.seen.contains(&"mode") {
                    self.instructions.set_mode(FitMode::Crop);
                }
            }
            "stretch" if value.eq_ignore_ascii_case("fill") => {
                if !self.seen.contains(&"mode") {
                    self.instructions.set_mode(FitMode::Stretch);
                }
            }

            _ => self.warnings.push(ParseWarning::KeyNotRecognized {
                key: String::from(key),
                value: String::from(value),
            }),
        }
    }

    /// Record the outcome of assigning `key`.
    fn apply(&mut self, key: &'static str, value: &str, result: Result<(), ValidationError>) {
        match result {
            Ok(()) => {
                if self.seen.contains(&key) {
                    self.warnings.push(ParseWarning::DuplicateKey {
                        key: String::from(key),
                        value: String::from(value),
                    });
                } else {
                    self.seen.push(key);
                }
            }
            Err(e) => {
                self.warnings.push(ParseWarning::ValueInvalid {
                    key,
                    value: String::from(value),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn invalid(&mut self, key: &'static str, value: &str, reason: &str) {
        self.warnings.push(ParseWarning::ValueInvalid {
            key,
            value: String::from(value),
            reason: String::from(reason),
        });
    }
}

// ---- Value parsers ----

fn parse_int(s: &str) -> Option<i32> {
    s.parse::<i32>().ok()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_fit_mode(s: &str) -> Option<FitMode> {
    match s.to_ascii_lowercase().as_str() {
        "max" => Some(FitMode::Max),
        "pad" => Some(FitMode::Pad),
        "crop" => Some(FitMode::Crop),
        "stretch" => Some(FitMode::Stretch),
        _ => None,
    }
}

fn parse_scale_mode(s: &str) -> Option<ScaleMode> {
    match s.to_ascii_lowercase().as_str() {
        "down" | "downscaleonly" => Some(ScaleMode::DownscaleOnly),
        "both" => Some(ScaleMode::Both),
        "canvas" | "upscalecanvas" => Some(ScaleMode::UpscaleCanvas),
        _ => None,
    }
}

fn parse_format(s: &str) -> Option<OutputFormat> {
    match s.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
        "png" => Some(OutputFormat::Png),
        _ => None,
    }
}

/// Percent-decode a URL component. Also handles '+' as space.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::CanvasColor;

    #[test]
    fn basic_dimensions() {
        let r = parse("w=800&h=600");
        assert_eq!(r.instructions.width(), Some(800));
        assert_eq!(r.instructions.height(), Some(600));
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn long_names_and_leading_question_mark() {
        let r = parse("?width=12&height=34&mode=crop");
        assert_eq!(r.instructions.width(), Some(12));
        assert_eq!(r.instructions.height(), Some(34));
        assert_eq!(r.instructions.mode(), FitMode::Crop);
    }

    #[test]
    fn mode_scale_case_insensitive() {
        let r = parse("MODE=Pad&Scale=Canvas");
        assert_eq!(r.instructions.mode(), FitMode::Pad);
        assert_eq!(r.instructions.scale(), ScaleMode::UpscaleCanvas);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn format_quality_background_icc() {
        let r = parse("format=png&quality=75&bgcolor=%23ff0000&ignoreicc=true");
        let i = &r.instructions;
        assert_eq!(i.format(), OutputFormat::Png);
        assert_eq!(i.quality(), 75);
        assert_eq!(
            i.background(),
            CanvasColor::Srgb {
                r: 255,
                g: 0,
                b: 0,
                a: 255
            }
        );
        assert!(i.ignore_icc());
        assert!(r.warnings.is_empty(), "{:?}", r.warnings);
    }

    #[test]
    fn out_of_range_values_warn_and_keep_defaults() {
        let r = parse("w=0&h=-3&quality=150");
        assert_eq!(r.instructions.width(), None);
        assert_eq!(r.instructions.height(), None);
        assert_eq!(r.instructions.quality(), 90);
        let keys: Vec<_> = r
            .warnings
            .iter()
            .filter_map(|w| match w {
                ParseWarning::ValueInvalid { key, .. } => Some(*key),
                _ => None,
            })
            .collect();
        assert_eq!(keys, ["width", "height", "quality"]);
    }

    #[test]
    fn unparseable_values_warn() {
        let r = parse("mode=fill&scale=sideways&format=gif&w=abc");
        assert_eq!(r.warnings.len(), 4);
        assert_eq!(r.instructions, Instructions::new());
    }

    #[test]
    fn crop_auto_and_stretch_fill_shortcuts() {
        assert_eq!(parse("crop=auto").instructions.mode(), FitMode::Crop);
        assert_eq!(parse("stretch=fill").instructions.mode(), FitMode::Stretch);
        // Explicit mode wins regardless of order.
        assert_eq!(parse("mode=pad&crop=auto").instructions.mode(), FitMode::Pad);
    }

    #[test]
    fn duplicate_key_last_wins() {
        let r = parse("w=800&width=400");
        assert_eq!(r.instructions.width(), Some(400));
        assert!(
            r.warnings
                .iter()
                .any(|w| matches!(w, ParseWarning::DuplicateKey { key, .. } if key == "width"))
        );
    }

    #[test]
    fn unknown_key_warns() {
        let r = parse("w=800&foobar=baz");
        assert_eq!(
            r.warnings,
            [ParseWarning::KeyNotRecognized {
                key: String::from("foobar"),
                value: String::from("baz"),
            }]
        );
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("a%20b+c"), "a b c");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%41"), "A");
    }
}
