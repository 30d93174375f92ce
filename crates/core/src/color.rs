use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Parses `#RRGGBB` and takes alpha from `opacity` (0.0..=1.0).
///
/// Anything other than seven characters with a leading `#` and six hex digits
/// yields black, still carrying the requested opacity.
pub fn parse_hex_color(input: &str, opacity: f64) -> Rgba {
    let alpha = opacity_to_alpha(opacity);
    let black = Rgba::new(0, 0, 0, alpha);

    let bytes = input.as_bytes();
    if bytes.len() != 7 || bytes[0] != b'#' {
        return black;
    }
    let channel = |hi: u8, lo: u8| -> Option<u8> { Some(hex_digit(hi)? << 4 | hex_digit(lo)?) };
    match (
        channel(bytes[1], bytes[2]),
        channel(bytes[3], bytes[4]),
        channel(bytes[5], bytes[6]),
    ) {
        (Some(r), Some(g), Some(b)) => Rgba::new(r, g, b, alpha),
        _ => black,
    }
}

fn opacity_to_alpha(opacity: f64) -> u8 {
    if opacity.is_nan() {
        return 0;
    }
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
