/// 8-bit RGBA color, straight (not premultiplied) alpha.
///
/// This is the color space of the host canvas and of CSS-style hex strings,
/// which is also its serialized form - snapshots must compare structurally
/// across a JSON round-trip, and `u8` channels make that equality exact where
/// floats would not.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);

    /// Fully opaque color from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.0[3]
    }
    /// Hex string form, `#rrggbb` when fully opaque, `#rrggbbaa` otherwise.
    /// Formatted correctly for [`std::str::FromStr`].
    #[must_use]
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorFromStrError {
    #[error("expected leading '#'")]
    MissingHash,
    #[error("expected 3, 4, 6, or 8 hex digits")]
    BadLength,
    #[error("invalid hex digit")]
    BadDigit,
}

/// Parse CSS-style hex syntax: `#rgb`, `#rgba`, `#rrggbb`, or `#rrggbbaa`.
impl std::str::FromStr for Color {
    type Err = ColorFromStrError;
    fn from_str(str: &str) -> Result<Self, Self::Err> {
        let digits = str
            .strip_prefix('#')
            .ok_or(ColorFromStrError::MissingHash)?;
        let nibble = |byte: u8| -> Result<u8, ColorFromStrError> {
            match byte {
                b'0'..=b'9' => Ok(byte - b'0'),
                b'a'..=b'f' => Ok(byte - b'a' + 10),
                b'A'..=b'F' => Ok(byte - b'A' + 10),
                _ => Err(ColorFromStrError::BadDigit),
            }
        };
        match digits.as_bytes() {
            // Short form doubles each digit, per CSS.
            [r, g, b] => Ok(Self([
                nibble(*r)? * 17,
                nibble(*g)? * 17,
                nibble(*b)? * 17,
                255,
            ])),
            [r, g, b, a] => Ok(Self([
                nibble(*r)? * 17,
                nibble(*g)? * 17,
                nibble(*b)? * 17,
                nibble(*a)? * 17,
            ])),
            [r1, r0, g1, g0, b1, b0] => Ok(Self([
                nibble(*r1)? << 4 | nibble(*r0)?,
                nibble(*g1)? << 4 | nibble(*g0)?,
                nibble(*b1)? << 4 | nibble(*b0)?,
                255,
            ])),
            [r1, r0, g1, g0, b1, b0, a1, a0] => Ok(Self([
                nibble(*r1)? << 4 | nibble(*r0)?,
                nibble(*g1)? << 4 | nibble(*g0)?,
                nibble(*b1)? << 4 | nibble(*b0)?,
                nibble(*a1)? << 4 | nibble(*a0)?,
            ])),
            _ => Err(ColorFromStrError::BadLength),
        }
    }
}

impl serde::Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Hex string, so documents stay human-readable and canvas-compatible.
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Delegate to FromStr from a borrowed or owned string, depending on capabilities of deserializer.
        let str =
            <std::borrow::Cow<'de, str> as serde::Deserialize<'de>>::deserialize(deserializer)?;
        str.parse().map_err(serde::de::Error::custom)
    }
}
