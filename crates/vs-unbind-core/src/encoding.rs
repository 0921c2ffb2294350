use crate::error::Error;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// On-disk encoding of a text file, including whether a BOM was present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8 { bom: bool },
    Utf16Le,
    Utf16Be,
    /// Single or multi-byte code page without a BOM, e.g. windows-1252.
    Legacy(&'static Encoding),
}

impl TextEncoding {
    /// Detects a byte order mark. Returns the encoding and the BOM length.
    pub fn sniff_bom(bytes: &[u8]) -> Option<(TextEncoding, usize)> {
        let (encoding, bom_len) = Encoding::for_bom(bytes)?;
        let detected = if encoding == UTF_8 {
            TextEncoding::Utf8 { bom: true }
        } else if encoding == UTF_16LE {
            TextEncoding::Utf16Le
        } else {
            TextEncoding::Utf16Be
        };
        Some((detected, bom_len))
    }

    /// Resolves an encoding label such as `utf-8` or `Windows-1252`.
    pub fn for_label(label: &str) -> Option<TextEncoding> {
        let encoding = Encoding::for_label(label.trim().as_bytes())?;
        Some(Self::from_encoding(encoding, false))
    }

    fn from_encoding(encoding: &'static Encoding, bom: bool) -> TextEncoding {
        if encoding == UTF_8 {
            TextEncoding::Utf8 { bom }
        } else if encoding == UTF_16LE {
            TextEncoding::Utf16Le
        } else if encoding == UTF_16BE {
            TextEncoding::Utf16Be
        } else {
            TextEncoding::Legacy(encoding)
        }
    }

    fn encoding(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 { .. } => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
            TextEncoding::Legacy(encoding) => encoding,
        }
    }

    pub fn name(&self) -> &'static str {
        self.encoding().name()
    }

    /// Decodes `body`, which must not include the BOM.
    pub fn decode(&self, body: &[u8]) -> Result<String, Error> {
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
            .ok_or_else(|| Error::UndecodableText(self.name()))
    }

    /// Encodes `text`, writing a BOM for UTF-8-with-BOM and both UTF-16 forms.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 { bom } => {
                let mut out = Vec::with_capacity(text.len() + 3);
                if *bom {
                    out.extend_from_slice(&UTF8_BOM);
                }
                out.extend_from_slice(text.as_bytes());
                out
            }
            // encoding_rs never encodes into UTF-16, so these are done by hand.
            TextEncoding::Utf16Le => {
                let mut out = vec![0xFF, 0xFE];
                out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                out
            }
            TextEncoding::Utf16Be => {
                let mut out = vec![0xFE, 0xFF];
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                out
            }
            TextEncoding::Legacy(encoding) => {
                let (bytes, _, _) = encoding.encode(text);
                bytes.into_owned()
            }
        }
    }
}

/// Decodes a plain text file: BOM if present, else UTF-8, else windows-1252.
pub fn decode_text(bytes: &[u8]) -> Result<(String, TextEncoding), Error> {
    if let Some((encoding, bom_len)) = TextEncoding::sniff_bom(bytes) {
        let text = encoding.decode(&bytes[bom_len..])?;
        return Ok((text, encoding));
    }

    let utf8 = TextEncoding::Utf8 { bom: false };
    match utf8.decode(bytes) {
        Ok(text) => Ok((text, utf8)),
        Err(_) => {
            let legacy = TextEncoding::Legacy(WINDOWS_1252);
            let text = legacy.decode(bytes)?;
            Ok((text, legacy))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Lf,
}

impl LineEnding {
    /// CRLF wins whenever it appears at all; text without any break gets CRLF.
    pub fn detect(text: &str) -> LineEnding {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else if text.contains('\n') {
            LineEnding::Lf
        } else {
            LineEnding::CrLf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_keeps_utf8_bom_flag() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Microsoft Visual Studio".as_bytes());
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "Microsoft Visual Studio");
        assert_eq!(encoding, TextEncoding::Utf8 { bom: true });
        assert_eq!(encoding.encode(&text), bytes);
    }

    #[test]
    fn test_decode_text_without_bom() {
        let (text, encoding) = decode_text("Project(\"x\")".as_bytes()).unwrap();
        assert_eq!(text, "Project(\"x\")");
        assert_eq!(encoding, TextEncoding::Utf8 { bom: false });
    }

    #[test]
    fn test_decode_text_falls_back_to_windows_1252() {
        // "Müller" in windows-1252
        let bytes = [0x4D, 0xFC, 0x6C, 0x6C, 0x65, 0x72];
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "Müller");
        assert_eq!(encoding, TextEncoding::Legacy(WINDOWS_1252));
        assert_eq!(encoding.encode(&text), bytes.to_vec());
    }

    #[test]
    fn test_utf16_le_roundtrip_with_bom() {
        let encoded = TextEncoding::Utf16Le.encode("<a/>");
        assert_eq!(&encoded[..2], &[0xFF, 0xFE]);
        let (detected, bom_len) = TextEncoding::sniff_bom(&encoded).unwrap();
        assert_eq!(detected, TextEncoding::Utf16Le);
        assert_eq!(detected.decode(&encoded[bom_len..]).unwrap(), "<a/>");
    }

    #[test]
    fn test_for_label() {
        assert_eq!(
            TextEncoding::for_label("UTF-8"),
            Some(TextEncoding::Utf8 { bom: false })
        );
        assert_eq!(
            TextEncoding::for_label("Windows-1252"),
            Some(TextEncoding::Legacy(WINDOWS_1252))
        );
        assert_eq!(TextEncoding::for_label("no-such-encoding"), None);
    }

    #[test]
    fn test_line_ending_detect() {
        assert_eq!(LineEnding::detect("a\r\nb\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("single line"), LineEnding::CrLf);
    }
}
