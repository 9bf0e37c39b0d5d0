use encoding_rs::{Encoding, UTF_8};
use lazy_static::lazy_static;
use std::borrow::Cow;

#[cfg(windows)]
use windows_sys::Win32::Globalization::GetACP;

lazy_static! {
    /// Code page the OVS tools fall back to when they do not print UTF-8.
    static ref CONSOLE_ENCODING: &'static Encoding = console_encoding();
}

#[cfg(windows)]
fn console_encoding() -> &'static Encoding {
    let acp = unsafe { GetACP() };
    u16::try_from(acp)
        .ok()
        .and_then(codepage::to_encoding)
        .unwrap_or(UTF_8)
}

#[cfg(not(windows))]
fn console_encoding() -> &'static Encoding {
    UTF_8
}

/// Decodes captured tool output and strips surrounding whitespace.
pub fn decode_output(raw: &[u8]) -> String {
    decode_with(raw, *CONSOLE_ENCODING)
}

/// UTF-8 first, then `fallback` if it decodes cleanly, then lossy UTF-8.
fn decode_with(raw: &[u8], fallback: &'static Encoding) -> String {
    let text = match std::str::from_utf8(raw) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) if fallback != UTF_8 => fallback
            .decode_without_bom_handling_and_without_replacement(raw)
            .unwrap_or_else(|| String::from_utf8_lossy(raw)),
        Err(_) => String::from_utf8_lossy(raw),
    };
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trims_utf8_output() {
        assert_eq!(decode_output(b"  br-int\n"), "br-int");
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_output(b""), "");
    }

    #[test]
    fn test_invalid_bytes_without_code_page_are_lossy() {
        let decoded = decode_with(b"rx pkts=1\xff\n", UTF_8);
        assert_eq!(decoded, "rx pkts=1\u{FFFD}");
    }

    #[test]
    fn test_code_page_fallback() {
        // "vm1-caf\u{e9}" as printed by a Windows-1252 console.
        let decoded = decode_with(b"vm1-caf\xe9\r\n", encoding_rs::WINDOWS_1252);
        assert_eq!(decoded, "vm1-caf\u{e9}");
    }

    #[test]
    fn test_code_page_that_cannot_decode_falls_back_to_lossy() {
        // A Shift_JIS lead byte with nothing after it.
        let decoded = decode_with(b"br\x81", encoding_rs::SHIFT_JIS);
        assert_eq!(decoded, "br\u{FFFD}");
    }

    #[test]
    fn test_utf8_wins_over_code_page() {
        let decoded = decode_with("caf\u{e9}".as_bytes(), encoding_rs::WINDOWS_1252);
        assert_eq!(decoded, "caf\u{e9}");
    }
}
