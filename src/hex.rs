//! The assembler/simulator interchange format: one instruction per
//! line, each an 8-digit lowercase hex word with no `0x` prefix.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("line {line}: expected 8 hex digits, got {text:?}")]
    BadLength { line: usize, text: String },
    #[error("line {line}: not valid hex: {text:?}")]
    BadDigit { line: usize, text: String },
}

/// Parse a hex object listing into its sequence of instruction words.
pub fn parse(source: &str) -> Result<Vec<u32>, HexError> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let line_no = i + 1;
            let text = line.trim();
            if text.len() != 8 {
                return Err(HexError::BadLength { line: line_no, text: text.to_string() });
            }
            u32::from_str_radix(text, 16)
                .map_err(|_| HexError::BadDigit { line: line_no, text: text.to_string() })
        })
        .collect()
}

/// Render a sequence of instruction words as a hex object listing.
pub fn render(words: &[u32]) -> String {
    let mut out = String::with_capacity(words.len() * 9);
    for word in words {
        out.push_str(&format!("{word:08x}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_roundtrip() {
        let words = vec![0x0000_0013, 0xdead_beef, 0x0010_0073];
        let text = render(&words);
        assert_eq!(parse(&text).unwrap(), words);
    }

    #[test]
    fn parse_ignores_blank_lines() {
        let text = "00000013\n\n0010_0073".replace('_', "0");
        assert_eq!(parse(&text).unwrap(), vec![0x0000_0013, 0x0010_0073]);
    }

    #[test]
    fn parse_rejects_short_line() {
        assert_eq!(
            parse("123"),
            Err(HexError::BadLength { line: 1, text: "123".to_string() })
        );
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert_eq!(
            parse("gggggggg"),
            Err(HexError::BadDigit { line: 1, text: "gggggggg".to_string() })
        );
    }
}
