//! Excel string escape handling

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' {
            result.push(c);
            continue;
        }

        let mut hex_chars = String::new();
        let mut is_escape = false;

        if chars.peek() == Some(&'x') {
            chars.next(); // consume 'x'

            for _ in 0..4 {
                match chars.peek() {
                    Some(&ch) if ch.is_ascii_hexdigit() => {
                        hex_chars.push(ch);
                        chars.next();
                    }
                    _ => break,
                }
            }

            if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
                chars.next(); // consume closing '_'
                if let Some(decoded) =
                    u32::from_str_radix(&hex_chars, 16).ok().and_then(char::from_u32)
                {
                    result.push(decoded);
                    is_escape = true;
                }
            }
        }

        if !is_escape {
            result.push('_');
            if !hex_chars.is_empty() {
                result.push('x');
                result.push_str(&hex_chars);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_control_characters() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("line1_x000d__x000a_line2"), "line1\r\nline2");
    }

    #[test]
    fn test_decode_underscore() {
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(decode_excel_escapes("Checkouts a pagar"), "Checkouts a pagar");
    }

    #[test]
    fn test_partial_sequences_kept() {
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d"); // missing trailing _
    }
}
