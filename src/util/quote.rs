/// Unwraps a payload that is itself a quoted string literal.
///
/// Double- and single-quoted literals are decoded with Go escape rules, so
/// `\xHH` and octal escapes yield raw bytes and `\u`/`\U` yield UTF-8. A
/// single-quoted literal holds at most one character. Backquoted literals are
/// taken raw without carriage returns. Returns `None` when the payload is not
/// such a literal.
pub fn unquote(data: &[u8]) -> Option<Vec<u8>> {
    let n = data.len();
    if n < 2 {
        return None;
    }

    let quote = data[0];
    if data[n - 1] != quote {
        return None;
    }

    let inner = &data[1..n - 1];
    match quote {
        b'`' => {
            if inner.contains(&b'`') {
                return None;
            }
            Some(inner.iter().copied().filter(|&b| b != b'\r').collect())
        }
        b'"' | b'\'' => unquote_escaped(inner, quote),
        _ => None,
    }
}

fn unquote_escaped(mut rest: &[u8], quote: u8) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(rest.len());
    let mut chars = 0;

    while !rest.is_empty() {
        if rest[0] == b'\n' {
            return None;
        }
        rest = unquote_char(rest, quote, &mut out)?;
        chars += 1;
    }

    if quote == b'\'' && chars > 1 {
        return None;
    }

    Some(out)
}

/// Decodes the character or escape at the start of `s` into `out` and
/// returns the remainder.
fn unquote_char<'a>(s: &'a [u8], quote: u8, out: &mut Vec<u8>) -> Option<&'a [u8]> {
    let c = s[0];
    if c == quote {
        return None;
    }
    if c >= 0x80 {
        let (ch, size) = decode_char(s);
        push_char(out, ch);
        return Some(&s[size..]);
    }
    if c != b'\\' {
        out.push(c);
        return Some(&s[1..]);
    }

    let (&esc, rest) = s[1..].split_first()?;
    let simple = match esc {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        b'\\' => Some(b'\\'),
        // a quote may only be escaped inside its own kind of literal
        b'\'' | b'"' if esc == quote => Some(esc),
        _ => None,
    };
    if let Some(b) = simple {
        out.push(b);
        return Some(rest);
    }

    match esc {
        b'x' => {
            let (v, rest) = hex_digits(rest, 2)?;
            out.push(v as u8);
            Some(rest)
        }
        b'u' | b'U' => {
            let len = if esc == b'u' { 4 } else { 8 };
            let (v, rest) = hex_digits(rest, len)?;
            push_char(out, char::from_u32(v)?);
            Some(rest)
        }
        b'0'..=b'7' => {
            if rest.len() < 2 {
                return None;
            }
            let mut v = u32::from(esc - b'0');
            for &d in &rest[..2] {
                if !(b'0'..=b'7').contains(&d) {
                    return None;
                }
                v = v * 8 + u32::from(d - b'0');
            }
            if v > 0xff {
                return None;
            }
            out.push(v as u8);
            Some(&rest[2..])
        }
        _ => None,
    }
}

fn hex_digits(s: &[u8], len: usize) -> Option<(u32, &[u8])> {
    if s.len() < len {
        return None;
    }

    let mut v = 0u32;
    for &d in &s[..len] {
        v = (v << 4) | char::from(d).to_digit(16)?;
    }

    Some((v, &s[len..]))
}

// Invalid UTF-8 decodes to U+FFFD one byte at a time.
fn decode_char(s: &[u8]) -> (char, usize) {
    for len in 2..=s.len().min(4) {
        if let Ok(decoded) = std::str::from_utf8(&s[..len]) {
            if let Some(c) = decoded.chars().next() {
                return (c, len);
            }
        }
    }

    (char::REPLACEMENT_CHARACTER, 1)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
}
