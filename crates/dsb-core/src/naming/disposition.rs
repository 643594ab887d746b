//! `Content-Disposition` filename extraction (`filename` and RFC 5987 `filename*`).

/// Filename carried by a `Content-Disposition` header value, if any.
/// `filename*` takes precedence over `filename`.
pub fn disposition_filename(header: &str) -> Option<String> {
    let mut plain: Option<String> = None;
    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "filename*" => {
                // charset'lang'percent-encoded
                let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
                let decoded = percent_decode(encoded.trim_matches('"'));
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
            "filename" => {
                let v = unquote(value);
                if !v.is_empty() {
                    plain = Some(v);
                }
            }
            _ => {}
        }
    }
    plain
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Lossy percent-decoding; malformed escapes are kept literally.
pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
