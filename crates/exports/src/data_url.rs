use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Pack bytes as `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Inverse of [`encode_data_url`]; `None` for anything that is not a base64
/// data URL.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_mime_prefix() {
        assert_eq!(encode_data_url("text/csv", b"a,b"), "data:text/csv;base64,YSxi");
    }

    #[test]
    fn rejects_non_base64_urls() {
        assert!(decode_data_url("data:text/plain,hello").is_none());
        assert!(decode_data_url("https://example.com").is_none());
        assert_eq!(
            decode_data_url("data:text/csv;base64,YSxi"),
            Some(("text/csv".to_string(), b"a,b".to_vec()))
        );
    }
}
