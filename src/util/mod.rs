/// ISO-8601 timestamp for `read_at` touches (backend stores timestamptz).
pub(crate) fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

const TMP_ID_PREFIX: &str = "tmp-";

/// Random v4 UUID string.
///
/// Used for optimistic block ids and embedded checklist item ids.
pub(crate) fn new_uuid() -> String {
    let mut bytes = [0u8; 16];
    // getrandom's js backend reads crypto.getRandomValues; a browser without
    // WebCrypto is not supported.
    let _ = getrandom::getrandom(&mut bytes);

    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let h = |b: &[u8]| b.iter().map(|x| format!("{:02x}", x)).collect::<String>();
    format!(
        "{}-{}-{}-{}-{}",
        h(&bytes[0..4]),
        h(&bytes[4..6]),
        h(&bytes[6..8]),
        h(&bytes[8..10]),
        h(&bytes[10..16]),
    )
}

/// Optimistic client-side id for a block that has not been created remotely.
/// Swapped for the server-assigned id on reconciliation.
pub(crate) fn new_tmp_id() -> String {
    format!("{}{}", TMP_ID_PREFIX, new_uuid())
}

pub(crate) fn is_tmp_id(id: &str) -> bool {
    id.starts_with(TMP_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_ids_are_recognizable() {
        assert!(is_tmp_id("tmp-123"));
        assert!(!is_tmp_id("8b9e3c1a-0000-4000-8000-000000000000"));
        assert!(!is_tmp_id(""));
    }
}
