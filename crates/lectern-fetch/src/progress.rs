/// Progress callback: percent complete, 0–100.
pub type ProgressFn<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// Highest percentage reported while bytes are still arriving.
///
/// Parsing a multi-megabyte JSON document is itself user-visible latency, so
/// 100 is reserved for "parsed and ready", never for "bytes received".
pub const TRANSFER_CAP: u8 = 95;

/// Percent of the body received so far, capped at [`TRANSFER_CAP`].
pub fn transfer_percent(received: u64, content_length: u64) -> u8 {
    if content_length == 0 {
        return 0;
    }
    let percent = received.saturating_mul(100) / content_length;
    percent.min(u64::from(TRANSFER_CAP)) as u8
}
