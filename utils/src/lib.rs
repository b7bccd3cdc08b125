pub mod config;
pub mod lightning_address;
pub mod lnurl;
pub mod nostr;
pub mod xlogging;

pub mod time {
    use std::time::SystemTime;

    pub fn time_now() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    #[inline]
    pub fn elapsed_ms(since_ms: u64) -> u64 {
        time_now().saturating_sub(since_ms)
    }
}
