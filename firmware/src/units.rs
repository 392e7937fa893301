/// Duration helpers for timing constants.
pub trait TimeExt {
    #[allow(dead_code)]
    fn ms(self) -> embassy_time::Duration;
    #[allow(dead_code)]
    fn s(self) -> embassy_time::Duration;
}

impl TimeExt for u64 {
    fn ms(self) -> embassy_time::Duration {
        embassy_time::Duration::from_millis(self)
    }

    fn s(self) -> embassy_time::Duration {
        embassy_time::Duration::from_secs(self)
    }
}
