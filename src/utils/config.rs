/// Run-wide timing and retry defaults
#[derive(Debug, Clone, Copy)]
pub struct RunDefaults {
    /// Settle delay after a filter or search interaction (ms)
    pub settle_ms: u64,

    /// Wait for the first result tile after filtering (ms)
    pub result_timeout_ms: u64,

    /// Wait for the result list to drain after a filter reset (ms)
    pub reset_timeout_ms: u64,

    /// Visibility probe per overlay selector (ms)
    pub overlay_timeout_ms: u64,

    /// Wait for the demo close control / opened tab (ms)
    pub demo_timeout_ms: u64,

    /// Default timeout for element waiting (ms)
    pub default_timeout_ms: u64,

    /// Click attempts before a step gives up
    pub click_retry_count: u32,

    /// Delay between click retries (ms)
    pub retry_delay_ms: u64,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            settle_ms: 2500,
            result_timeout_ms: 20_000,
            reset_timeout_ms: 10_000,
            overlay_timeout_ms: 1500,
            demo_timeout_ms: 15_000,
            default_timeout_ms: 5000,
            click_retry_count: 3,
            retry_delay_ms: 1000,
        }
    }
}
