use log::warn;

/// Upper bound for the backward dictionary search.
///
/// Every byte of the window may be visited by the dictionary locator, so this
/// also caps the work spent on a single marker.
pub const MAX_LOOKBACK: usize = 16 * 1024;

pub const DEFAULT_LOOKBACK: usize = 1000;
pub const DEFAULT_LOOKAHEAD_FACTOR: usize = 2;
pub const DEFAULT_LOOKAHEAD_SLACK: usize = 64;
pub const DEFAULT_PREVIEW_LEN: usize = 10;

/// Options for scanning a buffer for stream objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Bytes searched backward from a stream marker for its dictionary
    pub lookback: usize,

    /// Forward window for `endstream`, as a multiple of the declared length
    pub lookahead_factor: usize,

    /// Extra bytes added to the forward window, so tiny streams still reach `endstream`
    pub lookahead_slack: usize,

    /// Payload bytes shown per object in reports
    pub preview_len: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            lookback: DEFAULT_LOOKBACK,
            lookahead_factor: DEFAULT_LOOKAHEAD_FACTOR,
            lookahead_slack: DEFAULT_LOOKAHEAD_SLACK,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}

impl ScanOptions {
    /// Create a builder for ScanOptions
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// End (exclusive) of the forward window for a payload starting at `payload_start`.
    pub(crate) fn lookahead_end(&self, payload_start: usize, declared: usize) -> usize {
        declared
            .saturating_mul(self.lookahead_factor)
            .saturating_add(self.lookahead_slack)
            .saturating_add(payload_start)
    }
}

/// Builder for ScanOptions
#[derive(Default)]
pub struct ScanOptionsBuilder {
    lookback: Option<usize>,
    lookahead_factor: Option<usize>,
    lookahead_slack: Option<usize>,
    preview_len: Option<usize>,
}

impl ScanOptionsBuilder {
    /// Set the backward search window, clamped to [`MAX_LOOKBACK`]
    pub fn lookback(mut self, value: usize) -> Self {
        self.lookback = Some(value);
        self
    }

    /// Set the forward window multiplier (at least 1)
    pub fn lookahead_factor(mut self, value: usize) -> Self {
        self.lookahead_factor = Some(value);
        self
    }

    /// Set the extra forward window bytes
    pub fn lookahead_slack(mut self, value: usize) -> Self {
        self.lookahead_slack = Some(value);
        self
    }

    /// Set the number of payload bytes shown in reports
    pub fn preview_len(mut self, value: usize) -> Self {
        self.preview_len = Some(value);
        self
    }

    /// Build the ScanOptions
    pub fn build(self) -> ScanOptions {
        let mut lookback = self.lookback.unwrap_or(DEFAULT_LOOKBACK);
        if lookback > MAX_LOOKBACK {
            warn!("Lookback of {} bytes exceeds the limit, using {}.", lookback, MAX_LOOKBACK);
            lookback = MAX_LOOKBACK;
        }
        ScanOptions {
            lookback,
            lookahead_factor: self.lookahead_factor.unwrap_or(DEFAULT_LOOKAHEAD_FACTOR).max(1),
            lookahead_slack: self.lookahead_slack.unwrap_or(DEFAULT_LOOKAHEAD_SLACK),
            preview_len: self.preview_len.unwrap_or(DEFAULT_PREVIEW_LEN),
        }
    }
}
