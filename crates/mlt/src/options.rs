//! Decoder configuration.

/// Default upper bound on accepted tile sizes.
pub const DEFAULT_MAX_TILE_SIZE: usize = 16 * 1024 * 1024;

/// Options controlling how a [`crate::Decoder`] accepts schemas and tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Tiles larger than this are rejected before decoding. `None` disables the check.
    pub max_tile_size: Option<usize>,
    /// Reject metadata containing column types the decoder cannot decode.
    ///
    /// When `false` such columns are kept and only fail if a tile contains them.
    pub require_known_columns: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_tile_size: Some(DEFAULT_MAX_TILE_SIZE),
            require_known_columns: true,
        }
    }
}

impl DecoderOptions {
    #[must_use]
    pub fn max_tile_size(mut self, limit: Option<usize>) -> Self {
        self.max_tile_size = limit;
        self
    }

    #[must_use]
    pub fn require_known_columns(mut self, require: bool) -> Self {
        self.require_known_columns = require;
        self
    }
}
