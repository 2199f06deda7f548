//! Configuration for placeholder resolution and template filling

/// Configuration options for placeholder resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Abort resolution when a block straddles the current cell.
    /// When false the block is kept and reported as a warning.
    pub reject_straddling_blocks: bool,

    /// Text placed between the pieces of a block that spans several cells
    pub block_separator: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            reject_straddling_blocks: true,
            block_separator: "\n".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose whether straddling blocks abort resolution
    pub fn with_reject_straddling_blocks(mut self, reject: bool) -> Self {
        self.reject_straddling_blocks = reject;
        self
    }

    /// Set the separator used when joining multi-cell blocks
    pub fn with_block_separator(mut self, separator: impl Into<String>) -> Self {
        self.block_separator = separator.into();
        self
    }
}

/// Configuration options for template filling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillConfig {
    /// Collapse runs of blank lines left behind by empty substitutions
    pub collapse_blank_lines: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            collapse_blank_lines: true,
        }
    }
}

impl FillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collapse_blank_lines(mut self, collapse: bool) -> Self {
        self.collapse_blank_lines = collapse;
        self
    }
}
