//! HTTP/1.1 connection settings.
//!
//! The values bound the session buffers and the line-oriented parts of the
//! chunked coding. Everything defaults to what a general purpose client or
//! server would use.

/// Default capacity of the session buffers and size of a single socket read.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Default output fragment threshold.
pub const DEFAULT_CHUNK_SIZE_HINT: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Http1Config {
    buffer_size: usize,
    chunk_size_hint: usize,
    max_line_length: Option<usize>,
    max_header_count: Option<usize>,
}

impl Http1Config {
    pub fn builder() -> Http1ConfigBuilder {
        Http1ConfigBuilder::new()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Writes at least this large skip the output buffer.
    pub fn chunk_size_hint(&self) -> usize {
        self.chunk_size_hint
    }

    /// Upper bound for a chunk-size line or a trailer line, `None` for unlimited.
    pub fn max_line_length(&self) -> Option<usize> {
        self.max_line_length
    }

    /// Upper bound for the number of trailer fields, `None` for unlimited.
    pub fn max_header_count(&self) -> Option<usize> {
        self.max_header_count
    }
}

impl Default for Http1Config {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            chunk_size_hint: DEFAULT_CHUNK_SIZE_HINT,
            max_line_length: None,
            max_header_count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Http1ConfigBuilder {
    config: Http1Config,
}

impl Http1ConfigBuilder {
    fn new() -> Self {
        Self { config: Http1Config::default() }
    }

    /// A zero size falls back to the default.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.config.buffer_size = if buffer_size > 0 { buffer_size } else { DEFAULT_BUFFER_SIZE };
        self
    }

    pub fn chunk_size_hint(mut self, chunk_size_hint: usize) -> Self {
        self.config.chunk_size_hint = chunk_size_hint;
        self
    }

    pub fn max_line_length(mut self, max_line_length: usize) -> Self {
        self.config.max_line_length = Some(max_line_length);
        self
    }

    pub fn max_header_count(mut self, max_header_count: usize) -> Self {
        self.config.max_header_count = Some(max_header_count);
        self
    }

    pub fn build(self) -> Http1Config {
        self.config
    }
}
