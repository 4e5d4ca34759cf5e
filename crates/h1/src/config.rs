//! Tunables of the HTTP/1 engine.
//!
//! [`HttpOptions`] is shared by every connection of a server, usually behind an
//! `Arc`. [`ConnectionInfo`] describes one accepted connection.

use std::time::Duration;

/// Options bounding what a single connection accepts and how it writes.
///
/// ```
/// use micro_h1::HttpOptions;
/// use std::time::Duration;
///
/// let options = HttpOptions::builder()
///     .max_body_size(1024 * 1024)
///     .connection_timeout(Duration::from_secs(15))
///     .build();
///
/// assert_eq!(options.max_body_size(), 1024 * 1024);
/// assert_eq!(options.max_header_size(), 32 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct HttpOptions {
    max_header_size: usize,
    max_body_size: u64,
    io_granularity: usize,
    output_buffer_size: usize,
    max_requests_per_connection: u64,
    connection_timeout: Duration,
    normalize_method_case: bool,
    body_channel_capacity: usize,
}

impl HttpOptions {
    pub const DEFAULT_MAX_HEADER_SIZE: usize = 32 * 1024;
    pub const DEFAULT_MAX_BODY_SIZE: u64 = 128 * 1024;
    pub const DEFAULT_IO_GRANULARITY: usize = 8 * 1024;
    pub const DEFAULT_OUTPUT_BUFFER_SIZE: usize = 8 * 1024;
    pub const DEFAULT_MAX_REQUESTS_PER_CONNECTION: u64 = 1000;
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(6);

    /// A request budget this large is treated as unbounded.
    pub const UNBOUNDED_REQUESTS: u64 = u64::MAX;

    pub fn builder() -> HttpOptionsBuilder {
        HttpOptionsBuilder { options: HttpOptions::default() }
    }

    /// Maximum bytes of the start line plus header fields, and of a trailer section.
    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    /// Default maximum body size of a request, handlers may raise it per request.
    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }

    /// Size of the body segments delivered to handlers.
    pub fn io_granularity(&self) -> usize {
        self.io_granularity
    }

    /// Buffered response bytes that trigger a write to the socket.
    pub fn output_buffer_size(&self) -> usize {
        self.output_buffer_size
    }

    pub fn max_requests_per_connection(&self) -> u64 {
        self.max_requests_per_connection
    }

    /// The idle timeout advertised in the `keep-alive` header.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn normalize_method_case(&self) -> bool {
        self.normalize_method_case
    }

    pub fn body_channel_capacity(&self) -> usize {
        self.body_channel_capacity
    }
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            max_header_size: Self::DEFAULT_MAX_HEADER_SIZE,
            max_body_size: Self::DEFAULT_MAX_BODY_SIZE,
            io_granularity: Self::DEFAULT_IO_GRANULARITY,
            output_buffer_size: Self::DEFAULT_OUTPUT_BUFFER_SIZE,
            max_requests_per_connection: Self::DEFAULT_MAX_REQUESTS_PER_CONNECTION,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
            normalize_method_case: true,
            body_channel_capacity: 8,
        }
    }
}

#[derive(Debug)]
pub struct HttpOptionsBuilder {
    options: HttpOptions,
}

impl HttpOptionsBuilder {
    #[must_use]
    pub fn max_header_size(mut self, size: usize) -> Self {
        self.options.max_header_size = size;
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: u64) -> Self {
        self.options.max_body_size = size;
        self
    }

    #[must_use]
    pub fn io_granularity(mut self, size: usize) -> Self {
        self.options.io_granularity = size.max(1);
        self
    }

    #[must_use]
    pub fn output_buffer_size(mut self, size: usize) -> Self {
        self.options.output_buffer_size = size;
        self
    }

    /// Number of requests served on one connection before it is closed,
    /// [`HttpOptions::UNBOUNDED_REQUESTS`] disables the limit. A connection
    /// always serves at least one request.
    #[must_use]
    pub fn max_requests_per_connection(mut self, count: u64) -> Self {
        self.options.max_requests_per_connection = count.max(1);
        self
    }

    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.options.connection_timeout = timeout;
        self
    }

    #[must_use]
    pub fn normalize_method_case(mut self, normalize: bool) -> Self {
        self.options.normalize_method_case = normalize;
        self
    }

    #[must_use]
    pub fn body_channel_capacity(mut self, capacity: usize) -> Self {
        self.options.body_channel_capacity = capacity;
        self
    }

    pub fn build(self) -> HttpOptions {
        self.options
    }
}

/// Facts about the accepted connection needed to resolve request URIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Local port the connection was accepted on, appended to a `Host` without port.
    pub local_port: Option<u16>,
    /// Whether the connection is wrapped in TLS, selecting the `https` scheme.
    pub encrypted: bool,
}

impl ConnectionInfo {
    pub fn new(local_port: Option<u16>, encrypted: bool) -> Self {
        Self { local_port, encrypted }
    }

    pub fn scheme(&self) -> &'static str {
        if self.encrypted { "https" } else { "http" }
    }
}
