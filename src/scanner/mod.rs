//! Streaming string-literal scanner
//!
//! Extracts the double-quoted literals from a JSON-array-shaped byte stream
//! without building a document tree. Only the literals themselves are kept in
//! memory, so arbitrarily large runs of non-literal bytes cost nothing, and the
//! literal count is capped while reading.
//!
//! The scanner does not decode escape sequences: a `\"` inside a literal ends
//! that literal and the remainder is read as a new one.
//!
//! # Example
//!
//! ```
//! # #[tokio::main]
//! # async fn main() {
//! use url_mux::scanner::scan;
//!
//! let urls = scan(&br#"["http://a.test/", "http://b.test/"]"#[..], 20).await.unwrap();
//! assert_eq!(urls, vec!["http://a.test/", "http://b.test/"]);
//! # }
//! ```

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Errors that can occur while scanning a request body
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("request max urls count exceeded (max {max})")]
    TooManyLiterals { max: usize },

    #[error("body ended inside a string literal")]
    UnterminatedLiteral,

    #[error("string literal is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("failed to read body: {0}")]
    Io(#[from] std::io::Error),
}

/// Position of the scanner relative to the current literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Inside,
}

/// Two-state literal scanner fed one byte at a time
#[derive(Debug)]
pub struct LiteralScanner {
    state: State,
    current: Vec<u8>,
    literals: Vec<String>,
    max_count: usize,
}

impl LiteralScanner {
    /// Creates a scanner that accepts at most `max_count` literals
    pub fn new(max_count: usize) -> Self {
        Self {
            state: State::Outside,
            current: Vec::new(),
            literals: Vec::new(),
            max_count,
        }
    }

    /// Feeds one byte to the scanner
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The byte was consumed
    /// * `Err(ScanError::TooManyLiterals)` - Closing this literal would exceed the limit
    /// * `Err(ScanError::InvalidUtf8)` - The literal just closed is not valid UTF-8
    pub fn push(&mut self, byte: u8) -> Result<(), ScanError> {
        match (self.state, byte) {
            (State::Outside, b'"') => self.state = State::Inside,
            (State::Outside, _) => {}
            (State::Inside, b'"') => {
                self.state = State::Outside;
                if self.literals.len() >= self.max_count {
                    return Err(ScanError::TooManyLiterals {
                        max: self.max_count,
                    });
                }
                let literal = String::from_utf8(std::mem::take(&mut self.current))?;
                self.literals.push(literal);
            }
            (State::Inside, _) => self.current.push(byte),
        }
        Ok(())
    }

    /// Number of literals collected so far
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns true if no literal has been closed yet
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Finishes the scan at end of stream
    ///
    /// A stream that ends inside a literal with pending bytes is rejected. A
    /// dangling opening quote with nothing after it is tolerated.
    pub fn finish(self) -> Result<Vec<String>, ScanError> {
        if self.state == State::Inside && !self.current.is_empty() {
            return Err(ScanError::UnterminatedLiteral);
        }
        Ok(self.literals)
    }
}

/// Scans `reader` to the end and returns the literals in input order
///
/// # Arguments
///
/// * `reader` - The byte stream to scan (typically a request body)
/// * `max_count` - Maximum number of literals accepted
///
/// # Returns
///
/// * `Ok(Vec<String>)` - All literals, possibly empty
/// * `Err(ScanError)` - The stream was malformed, too long, or failed to read;
///   no partial results are returned
pub async fn scan<R>(reader: R, max_count: usize) -> Result<Vec<String>, ScanError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut scanner = LiteralScanner::new(max_count);

    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            break;
        }
        for &byte in chunk {
            scanner.push(byte)?;
        }
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    scanner.finish()
}
