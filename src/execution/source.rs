//! Line sources feeding the execution controller

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Sequential provider of text lines
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its line ending, `None` once exhausted
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;
}

/// Lines read from an async reader
///
/// Both `\n` and `\r\n` endings are removed. Invalid UTF-8 is replaced
/// rather than treated as a read failure.
#[derive(Debug)]
pub struct ReaderLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin + Send> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: AsyncRead + Unpin + Send> ReaderLines<BufReader<R>> {
    pub fn buffered(reader: R) -> Self {
        Self::new(BufReader::new(reader))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for ReaderLines<R> {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

#[async_trait]
impl LineSource for mpsc::Receiver<String> {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.recv().await)
    }
}
