//! Line-oriented standard input

use std::{io, time::Duration};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// Reads single lines from an interactive input
pub struct LineInput<R> {
    reader: R,
    timeout: Option<Duration>,
}

impl<R: AsyncBufRead + Unpin> LineInput<R> {
    /// Wrap `reader`; `timeout` bounds each read, `None` waits forever
    pub fn new(reader: R, timeout: Option<Duration>) -> Self {
        Self { reader, timeout }
    }

    /// Read one line without its line terminator
    ///
    /// End of input and an elapsed timeout both yield `None`.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line);

        let count = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, read).await {
                Ok(result) => result?,
                Err(_) => {
                    debug!(?timeout, "no input before timeout");
                    return Ok(None);
                }
            },
            None => read.await?,
        };

        if count == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_read_line_strips_terminator() {
        let mock = tokio_test::io::Builder::new().read(b"3\r\n").build();
        let mut input = LineInput::new(BufReader::new(mock), None);

        assert_eq!(input.read_line().await.unwrap(), Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_read_line_across_chunks() {
        let mock = tokio_test::io::Builder::new()
            .read(b"1")
            .wait(Duration::from_millis(5))
            .read(b"2\n")
            .build();
        let mut input = LineInput::new(BufReader::new(mock), None);

        assert_eq!(input.read_line().await.unwrap(), Some("12".to_string()));
    }

    #[tokio::test]
    async fn test_read_line_eof() {
        let mut input = LineInput::new(&b""[..], None);
        assert_eq!(input.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_timeout() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut input = LineInput::new(BufReader::new(reader), Some(Duration::from_millis(20)));

        assert_eq!(input.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_error() {
        let mock = tokio_test::io::Builder::new()
            .read_error(io::Error::other("broken pipe"))
            .build();
        let mut input = LineInput::new(BufReader::new(mock), None);

        assert!(input.read_line().await.is_err());
    }
}
