//! JSON-lines feed adapter.
//!
//! Stands in for the fetch collaborator: one raw payload per line. Blank
//! lines are ignored. A line that is not valid JSON is passed through as a
//! JSON string so the normalizer rejects it as a malformed payload rather
//! than the whole feed failing.

use futures::{Stream, StreamExt, stream::BoxStream};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::TransportError;

/// Parse `reader` as a stream of JSON-lines payloads. The stream ends after
/// the first I/O error.
pub fn json_lines<R>(reader: R) -> impl Stream<Item = Result<Value, TransportError>>
where
  R: AsyncBufRead + Unpin,
{
  futures::stream::unfold(Some(reader.lines()), |state| async move {
    let Some(mut lines) = state else {
      return None;
    };
    loop {
      match lines.next_line().await {
        Ok(Some(line)) => {
          let line = line.trim();
          if line.is_empty() {
            continue;
          }
          let payload = serde_json::from_str(line)
            .unwrap_or_else(|_| Value::String(line.to_owned()));
          return Some((Ok(payload), Some(lines)));
        }
        Ok(None) => return None,
        Err(err) => return Some((Err(TransportError::Io(err)), None)),
      }
    }
  })
}

/// Open `input` as a feed: a file path, or `-` for stdin.
pub async fn open(
  input: &str,
) -> Result<BoxStream<'static, Result<Value, TransportError>>, TransportError> {
  if input == "-" {
    return Ok(json_lines(BufReader::new(tokio::io::stdin())).boxed());
  }
  let file = tokio::fs::File::open(input).await?;
  Ok(json_lines(BufReader::new(file)).boxed())
}
