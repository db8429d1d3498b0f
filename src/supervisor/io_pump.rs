use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

/// Bounded wait per stream when collecting the pump tasks after the monitor
/// loop exits.
const JOIN_GRACE: Duration = Duration::from_secs(2);

/// The three stdio tasks of a running child. Each reader owns its buffer; the
/// writer closes stdin by dropping the handle once the payload is written.
#[derive(Debug)]
pub struct IoPump {
    stdin: JoinHandle<()>,
    stdout: JoinHandle<String>,
    stderr: JoinHandle<String>,
}

/// Takes the child's stdio handles and spawns the pump tasks. Must run before
/// the monitor starts polling so a chatty child cannot fill a pipe and stall.
pub fn start(child: &mut Child, input: Option<String>) -> IoPump {
    let stdin_handle = child.stdin.take();
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdin = tokio::spawn(async move {
        let Some(mut handle) = stdin_handle else {
            return;
        };
        if let Some(payload) = input {
            if !payload.is_empty() {
                if let Err(e) = handle.write_all(payload.as_bytes()).await {
                    // The child may exit or close stdin before reading it all.
                    debug!(error = %e, "stdin write interrupted");
                }
            }
        }
        drop(handle);
    });

    let stdout = tokio::spawn(drain_lines(stdout_handle, "stdout"));
    let stderr = tokio::spawn(drain_lines(stderr_handle, "stderr"));

    IoPump {
        stdin,
        stdout,
        stderr,
    }
}

/// Reads line by line into a private buffer until EOF. Newlines are kept
/// exactly as the child produced them. Read errors stop the loop.
async fn drain_lines<R: AsyncRead + Unpin + Send>(stream: Option<R>, name: &'static str) -> String {
    let mut captured = String::new();
    let Some(stream) = stream else {
        return captured;
    };
    let mut reader = BufReader::new(stream);
    loop {
        match reader.read_line(&mut captured).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(stream = name, error = %e, "read interrupted");
                break;
            }
        }
    }
    captured
}

impl IoPump {
    /// Collects the captured streams. Each join is bounded; a task that does
    /// not finish in time is aborted and contributes an empty capture.
    pub async fn join(mut self) -> (String, String) {
        if timeout(JOIN_GRACE, &mut self.stdin).await.is_err() {
            warn!("stdin task did not finish in time");
            self.stdin.abort();
        }

        let stdout = join_reader(self.stdout, "stdout").await;
        let stderr = join_reader(self.stderr, "stderr").await;
        (stdout, stderr)
    }
}

async fn join_reader(mut task: JoinHandle<String>, name: &'static str) -> String {
    match timeout(JOIN_GRACE, &mut task).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(stream = name, error = %e, "reader task failed");
            String::new()
        }
        Err(_) => {
            warn!(stream = name, "reader task did not finish in time");
            task.abort();
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_preserves_newlines_and_partial_last_line() {
        let data: &[u8] = b"first\nsecond\nno trailing newline";
        let text = drain_lines(Some(data), "stdout").await;
        assert_eq!(text, "first\nsecond\nno trailing newline");
    }

    #[tokio::test]
    async fn drain_of_missing_stream_is_empty() {
        let text = drain_lines(None::<&[u8]>, "stderr").await;
        assert_eq!(text, "");
    }
}
