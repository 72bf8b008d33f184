use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::diary::logger::StopSignal;

/// Line based question/answer over any buffered input. The cli uses stdin, tests use byte slices.
pub struct Prompt<I> {
    input: I,
}

impl<I: AsyncBufRead + Unpin> Prompt<I> {
    pub fn new(input: I) -> Self {
        Self { input }
    }

    /// Prints `question` and returns the answer without the line terminator. Closed input is
    /// reported as [io::ErrorKind::UnexpectedEof].
    pub async fn ask(&mut self, out: &mut impl Write, question: &str) -> io::Result<String> {
        write!(out, "{question}")?;
        out.flush()?;
        self.read_line()
            .await?
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "Input was closed"))
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Stops a live activity once the user presses Enter. Closing the input counts as a stop too.
/// When `interruptible` Ctrl-C also stops the activity instead of killing the process. The menu
/// doesn't use that, because after the first Ctrl-C handler is installed it stays for the whole
/// process.
pub struct StopOnEnter<'a, I, W> {
    prompt: &'a mut Prompt<I>,
    out: &'a mut W,
    activity: String,
    interruptible: bool,
}

impl<'a, I, W> StopOnEnter<'a, I, W> {
    pub fn new(
        prompt: &'a mut Prompt<I>,
        out: &'a mut W,
        activity: &str,
        interruptible: bool,
    ) -> Self {
        Self {
            prompt,
            out,
            activity: activity.trim().to_string(),
            interruptible,
        }
    }
}

#[async_trait(?Send)]
impl<'a, I: AsyncBufRead + Unpin, W: Write> StopSignal for StopOnEnter<'a, I, W> {
    async fn wait(&mut self) -> io::Result<()> {
        write!(self.out, "Press Enter to stop {}...", self.activity)?;
        self.out.flush()?;

        if !self.interruptible {
            return self.prompt.read_line().await.map(|_| ());
        }

        tokio::select! {
            line = self.prompt.read_line() => line.map(|_| ()),
            interrupted = tokio::signal::ctrl_c() => {
                writeln!(self.out)?;
                interrupted
            }
        }
    }
}
