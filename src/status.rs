//! Live per-project status lines.
//!
//! A run owns exactly one status line per selected project, addressed by the
//! project's index in the sorted selection. The orchestrator only asks for
//! lines to change; how they reach the terminal is up to the
//! [`StatusRenderer`] implementation.

use std::{
    io::{self, Write},
    time::Duration,
};

use colored::Colorize;

/// Lifecycle state of one project's command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Selected but not yet launched
    Initializing,

    /// Running
    InProgress,

    /// Exited with status 0
    Done,

    /// Exited with a non-zero status
    Failed(i32),

    /// Killed after exceeding the run timeout
    TimedOut(Duration),
}

impl Status {
    /// The coloured tag for this state, e.g. `[done]`.
    #[must_use]
    pub fn tag(self) -> String {
        match self {
            Self::Initializing => "[initializing]".bright_black().to_string(),
            Self::InProgress => "[in progress]".blue().to_string(),
            Self::Done => "[done]".green().to_string(),
            Self::Failed(code) => format!("[failed({code})]").red().to_string(),
            Self::TimedOut(_) => "[timed out]".red().to_string(),
        }
    }

    /// The full status line for `label`.
    #[must_use]
    pub fn line(self, label: &str) -> String {
        format!("{} {label}", self.tag())
    }
}

/// A fixed-size block of independently settable lines.
pub trait StatusRenderer {
    /// Replace line `index` and repaint.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn set(&mut self, index: usize, line: String) -> io::Result<()>;

    /// Flush anything buffered to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be flushed.
    fn flush(&mut self) -> io::Result<()>;

    /// Leave the output in a clean state after the last update.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}

const CLEAR_LINE: &str = "\r\x1b[K";

/// Repaints the whole block in place with ANSI cursor movement.
///
/// The first paint prints every line. Every later paint moves the cursor back
/// up to the first line of the block and rewrites each line after clearing
/// it. The cursor always rests on the line below the block, so `finish` has
/// nothing to undo.
#[derive(Debug)]
pub struct BlockRenderer<W: Write> {
    out: W,
    lines: Vec<String>,
    painted: bool,
}

impl<W: Write> BlockRenderer<W> {
    /// Create a block of `size` empty lines writing to `out`.
    #[must_use]
    pub fn new(out: W, size: usize) -> Self {
        Self {
            out,
            lines: vec![String::new(); size],
            painted: false,
        }
    }

    /// Current content of every line.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consume the renderer and return the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn repaint(&mut self) -> io::Result<()> {
        if self.painted && !self.lines.is_empty() {
            write!(self.out, "\x1b[{}A", self.lines.len())?;
        }

        for line in &self.lines {
            writeln!(self.out, "{CLEAR_LINE}{line}")?;
        }

        self.painted = true;
        self.out.flush()
    }
}

impl<W: Write> StatusRenderer for BlockRenderer<W> {
    fn set(&mut self, index: usize, line: String) -> io::Result<()> {
        let Some(slot) = self.lines.get_mut(index) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("status line {index} out of range"),
            ));
        };

        *slot = line;
        self.repaint()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    fn rendered(renderer: BlockRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_status_lines() {
        plain();

        assert_eq!(Status::Initializing.line("//a"), "[initializing] //a");
        assert_eq!(Status::InProgress.line("//a"), "[in progress] //a");
        assert_eq!(Status::Done.line("//a"), "[done] //a");
        assert_eq!(Status::Failed(2).line("//a"), "[failed(2)] //a");
        assert_eq!(
            Status::TimedOut(Duration::from_secs(5)).line("//a"),
            "[timed out] //a"
        );
    }

    #[test]
    fn test_first_paint_prints_every_line_once() {
        let mut renderer = BlockRenderer::new(Vec::new(), 2);
        renderer.set(0, "one".to_string()).unwrap();

        assert_eq!(rendered(renderer), "\r\x1b[Kone\n\r\x1b[K\n");
    }

    #[test]
    fn test_later_paints_move_up_and_reprint_the_block() {
        let mut renderer = BlockRenderer::new(Vec::new(), 2);
        renderer.set(0, "one".to_string()).unwrap();
        renderer.set(1, "two".to_string()).unwrap();

        assert_eq!(
            rendered(renderer),
            "\r\x1b[Kone\n\r\x1b[K\n\x1b[2A\r\x1b[Kone\n\r\x1b[Ktwo\n"
        );
    }

    #[test]
    fn test_line_count_is_fixed() {
        let mut renderer = BlockRenderer::new(Vec::new(), 3);
        for i in 0..3 {
            renderer.set(i, format!("line {i}")).unwrap();
        }
        renderer.set(1, "again".to_string()).unwrap();

        assert_eq!(renderer.lines().len(), 3);
        assert_eq!(renderer.lines(), ["line 0", "again", "line 2"]);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut renderer = BlockRenderer::new(Vec::new(), 1);
        let err = renderer.set(1, "nope".to_string()).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(renderer.lines(), [""]);
    }

    #[test]
    fn test_finish_leaves_no_trailing_escape() {
        let mut renderer = BlockRenderer::new(Vec::new(), 1);
        renderer.set(0, "done".to_string()).unwrap();
        renderer.finish().unwrap();

        let out = rendered(renderer);
        assert!(out.ends_with("done\n"));
    }

    #[test]
    fn test_empty_block() {
        let mut renderer = BlockRenderer::new(Vec::new(), 0);
        renderer.finish().unwrap();

        assert!(renderer.lines().is_empty());
        assert_eq!(rendered(renderer), "");
    }
}
