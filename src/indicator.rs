//! Console rendering of the recording indicator.
//!
//! One line is printed per visible state change. A folder error wins over
//! recording, which wins over idle.

use std::io::{self, Stdout, Write};

/// What the indicator is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    Idle,
    Recording,
    FolderMissing,
}

impl IndicatorState {
    pub fn label(self) -> &'static str {
        match self {
            IndicatorState::Idle => "○ idle",
            IndicatorState::Recording => "● REC",
            IndicatorState::FolderMissing => "! folder missing",
        }
    }
}

/// Tracks recording and folder-error inputs and prints the combined state.
pub struct ConsoleIndicator<W: Write = Stdout> {
    out: W,
    recording: bool,
    folder_error: bool,
    shown: Option<IndicatorState>,
}

impl ConsoleIndicator<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleIndicator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            recording: false,
            folder_error: false,
            shown: None,
        }
    }

    /// Combined state from the current inputs.
    pub fn state(&self) -> IndicatorState {
        if self.folder_error {
            IndicatorState::FolderMissing
        } else if self.recording {
            IndicatorState::Recording
        } else {
            IndicatorState::Idle
        }
    }

    /// Last state written out, if any.
    pub fn shown(&self) -> Option<IndicatorState> {
        self.shown
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Returns true if a new line was printed.
    pub fn set_recording(&mut self, recording: bool) -> io::Result<bool> {
        self.recording = recording;
        self.render()
    }

    /// Returns true if a new line was printed.
    pub fn set_folder_error(&mut self, folder_error: bool) -> io::Result<bool> {
        self.folder_error = folder_error;
        self.render()
    }

    /// Print the current state if it differs from the last one printed.
    pub fn render(&mut self) -> io::Result<bool> {
        let state = self.state();
        if self.shown == Some(state) {
            return Ok(false);
        }
        writeln!(self.out, "{}", state.label())?;
        self.out.flush()?;
        self.shown = Some(state);
        Ok(true)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
