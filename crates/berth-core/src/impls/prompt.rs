//! Prompt 実装
//!
//! - **TerminalPrompt**: 端末から 1 行読む
//! - **ScriptedPrompt**: テスト用。用意した回答を順に返す

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use dialoguer::console::Term;

use crate::ports::Prompt;

/// Reads from the controlling terminal.
///
/// The prompt goes to stderr so it stays visible while stdout is piped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn read_line(&self, prompt: &str) -> io::Result<String> {
        let term = Term::stderr();
        term.write_str(prompt)?;
        term.read_line()
    }
}

/// Answers from a fixed script; running out of answers is an EOF error.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: AtomicUsize::new(0),
        }
    }

    /// How many times a line was requested.
    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&self, _prompt: &str) -> io::Result<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
    }
}
