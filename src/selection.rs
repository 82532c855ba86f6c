use std::io::{BufRead, Write};

use anyhow::Result;
use inquire::{InquireError, Text};

use crate::{fingerprint::Fingerprint, ranking::Candidate};

pub const PAGE_SIZE: usize = 5;

const QUESTION: &str =
    "enter the number you will visit, or just press return to list more,\nor \"q\" to quit:";
const HINT: &str = "invalid input, enter an integer or just press enter";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Chosen(Fingerprint),
    NoneChosen,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    More,
    Quit,
    // zero based
    Pick(usize),
    Invalid,
}

impl Reply {
    pub fn parse(input: &str, total: usize) -> Self {
        match input.trim() {
            "" => Self::More,
            "q" => Self::Quit,
            x => match x.parse::<usize>() {
                Ok(n) if n >= 1 && n <= total => Self::Pick(n - 1),
                _ => Self::Invalid,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Page,
    // ask again without redrawing
    Retry,
    Done(Outcome),
}

pub struct Pager<'a> {
    candidates: &'a [Candidate],
    offset: usize,
}

impl<'a> Pager<'a> {
    pub fn new(candidates: &'a [Candidate]) -> Self {
        Self {
            candidates,
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page(&self) -> &'a [Candidate] {
        let end = (self.offset + PAGE_SIZE).min(self.candidates.len());
        &self.candidates[self.offset.min(end)..end]
    }

    pub fn advance(&mut self, reply: Reply) -> Step {
        match reply {
            Reply::More => {
                if self.offset + PAGE_SIZE < self.candidates.len() {
                    self.offset += PAGE_SIZE;
                    Step::Page
                } else {
                    Step::Done(Outcome::NoneChosen)
                }
            }
            Reply::Quit => Step::Done(Outcome::Cancelled),
            Reply::Pick(i) => match self.candidates.get(i) {
                Some(x) => Step::Done(Outcome::Chosen(x.fingerprint.clone())),
                None => Step::Retry,
            },
            Reply::Invalid => Step::Retry,
        }
    }
}

// None when input ended or the user interrupted
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>>;
}

pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        match Text::new(question).prompt() {
            Ok(x) => Ok(Some(x)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// piped input
pub struct LinePrompt<R, W> {
    input: R,
    echo: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, echo: W) -> Self {
        Self { input, echo }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.echo, "{question} ")?;
        self.echo.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

pub fn show_page(out: &mut impl Write, pager: &Pager) -> Result<()> {
    writeln!(out)?;
    for (i, x) in pager.page().iter().enumerate() {
        let n = pager.offset() + i + 1;
        write!(out, "{n}) {}  {}  {:.1} mi.", x.name, x.address, x.distance)?;
        match x.visits {
            0 => writeln!(out)?,
            1 => writeln!(out, "  (visited once)")?,
            v => writeln!(out, "  (visited {v} times)")?,
        }
        if !x.location.is_empty() {
            writeln!(out, "{}", x.location)?;
        }
        writeln!(out, "{}", x.food)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn choose(
    candidates: &[Candidate],
    prompt: &mut impl Prompt,
    out: &mut impl Write,
) -> Result<Outcome> {
    if candidates.is_empty() {
        return Ok(Outcome::NoneChosen);
    }

    let mut pager = Pager::new(candidates);
    show_page(out, &pager)?;
    loop {
        let Some(input) = prompt.ask(QUESTION)? else {
            return Ok(Outcome::Cancelled);
        };
        match pager.advance(Reply::parse(&input, candidates.len())) {
            Step::Page => show_page(out, &pager)?,
            Step::Retry => writeln!(out, "{HINT}")?,
            Step::Done(outcome) => return Ok(outcome),
        }
    }
}
