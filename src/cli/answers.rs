//! Line-based answer input for the interactive commands.
//!
//! Answers are typed as 1-based option numbers or letters (`a`..`d`).
//! A blank line skips the question and `q` stops early.

use std::io::{BufRead, Write};

/// One parsed line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// Zero-based option index.
    Pick(usize),
    Skip,
    Quit,
    Invalid,
}

/// Parse one answer line for a question with `options` choices.
pub fn parse_answer(line: &str, options: usize) -> Answer {
    let line = line.trim().to_lowercase();
    if line.is_empty() {
        return Answer::Skip;
    }
    if line == "q" || line == "quit" {
        return Answer::Quit;
    }

    let index = match line.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n - 1),
        Ok(_) => None,
        Err(_) => {
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(c @ 'a'..='z'), None) => Some(c as usize - 'a' as usize),
                _ => None,
            }
        }
    };

    match index {
        Some(i) if i < options => Answer::Pick(i),
        _ => Answer::Invalid,
    }
}

/// Reads answers from `input` and writes prompts to `prompt`.
pub struct AnswerReader<R, W> {
    input: R,
    prompt: W,
}

impl<R: BufRead, W: Write> AnswerReader<R, W> {
    pub fn new(input: R, prompt: W) -> Self {
        Self { input, prompt }
    }

    /// Print `text` to the prompt stream. Prompt failures are ignored.
    pub fn say(&mut self, text: &str) {
        let _ = write!(self.prompt, "{}", text);
        let _ = self.prompt.flush();
    }

    /// Read the next answer, re-asking on invalid input.
    ///
    /// End of input counts as `Quit`.
    pub fn next_answer(&mut self, options: usize) -> Answer {
        loop {
            let Some(line) = self.next_line() else {
                return Answer::Quit;
            };
            match parse_answer(&line, options) {
                Answer::Invalid => {
                    self.say(&format!("Enter 1-{}, blank to skip, q to stop: ", options));
                }
                answer => return answer,
            }
        }
    }

    /// Ask a yes/no question. Anything but `y`/`yes` is no.
    pub fn confirm(&mut self, question: &str) -> bool {
        self.say(&format!("{} [y/N] ", question));
        let reply = self.next_line().unwrap_or_default().trim().to_lowercase();
        reply == "y" || reply == "yes"
    }

    fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{sink, Cursor};

    #[test]
    fn test_parse_numbers_and_letters() {
        assert_eq!(parse_answer("1", 4), Answer::Pick(0));
        assert_eq!(parse_answer(" 4\n", 4), Answer::Pick(3));
        assert_eq!(parse_answer("B", 4), Answer::Pick(1));
        assert_eq!(parse_answer("d", 4), Answer::Pick(3));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert_eq!(parse_answer("0", 4), Answer::Invalid);
        assert_eq!(parse_answer("5", 4), Answer::Invalid);
        assert_eq!(parse_answer("e", 4), Answer::Invalid);
        assert_eq!(parse_answer("maybe", 4), Answer::Invalid);
    }

    #[test]
    fn test_parse_skip_and_quit() {
        assert_eq!(parse_answer("\n", 4), Answer::Skip);
        assert_eq!(parse_answer("q", 4), Answer::Quit);
        assert_eq!(parse_answer("QUIT", 4), Answer::Quit);
    }

    #[test]
    fn test_reader_retries_invalid_lines() {
        let mut reader = AnswerReader::new(Cursor::new("x\n9\n2\n"), sink());
        assert_eq!(reader.next_answer(4), Answer::Pick(1));
        assert_eq!(reader.next_answer(4), Answer::Quit);
    }

    #[test]
    fn test_confirm() {
        let mut reader = AnswerReader::new(Cursor::new("yes\nn\n"), Vec::new());
        assert!(reader.confirm("Again?"));
        assert!(!reader.confirm("Again?"));
        assert!(!reader.confirm("Again?"));
    }
}
