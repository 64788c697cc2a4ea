//! Operator consent before anything is downloaded or installed.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

/// A yes/no confirmation capability.
pub trait ConsentProvider {
    /// Ask the operator to confirm `prompt`.
    fn confirm(&self, prompt: &str) -> io::Result<bool>;
}

/// How consent is obtained, as selected by flags or configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentMode {
    #[default]
    Ask,
    Yes,
    No,
}

impl ConsentMode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "yes" | "y" | "true" => Ok(Self::Yes),
            "no" | "n" | "false" => Ok(Self::No),
            other => Err(format!(
                "unknown consent mode '{other}'; expected 'ask', 'yes' or 'no'"
            )),
        }
    }
}

/// Grants every request. Used on CI.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysYes;

impl ConsentProvider for AlwaysYes {
    fn confirm(&self, _prompt: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Denies every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysNo;

impl ConsentProvider for AlwaysNo {
    fn confirm(&self, _prompt: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Interactive prompt over a reader/writer pair.
///
/// The first character of the trimmed, lower-cased reply decides: `y` grants,
/// `n` denies, anything else asks again. End of input is an error.
pub struct PromptConsent<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> PromptConsent<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }
}

impl PromptConsent<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the controlling terminal.
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsentProvider for PromptConsent<R, W> {
    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let mut input = self.input.borrow_mut();
        let mut output = self.output.borrow_mut();

        loop {
            write!(output, "{} [Y/N]: ", prompt)?;
            output.flush()?;

            let mut reply = String::new();
            if input.read_line(&mut reply)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "no answer on standard input; rerun with --yes or --no",
                ));
            }

            match reply.trim().to_lowercase().chars().next() {
                Some('y') => return Ok(true),
                Some('n') => return Ok(false),
                _ => continue,
            }
        }
    }
}

/// Prompt text for one missing dependency.
pub fn download_prompt(name: &str, version: &str) -> String {
    format!(
        "{} not found. Would you like to download {} {}?",
        name, name, version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt_with(input: &str) -> (io::Result<bool>, String) {
        let mut out = Vec::new();
        let result = {
            let consent = PromptConsent::new(Cursor::new(input.as_bytes()), &mut out);
            consent.confirm("SDL2 not found. Would you like to download SDL2 2.26.5?")
        };
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_yes_grants() {
        let (result, out) = prompt_with("y\n");
        assert!(result.unwrap());
        assert!(out.ends_with("[Y/N]: "));
    }

    #[test]
    fn test_first_character_decides() {
        assert!(prompt_with("  Yes please\n").0.unwrap());
        assert!(!prompt_with("NO\n").0.unwrap());
    }

    #[test]
    fn test_unrecognised_reply_reprompts() {
        let (result, out) = prompt_with("maybe\n\nn\n");
        assert!(!result.unwrap());
        assert_eq!(out.matches("[Y/N]: ").count(), 3);
    }

    #[test]
    fn test_eof_is_error_not_default() {
        let (result, _) = prompt_with("sure\n");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_fixed_providers() {
        assert!(AlwaysYes.confirm("anything").unwrap());
        assert!(!AlwaysNo.confirm("anything").unwrap());
    }

    #[test]
    fn test_consent_mode_parse() {
        assert_eq!(ConsentMode::parse("ask").unwrap(), ConsentMode::Ask);
        assert_eq!(ConsentMode::parse(" YES ").unwrap(), ConsentMode::Yes);
        assert_eq!(ConsentMode::parse("no").unwrap(), ConsentMode::No);
        assert!(ConsentMode::parse("sometimes").is_err());
    }

    #[test]
    fn test_download_prompt_text() {
        assert_eq!(
            download_prompt("SDL2_ttf", "2.20.2"),
            "SDL2_ttf not found. Would you like to download SDL2_ttf 2.20.2?"
        );
    }
}
