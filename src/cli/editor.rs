//! Interactive entry of a new record.
//!
//! The user fills in each field, then confirms. Answering "no" starts
//! the whole record over with the same defaults.

use crate::errors::{CredVaultError, Result};
use crate::vault::Record;

/// Line-oriented input, so the editor can be driven by a script in tests.
pub trait Prompter {
    /// Read one line, pre-filled with `initial`.
    fn input(&mut self, prompt: &str, initial: &str) -> Result<String>;

    /// Read one line without echoing it.
    fn secret(&mut self, prompt: &str) -> Result<String>;
}

/// Terminal prompts via `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn input(&mut self, prompt: &str, initial: &str) -> Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| CredVaultError::CommandFailed(format!("{prompt} prompt: {e}")))
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("{prompt} prompt: {e}")))
    }
}

/// Interpret a confirmation answer. `None` means "ask again".
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "ye" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Collects a `Record` field by field.
pub struct InteractiveEditor<P> {
    prompter: P,
    default_group: String,
}

impl<P: Prompter> InteractiveEditor<P> {
    pub fn new(prompter: P, default_group: &str) -> Self {
        Self {
            prompter,
            default_group: default_group.to_string(),
        }
    }

    /// Prompt until the user confirms a record.
    ///
    /// `defaults` pre-fills name, user name, group and info. A blank
    /// group becomes the default group.
    pub fn collect_record(&mut self, defaults: &Record) -> Result<Record> {
        loop {
            let record = self.collect_fields(defaults)?;
            match self.confirm() {
                Ok(()) => return Ok(record),
                Err(CredVaultError::UserAbort) => {
                    tracing::debug!("record discarded, starting over");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn collect_fields(&mut self, defaults: &Record) -> Result<Record> {
        let name = loop {
            let name = self.prompter.input("Name", &defaults.name)?;
            if !name.trim().is_empty() {
                break name;
            }
        };

        let username = self.prompter.input("User name", &defaults.username)?;
        let password = self.prompter.secret("Password")?;

        let initial_group = if defaults.group.is_empty() {
            &self.default_group
        } else {
            &defaults.group
        };
        let group = self.prompter.input("Group", initial_group)?;
        let group = if group.trim().is_empty() {
            self.default_group.clone()
        } else {
            group
        };

        let info = self.prompter.input("Info", &defaults.info)?;

        Ok(Record {
            name,
            username,
            password,
            group,
            info,
        })
    }

    /// `Ok(())` on yes, `UserAbort` on no; anything else asks again.
    fn confirm(&mut self) -> Result<()> {
        loop {
            let answer = self.prompter.input("OK? [y/n]", "")?;
            match parse_yes_no(&answer) {
                Some(true) => return Ok(()),
                Some(false) => return Err(CredVaultError::UserAbort),
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Answers prompts from a fixed script and records what was asked.
    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<&'static str>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
            }
        }

        fn next(&mut self, prompt: &str) -> Result<String> {
            self.asked.push(prompt.to_string());
            self.answers
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| CredVaultError::CommandFailed("script exhausted".into()))
        }
    }

    impl Prompter for Scripted {
        fn input(&mut self, prompt: &str, _initial: &str) -> Result<String> {
            self.next(prompt)
        }

        fn secret(&mut self, prompt: &str) -> Result<String> {
            self.next(prompt)
        }
    }

    fn editor(answers: &[&'static str]) -> InteractiveEditor<Scripted> {
        InteractiveEditor::new(Scripted::new(answers), "Default")
    }

    #[test]
    fn confirmation_tokens() {
        for yes in ["y", "Y", "ye", "YES", " yes "] {
            assert_eq!(parse_yes_no(yes), Some(true), "{yes:?}");
        }
        for no in ["n", "No", "NO\n"] {
            assert_eq!(parse_yes_no(no), Some(false), "{no:?}");
        }
        for other in ["", "yess", "nope", "ok"] {
            assert_eq!(parse_yes_no(other), None, "{other:?}");
        }
    }

    #[test]
    fn confirmed_record_is_returned() {
        let mut ed = editor(&["github", "alice", "s3cret", "Dev", "work", "y"]);
        let record = ed.collect_record(&Record::default()).unwrap();
        assert_eq!(record, Record::new("github", "alice", "s3cret", "Dev", "work"));
    }

    #[test]
    fn blank_group_becomes_default() {
        let mut ed = editor(&["wifi", "", "hunter2", "  ", "", "yes"]);
        let record = ed.collect_record(&Record::default()).unwrap();
        assert_eq!(record.group, "Default");
        assert_eq!(record.username, "");
    }

    #[test]
    fn blank_name_is_asked_again() {
        let mut ed = editor(&["", " ", "mail", "bob", "pw", "Home", "", "y"]);
        let record = ed.collect_record(&Record::default()).unwrap();
        assert_eq!(record.name, "mail");
        assert_eq!(&ed.prompter.asked[..3], ["Name", "Name", "Name"]);
    }

    #[test]
    fn no_starts_the_record_over() {
        let mut ed = editor(&[
            "githb", "alice", "pw", "Dev", "", "n",
            "github", "alice", "pw", "Dev", "", "y",
        ]);
        let record = ed.collect_record(&Record::default()).unwrap();
        assert_eq!(record.name, "github");
        assert_eq!(ed.prompter.asked.iter().filter(|p| *p == "Name").count(), 2);
    }

    #[test]
    fn unrecognized_answer_repeats_only_the_question() {
        let mut ed = editor(&["github", "alice", "pw", "Dev", "", "maybe", "", "Y"]);
        let record = ed.collect_record(&Record::default()).unwrap();
        assert_eq!(record.name, "github");
        assert_eq!(ed.prompter.asked.iter().filter(|p| *p == "Name").count(), 1);
    }

    #[test]
    fn prompt_failure_propagates() {
        let mut ed = editor(&["github"]);
        assert!(matches!(
            ed.collect_record(&Record::default()),
            Err(CredVaultError::CommandFailed(_))
        ));
    }
}
