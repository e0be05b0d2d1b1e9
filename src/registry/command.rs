//! Compiled command patterns

use std::fmt;

use regex::Regex;
use tracing::warn;

use super::handler::HandlerRef;
use crate::error::{RegistrationError, RegistrationResult};

/// The only placeholder token form that receives a name in descriptions
pub const WILDCARD_TOKEN: &str = "(.*)";

/// Tokens are separated by exactly one space; runs of spaces yield empty tokens
pub fn token_count(text: &str) -> usize {
    text.split(' ').count()
}

/// One registered phrase and its handler chain
pub struct Command {
    phrase: String,
    keyword: String,
    matcher: Regex,
    capture_group_count: usize,
    token_count: usize,
    description: String,
    intro: Option<String>,
    handlers: Vec<HandlerRef>,
}

impl Command {
    /// Compile `phrase` and synthesize its description from `names`
    pub fn compile<S: AsRef<str>>(
        phrase: &str,
        names: &[S],
        handlers: Vec<HandlerRef>,
    ) -> RegistrationResult<Self> {
        let pattern = Regex::new(phrase).map_err(|source| RegistrationError::Pattern {
            phrase: phrase.to_string(),
            source,
        })?;
        let capture_group_count = pattern.captures_len() - 1;

        if names.len() < capture_group_count {
            return Err(RegistrationError::Arity {
                phrase: phrase.to_string(),
                expected: capture_group_count,
                provided: names.len(),
            });
        }
        if handlers.is_empty() {
            return Err(RegistrationError::NoHandlers {
                phrase: phrase.to_string(),
            });
        }
        if names.len() > capture_group_count + 1 {
            warn!(
                phrase = %phrase,
                ignored = names.len() - capture_group_count - 1,
                "Ignoring names beyond the capture groups and introduction"
            );
        }

        // Anchored so that a match always spans the whole line
        let matcher = Regex::new(&format!("^(?:{phrase})$")).map_err(|source| {
            RegistrationError::Pattern {
                phrase: phrase.to_string(),
                source,
            }
        })?;

        let tokens: Vec<&str> = phrase.split(' ').collect();
        let mut placeholder_names = names.iter().map(<S as AsRef<str>>::as_ref);
        let description = tokens
            .iter()
            .map(|token| {
                if *token == WILDCARD_TOKEN {
                    if let Some(name) = placeholder_names.next() {
                        return format!("<{name}>");
                    }
                }
                (*token).to_string()
            })
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            phrase: phrase.to_string(),
            keyword: tokens[0].to_string(),
            matcher,
            capture_group_count,
            token_count: tokens.len(),
            description,
            intro: names
                .get(capture_group_count)
                .map(|intro| <S as AsRef<str>>::as_ref(intro).to_string())
                .filter(|intro| !intro.is_empty()),
            handlers,
        })
    }

    /// Build the `"<keyword> help"` command for a keyword
    ///
    /// The keyword is escaped in the pattern; keyword and description keep
    /// its literal text.
    pub(crate) fn keyword_help(
        keyword: &str,
        intro: &str,
        handler: HandlerRef,
    ) -> RegistrationResult<Self> {
        let mut command = Self::compile(
            &format!("{} help", regex::escape(keyword)),
            &[intro],
            vec![handler],
        )?;
        command.keyword = keyword.to_string();
        command.description = format!("{keyword} help");
        Ok(command)
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// First token of the phrase
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn capture_group_count(&self) -> usize {
        self.capture_group_count
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn intro(&self) -> Option<&str> {
        self.intro.as_deref()
    }

    pub fn handlers(&self) -> &[HandlerRef] {
        &self.handlers
    }

    /// Captured values when `line` has this command's token count and
    /// matches the whole pattern
    ///
    /// Optional groups that did not participate yield empty strings.
    pub fn match_line(&self, line: &str) -> Option<Vec<String>> {
        if token_count(line) != self.token_count {
            return None;
        }
        let captures = self.matcher.captures(line)?;
        let args: Vec<String> = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        (args.len() == self.capture_group_count).then_some(args)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("phrase", &self.phrase)
            .field("keyword", &self.keyword)
            .field("capture_group_count", &self.capture_group_count)
            .field("token_count", &self.token_count)
            .field("description", &self.description)
            .field("intro", &self.intro)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
