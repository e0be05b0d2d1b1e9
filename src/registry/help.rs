//! # Help Rendering
//!
//! Help is served by two ordinary handlers the registry installs on its own:
//! [`KeywordHelp`] behind every `"<keyword> help"` command and [`GlobalHelp`]
//! behind the single `"help"` command. Both write through the context's
//! logger, so they compose with other handlers like any user handler.
//!
//! Within a group every description is padded to the longest description of
//! that group before the `// intro` suffix.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::command::Command;
use super::command_registry::RegistryState;
use super::handler::Handler;
use crate::context::ExecutionContext;

/// Banner preceding the global help output
pub const GLOBAL_HELP_BANNER: &str = "---- all commands help ----";

/// Header line of a per-keyword help listing
pub fn keyword_header(keyword: &str) -> String {
    format!("---- {keyword} help ----")
}

/// Header line of a group inside the global help listing
pub fn group_header(keyword: &str) -> String {
    format!("[{keyword}]")
}

/// One line per command, aligned on the longest description of the group
pub fn render_listing(commands: &[Arc<Command>]) -> Vec<String> {
    let width = commands
        .iter()
        .map(|command| command.description().chars().count())
        .max()
        .unwrap_or(0);

    commands
        .iter()
        .map(|command| match command.intro() {
            Some(intro) => format!("{:<width$} // {intro}", command.description()),
            None => command.description().to_string(),
        })
        .collect()
}

/// Per-keyword help listing, header included
pub(crate) fn render_keyword(keyword: &str, commands: &[Arc<Command>]) -> Vec<String> {
    let mut lines = vec![keyword_header(keyword)];
    lines.extend(render_listing(commands));
    lines
}

/// Global help listing: banner, then every group under its own header
pub(crate) fn render_groups(groups: &[(String, Vec<Arc<Command>>)]) -> Vec<String> {
    let mut lines = vec![GLOBAL_HELP_BANNER.to_string()];
    for (keyword, commands) in groups {
        lines.push(group_header(keyword));
        lines.extend(render_listing(commands));
    }
    lines
}

/// Handler behind `"<keyword> help"`
pub(crate) struct KeywordHelp {
    keyword: String,
    state: Weak<RwLock<RegistryState>>,
}

impl KeywordHelp {
    pub(crate) fn new(keyword: &str, state: Weak<RwLock<RegistryState>>) -> Self {
        Self {
            keyword: keyword.to_string(),
            state,
        }
    }
}

#[async_trait]
impl Handler for KeywordHelp {
    async fn handle(&self, ctx: &mut ExecutionContext, _args: &[String]) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        // Snapshot under the lock; the sink runs without it
        let commands = state.read().group(&self.keyword);
        for line in render_keyword(&self.keyword, &commands) {
            ctx.log(&line);
        }
    }

    fn name(&self) -> &str {
        "keyword_help"
    }
}

/// Handler behind the global `"help"` command
pub(crate) struct GlobalHelp {
    state: Weak<RwLock<RegistryState>>,
}

impl GlobalHelp {
    pub(crate) fn new(state: Weak<RwLock<RegistryState>>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Handler for GlobalHelp {
    async fn handle(&self, ctx: &mut ExecutionContext, _args: &[String]) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let groups = state.read().all_groups();
        for line in render_groups(&groups) {
            ctx.log(&line);
        }
    }

    fn name(&self) -> &str {
        "global_help"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler::handler;

    fn command(phrase: &str, names: &[&str]) -> Arc<Command> {
        Arc::new(Command::compile(phrase, names, vec![handler(|_, _| {})]).unwrap())
    }

    #[test]
    fn test_listing_aligns_on_longest_description() {
        let commands = vec![
            command("show", &["say hello world"]),
            command("show (.*)", &["user", "say hello to the given user name"]),
        ];

        let lines = render_listing(&commands);

        assert_eq!(
            lines,
            vec![
                "show        // say hello world",
                "show <user> // say hello to the given user name",
            ]
        );
    }

    #[test]
    fn test_listing_without_intro_is_bare() {
        let commands = vec![command("copy (.*) (.*)", &["src", "dst"])];
        assert_eq!(render_listing(&commands), vec!["copy <src> <dst>"]);
    }

    #[test]
    fn test_alignment_is_per_group() {
        let groups = vec![
            ("a".to_string(), vec![command("a", &["short"])]),
            (
                "b".to_string(),
                vec![
                    command("b", &["one"]),
                    command("b (.*) (.*)", &["x", "y", "two"]),
                ],
            ),
        ];

        let lines = render_groups(&groups);

        assert_eq!(
            lines,
            vec![
                GLOBAL_HELP_BANNER,
                "[a]",
                "a // short",
                "[b]",
                "b         // one",
                "b <x> <y> // two",
            ]
        );
    }
}
