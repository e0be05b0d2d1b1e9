//! # Command Registry
//!
//! Owns every registered [`Command`] in registration order (the dispatch
//! order) and groups them by keyword for help rendering.
//!
//! ## Help side effects
//!
//! - The first command registered under a keyword other than `help` also
//!   registers `"<keyword> help"`.
//! - The very first registration of any command also registers the global
//!   `"help"` command, exactly once per registry.
//!
//! Both guards are claimed under the write lock before the recursive
//! registration runs, so concurrent callers and the recursion itself can
//! never install a help command twice. Help commands land in the dispatch
//! order ahead of the user command that triggered them, which keeps
//! `"<keyword> help"` reachable when the user registers `"<keyword> (.*)"`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::command::Command;
use super::handler::HandlerRef;
use super::help::{self, GlobalHelp, KeywordHelp};
use crate::error::RegistrationResult;

/// Keyword of the global help command
pub const HELP_KEYWORD: &str = "help";

const KEYWORD_HELP_INTRO: &str = "To get this help";
const GLOBAL_HELP_INTRO: &str = "To get all commands help";

#[derive(Default)]
pub(crate) struct RegistryState {
    /// Dispatch order
    commands: Vec<Arc<Command>>,
    /// Help rendering only
    groups: BTreeMap<String, Vec<Arc<Command>>>,
    help_keywords: HashSet<String>,
    global_help_registered: bool,
}

impl RegistryState {
    pub(crate) fn group(&self, keyword: &str) -> Vec<Arc<Command>> {
        self.groups.get(keyword).cloned().unwrap_or_default()
    }

    pub(crate) fn all_groups(&self) -> Vec<(String, Vec<Arc<Command>>)> {
        self.groups
            .iter()
            .map(|(keyword, commands)| (keyword.clone(), commands.clone()))
            .collect()
    }
}

/// Registry of command patterns
///
/// Cloning yields another handle to the same registry.
///
/// # Examples
///
/// ```rust
/// use regcmd::{handler, CommandRegistry};
///
/// let registry = CommandRegistry::new();
/// registry
///     .register(
///         "greet (.*)",
///         &["name", "greets a person"],
///         vec![handler(|ctx, args| ctx.log(&format!("hello {}", args[0])))],
///     )
///     .unwrap();
///
/// assert!(registry.has_keyword("greet"));
/// assert_eq!(registry.group("greet").len(), 2); // greet (.*) and greet help
/// ```
#[derive(Clone, Default)]
pub struct CommandRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a phrase bound to a handler chain
    ///
    /// `names` needs one entry per capture group of `phrase`; one extra
    /// entry becomes the command's introduction in help output.
    pub fn register<S: AsRef<str>>(
        &self,
        phrase: &str,
        names: &[S],
        handlers: Vec<HandlerRef>,
    ) -> RegistrationResult<Arc<Command>> {
        let command = Arc::new(Command::compile(phrase, names, handlers)?);
        self.insert(command.clone())?;

        info!(
            phrase = %phrase,
            keyword = %command.keyword(),
            token_count = command.token_count(),
            handlers = command.handlers().len(),
            "Registered command"
        );
        Ok(command)
    }

    /// Register and panic on failure, for call sites where a bad phrase is a
    /// programming error
    pub fn must_register<S: AsRef<str>>(
        &self,
        phrase: &str,
        names: &[S],
        handlers: Vec<HandlerRef>,
    ) -> Arc<Command> {
        match self.register(phrase, names, handlers) {
            Ok(command) => command,
            Err(e) => panic!("failed to register command {phrase:?}: {e}"),
        }
    }

    fn insert(&self, command: Arc<Command>) -> RegistrationResult<()> {
        let keyword = command.keyword().to_string();

        // Built before locking so a failure leaves no partial state
        let keyword_help = self.prepare_keyword_help(&keyword)?;
        let global_help = self.prepare_global_help()?;

        let (keyword_help, global_help) = {
            let mut state = self.state.write();
            state
                .groups
                .entry(keyword.clone())
                .or_default()
                .push(command.clone());

            let keyword_help = keyword_help.filter(|_| state.help_keywords.insert(keyword.clone()));
            let claim_global = !std::mem::replace(&mut state.global_help_registered, true);
            // A caller-supplied bare "help" takes the place of the built-in one
            let global_help =
                global_help.filter(|_| claim_global && command.phrase() != HELP_KEYWORD);
            (keyword_help, global_help)
        };

        if let Some(help) = keyword_help {
            debug!(keyword = %keyword, "Registering keyword help");
            self.insert(help)?;
        }
        if let Some(help) = global_help {
            debug!("Registering global help");
            self.insert(help)?;
        }

        self.state.write().commands.push(command);
        Ok(())
    }

    fn prepare_keyword_help(&self, keyword: &str) -> RegistrationResult<Option<Arc<Command>>> {
        if keyword == HELP_KEYWORD || self.state.read().help_keywords.contains(keyword) {
            return Ok(None);
        }
        let handler = Arc::new(KeywordHelp::new(keyword, Arc::downgrade(&self.state)));
        Command::keyword_help(keyword, KEYWORD_HELP_INTRO, handler).map(|c| Some(Arc::new(c)))
    }

    fn prepare_global_help(&self) -> RegistrationResult<Option<Arc<Command>>> {
        if self.state.read().global_help_registered {
            return Ok(None);
        }
        let handler: HandlerRef = Arc::new(GlobalHelp::new(Arc::downgrade(&self.state)));
        Command::compile(HELP_KEYWORD, &[GLOBAL_HELP_INTRO], vec![handler])
            .map(|c| Some(Arc::new(c)))
    }

    /// First command, in registration order, whose token count and pattern
    /// both match `line`, with its captured values
    pub fn find(&self, line: &str) -> Option<(Arc<Command>, Vec<String>)> {
        let state = self.state.read();
        state
            .commands
            .iter()
            .find_map(|command| command.match_line(line).map(|args| (command.clone(), args)))
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.state.read().groups.contains_key(keyword)
    }

    /// All commands in dispatch order
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.state.read().commands.clone()
    }

    /// Commands sharing `keyword`, in insertion order
    pub fn group(&self, keyword: &str) -> Vec<Arc<Command>> {
        self.state.read().group(keyword)
    }

    /// Keywords in help order
    pub fn keywords(&self) -> Vec<String> {
        self.state.read().groups.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().commands.is_empty()
    }

    /// Lines the `"<keyword> help"` command prints
    pub fn render_group(&self, keyword: &str) -> Option<Vec<String>> {
        let commands = self.state.read().groups.get(keyword).cloned()?;
        Some(help::render_keyword(keyword, &commands))
    }

    /// Lines the global `"help"` command prints
    pub fn render_all(&self) -> Vec<String> {
        let groups = self.state.read().all_groups();
        help::render_groups(&groups)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CommandRegistry")
            .field("commands", &state.commands.len())
            .field("keywords", &state.groups.len())
            .field("global_help_registered", &state.global_help_registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistrationError;
    use crate::registry::handler::handler;

    fn noop() -> Vec<HandlerRef> {
        vec![handler(|_, _| {})]
    }

    fn phrases(registry: &CommandRegistry) -> Vec<String> {
        registry
            .commands()
            .iter()
            .map(|c| c.phrase().to_string())
            .collect()
    }

    #[test]
    fn test_first_registration_installs_help_commands() {
        let registry = CommandRegistry::new();
        registry.register("show", &["say hello world"], noop()).unwrap();

        assert_eq!(phrases(&registry), vec!["show help", "help", "show"]);
        assert_eq!(registry.keywords(), vec!["help", "show"]);
    }

    #[test]
    fn test_keyword_help_registered_once() {
        let registry = CommandRegistry::new();
        registry.register("show", &["say hello world"], noop()).unwrap();
        registry
            .register("show (.*)", &["user", "say hello to the given user name"], noop())
            .unwrap();

        let help_count = registry
            .commands()
            .iter()
            .filter(|c| c.description() == "show help")
            .count();
        assert_eq!(help_count, 1);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_group_keeps_insertion_order() {
        let registry = CommandRegistry::new();
        registry.register("show", &["say hello world"], noop()).unwrap();
        registry.register("show (.*)", &["user"], noop()).unwrap();

        let group: Vec<String> = registry
            .group("show")
            .iter()
            .map(|c| c.description().to_string())
            .collect();
        assert_eq!(group, vec!["show", "show help", "show <user>"]);
    }

    #[test]
    fn test_help_keyword_gets_no_keyword_help() {
        let registry = CommandRegistry::new();
        registry.register("help (.*)", &["topic"], noop()).unwrap();

        assert!(registry.find("help help").is_some());
        assert!(!phrases(&registry).iter().any(|p| p == "help help"));
        // Global help still exists
        assert!(registry.find("help").is_some());
    }

    #[test]
    fn test_user_supplied_global_help_replaces_builtin() {
        let registry = CommandRegistry::new();
        registry.register("help", &["custom help"], noop()).unwrap();
        registry.register("show", &["say hello"], noop()).unwrap();

        let help_commands: Vec<_> = registry
            .commands()
            .into_iter()
            .filter(|c| c.phrase() == HELP_KEYWORD)
            .collect();
        assert_eq!(help_commands.len(), 1);
        assert_eq!(help_commands[0].intro(), Some("custom help"));
    }

    #[test]
    fn test_failed_registration_leaves_registry_untouched() {
        let registry = CommandRegistry::new();

        let err = registry.register("greet (.*)", &[] as &[&str], noop()).unwrap_err();
        assert!(matches!(err, RegistrationError::Arity { .. }));

        let err = registry.register("greet (", &["x"], noop()).unwrap_err();
        assert!(matches!(err, RegistrationError::Pattern { .. }));

        assert!(registry.is_empty());
        assert!(registry.keywords().is_empty());
    }

    #[test]
    #[should_panic(expected = "failed to register command")]
    fn test_must_register_panics() {
        let registry = CommandRegistry::new();
        registry.must_register("bad (", &["x"], noop());
    }

    #[test]
    fn test_find_prefers_first_registered() {
        let registry = CommandRegistry::new();
        let first = registry.register("say (.*)", &["word"], noop()).unwrap();
        registry.register("say (hello)", &["greeting"], noop()).unwrap();

        let (matched, args) = registry.find("say hello").unwrap();
        assert!(Arc::ptr_eq(&matched, &first));
        assert_eq!(args, vec!["hello"]);
    }

    #[test]
    fn test_keyword_help_wins_over_user_wildcard() {
        let registry = CommandRegistry::new();
        registry.register("greet (.*)", &["name"], noop()).unwrap();

        let (matched, args) = registry.find("greet help").unwrap();
        assert_eq!(matched.description(), "greet help");
        assert!(args.is_empty());
    }

    #[test]
    fn test_render_group() {
        let registry = CommandRegistry::new();
        registry
            .register("greet (.*)", &["name", "greets a person"], noop())
            .unwrap();

        let lines = registry.render_group("greet").unwrap();
        assert_eq!(
            lines,
            vec![
                "---- greet help ----",
                "greet <name> // greets a person",
                "greet help   // To get this help",
            ]
        );
        assert!(registry.render_group("missing").is_none());
    }

    #[test]
    fn test_render_all_lists_every_group() {
        let registry = CommandRegistry::new();
        registry.register("show", &["say hello world"], noop()).unwrap();
        registry.register("sleep", &[] as &[&str], noop()).unwrap();

        let lines = registry.render_all();
        assert_eq!(
            lines,
            vec![
                help::GLOBAL_HELP_BANNER,
                "[help]",
                "help // To get all commands help",
                "[show]",
                "show      // say hello world",
                "show help // To get this help",
                "[sleep]",
                "sleep",
                "sleep help // To get this help",
            ]
        );
    }

    #[test]
    fn test_concurrent_registration_installs_single_global_help() {
        let registry = CommandRegistry::new();

        std::thread::scope(|scope| {
            for i in 0..16 {
                let registry = registry.clone();
                scope.spawn(move || {
                    registry
                        .register(&format!("cmd{i} (.*)"), &["arg"], noop())
                        .unwrap();
                });
            }
        });

        let globals = registry
            .commands()
            .iter()
            .filter(|c| c.phrase() == HELP_KEYWORD)
            .count();
        assert_eq!(globals, 1);
        // 16 user commands, 16 keyword helps, 1 global help
        assert_eq!(registry.len(), 33);
    }
}
