use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{self, Effects, SharedEffects};
use crate::CommandGroup;

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    /// Creates a command context from the current process environment.
    #[must_use]
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Self {
        Self::from_snapshot(global, &EnvSnapshot::capture(), effects)
    }

    pub(crate) fn from_snapshot(
        global: &'a GlobalOptions,
        env: &EnvSnapshot,
        effects: SharedEffects,
    ) -> Self {
        Self {
            global,
            config: Config::from_snapshot(env),
            effects,
        }
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn fs(&self) -> &dyn effects::FileSystem {
        self.effects.fs()
    }

    pub fn tools(&self) -> &dyn effects::ToolRunner {
        self.effects.tools()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tool output is captured rather than streamed when stdout must stay clean.
    pub fn capture_tool_output(&self) -> bool {
        self.global.quiet || self.global.json
    }
}
