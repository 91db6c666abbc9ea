//! Host-side glue: running a scenario's scripts for one hook
//!
//! The build/upload pipeline hands the host four blobs of modifier sources,
//! keyed the way the platform stores them. [`TurnRunner`] loads the shared
//! library ahead of the requested hook, the way the host does on every
//! hook invocation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::config::DirectorConfig;
use super::context::{TurnContext, TurnOutcome};
use super::director::Director;
use crate::core::{DirectorError, DirectorResult};
use crate::hooks::HookType;
use crate::modifier::{ScriptCompiler, SourceCompiler};

/// The four script blobs of a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioScripts {
    pub shared_library: Vec<String>,
    pub on_input: Vec<String>,
    pub on_model_context: Vec<String>,
    pub on_output: Vec<String>,
}

impl ScenarioScripts {
    /// Parse the platform's `gameCode` JSON
    pub fn from_json(raw: &str) -> DirectorResult<Self> {
        serde_json::from_str(raw).map_err(|source| DirectorError::Json {
            origin: "ScenarioScripts::from_json".to_string(),
            source,
        })
    }

    /// Modifier sources for a hook type
    pub fn sources(&self, hook: HookType) -> &[String] {
        match hook {
            HookType::Library => &self.shared_library,
            HookType::Input => &self.on_input,
            HookType::Context => &self.on_model_context,
            HookType::Output => &self.on_output,
        }
    }
}

/// What running one hook produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub hook: HookType,
    pub outcome: TurnOutcome,
    pub active_modifiers: Vec<String>,
}

/// Runs a scenario's scripts against turn contexts
pub struct TurnRunner {
    scripts: ScenarioScripts,
    compiler: Arc<dyn ScriptCompiler>,
    config: DirectorConfig,
}

impl TurnRunner {
    /// Create a runner. Sources may refer to modifiers declared in `compiler`.
    pub fn new(scripts: ScenarioScripts, compiler: SourceCompiler) -> Self {
        Self {
            scripts,
            compiler: Arc::new(compiler),
            config: DirectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DirectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scripts(&self) -> &ScenarioScripts {
        &self.scripts
    }

    /// Run the shared library, then `hook`, against `ctx`
    pub fn run(&self, hook: HookType, ctx: &mut TurnContext) -> DirectorResult<TurnReport> {
        tracing::info!("Running {} for turn {}", hook, ctx.turn_id());

        let mut director = Director::with_config(ctx, self.config.clone())
            .with_shared_compiler(Arc::clone(&self.compiler));

        director.library(ctx, self.scripts.sources(HookType::Library).iter().cloned())?;
        if hook != HookType::Library {
            director.enter(ctx, hook, self.scripts.sources(hook).iter().cloned())?;
        }

        Ok(TurnReport {
            hook,
            outcome: director.finish(ctx),
            active_modifiers: director.active_modifiers().map(str::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{Modifier, ModifierValue};

    fn compiler() -> SourceCompiler {
        SourceCompiler::new()
            .with_declaration(Modifier::new("autoCards", |call| {
                if call.text.is_none() {
                    call.state["cards"] = serde_json::json!(["Dragon"]);
                }
                Ok(ModifierValue::Undefined)
            }))
            .with_declaration(Modifier::new("shout", |call| {
                Ok(call.text.clone().map(|t| t.to_uppercase()).into())
            }))
    }

    #[test]
    fn test_scripts_from_game_code() {
        let scripts = ScenarioScripts::from_json(
            r#"{ "sharedLibrary": ["autoCards"], "onOutput": ["shout", "return autoCards"] }"#,
        )
        .unwrap();
        assert_eq!(scripts.sources(HookType::Output).len(), 2);
        assert!(scripts.sources(HookType::Input).is_empty());
    }

    #[test]
    fn test_run_output_hook() {
        let scripts = ScenarioScripts {
            shared_library: vec!["autoCards".to_string()],
            on_output: vec!["shout".to_string()],
            ..Default::default()
        };
        let runner = TurnRunner::new(scripts, compiler());

        let mut ctx = TurnContext::with_text("a dragon appears");
        let report = runner.run(HookType::Output, &mut ctx).unwrap();

        assert_eq!(report.outcome.text.as_deref(), Some("A DRAGON APPEARS"));
        assert_eq!(report.active_modifiers, vec!["autoCards", "shout"]);
        assert_eq!(ctx.state["cards"], serde_json::json!(["Dragon"]));
    }
}
