//! The director: runs each phase's modifiers against the shared turn state
//!
//! A director lives for one turn. Each phase entry method (`library`,
//! `input`, `context`, `output` and their `on_*` synonyms) registers the
//! phase's modifiers, runs every one of them in order and writes the
//! normalized results back into the [`TurnContext`].

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::config::DirectorConfig;
use super::context::{TurnContext, TurnOutcome};
use super::normalize::{mirror, report, ResultNormalizer};
use crate::core::{DirectorError, DirectorResult};
use crate::hooks::HookType;
use crate::modifier::{
    wrap_return, Modifier, ModifierSlot, ModifierSource, ModifierValue, ScriptCompiler,
    SourceCompiler,
};
use crate::registry::{ModifierRegistry, Snapshot};

/// Orchestrates the modifiers of one turn
pub struct Director {
    hook: HookType,
    registry: ModifierRegistry,
    config: DirectorConfig,
    compiler: Arc<dyn ScriptCompiler>,
}

impl Director {
    /// Create a director for the turn held by `ctx`, with default config
    pub fn new(ctx: &mut TurnContext) -> Self {
        Self::with_config(ctx, DirectorConfig::default())
    }

    /// Create a director with the given config.
    ///
    /// Installs an empty persisted catalog into `state` if none exists yet.
    pub fn with_config(ctx: &mut TurnContext, config: DirectorConfig) -> Self {
        tracing::info!("Creating director for turn {}", ctx.turn_id());

        if config.persist_catalog {
            if let Some(state) = ctx.state.as_object_mut() {
                state
                    .entry(config.store_key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
        }

        Self {
            hook: HookType::default(),
            registry: ModifierRegistry::new(),
            config,
            compiler: Arc::new(SourceCompiler::new()),
        }
    }

    /// Use `compiler` for textual modifiers
    pub fn with_compiler<C: ScriptCompiler + 'static>(self, compiler: C) -> Self {
        self.with_shared_compiler(Arc::new(compiler))
    }

    /// Use a compiler shared with other directors
    pub fn with_shared_compiler(mut self, compiler: Arc<dyn ScriptCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// The hook type entered most recently
    pub fn hook(&self) -> HookType {
        self.hook
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModifierRegistry {
        &self.registry
    }

    /// Run a phase.
    ///
    /// Fails before running anything if the phase defined its own
    /// `modifier`. Every modifier runs, in the order given, even after one
    /// of them stops the turn; a modifier passed twice runs twice.
    pub fn enter<I>(
        &mut self,
        ctx: &mut TurnContext,
        hook: HookType,
        modifiers: I,
    ) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        if hook != self.hook {
            tracing::debug!("Hook type: {} -> {}", self.hook, hook);
            self.hook = hook;
        }

        if let ModifierSlot::UserDefined(defined) = &ctx.modifier_slot {
            tracing::error!("Phase {} defined modifier {:?}", hook, defined.name());
            return Err(DirectorError::ModifierConflict {
                origin: "Director::enter".to_string(),
                hook,
            });
        }

        let modifiers: Vec<Modifier> = modifiers
            .into_iter()
            .filter_map(|source| self.resolve(ctx, source.into()))
            .collect();
        tracing::info!("Entering {} with {} modifier(s)", hook, modifiers.len());

        let snapshot = Snapshot {
            text: ctx.text().map(str::to_string),
            stop: ctx.stop(),
        };
        if self
            .registry
            .register(hook, snapshot, modifiers.iter().map(|m| m.name().to_string()))
        {
            self.sync_catalog(ctx)?;
        }

        for modifier in modifiers {
            tracing::debug!("Running modifier {:?} for {}", modifier.name(), hook);
            self.set_text(ctx, modifier)?;
        }

        Ok(self)
    }

    /// Run a phase named by its label, e.g. `"output"` or `"onOutput"`
    pub fn enter_label<I>(
        &mut self,
        ctx: &mut TurnContext,
        label: &str,
        modifiers: I,
    ) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        let hook = label.parse::<HookType>().map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;
        self.enter(ctx, hook, modifiers)
    }

    pub fn library<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.enter(ctx, HookType::Library, modifiers)
    }

    pub fn input<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.enter(ctx, HookType::Input, modifiers)
    }

    pub fn context<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.enter(ctx, HookType::Context, modifiers)
    }

    pub fn output<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.enter(ctx, HookType::Output, modifiers)
    }

    /// Synonym of [`library`](Self::library)
    pub fn on_library<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.library(ctx, modifiers)
    }

    /// Synonym of [`input`](Self::input)
    pub fn on_input<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.input(ctx, modifiers)
    }

    /// Synonym of [`context`](Self::context)
    pub fn on_context<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.context(ctx, modifiers)
    }

    /// Synonym of [`output`](Self::output)
    pub fn on_output<I>(&mut self, ctx: &mut TurnContext, modifiers: I) -> DirectorResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<ModifierSource>,
    {
        self.output(ctx, modifiers)
    }

    /// Normalize `value` and write it into the shared `text`.
    ///
    /// The write is skipped when the text would not change, or when the
    /// resolved value is not text-like (only possible once stopped).
    pub fn set_text(
        &self,
        ctx: &mut TurnContext,
        value: impl Into<ModifierValue>,
    ) -> DirectorResult<()> {
        let resolved = ResultNormalizer::new(self.hook, &self.config).normalize(value.into(), ctx)?;
        match resolved {
            ModifierValue::Text(text) => {
                ctx.store_text(Some(text));
            }
            ModifierValue::Null | ModifierValue::Undefined => {
                ctx.store_text(None);
            }
            other => {
                tracing::debug!("Not writing {} into text", other.type_name());
            }
        }
        Ok(())
    }

    /// Set the shared `stop` flag. Stopping clears any pending text.
    pub fn set_stop(&self, ctx: &mut TurnContext, stop: bool) {
        ctx.store_stop(stop);
    }

    /// Set `stop` from an untyped value; anything but a boolean means `true`
    pub fn set_stop_value(&self, ctx: &mut TurnContext, stop: &Value) {
        self.set_stop(ctx, stop.as_bool().unwrap_or(true));
    }

    /// Log a script message and mirror it into the user-visible message slot
    pub fn log(&self, ctx: &mut TurnContext, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::info!(turn_id = %ctx.turn_id(), hook = %self.hook, "{}", message);
        mirror(ctx, &self.config, &message);
    }

    /// The terminal `modifier()` the host reads after all phases ran
    pub fn finish(&self, ctx: &TurnContext) -> TurnOutcome {
        let outcome = ctx.outcome();
        tracing::info!(
            "Turn {} finished: stop={}, text={}",
            ctx.turn_id(),
            outcome.stop,
            outcome.text.as_deref().map_or(0, str::len)
        );
        outcome
    }

    /// Names of every modifier registered this turn, deduplicated
    pub fn active_modifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.registry.all_active()
    }

    /// Turn a source into a callable, or `None` if it should be skipped
    fn resolve(&self, ctx: &mut TurnContext, source: ModifierSource) -> Option<Modifier> {
        match source {
            ModifierSource::Function(modifier) => Some(modifier),
            ModifierSource::HostDefault => None,
            ModifierSource::Script(code) => match self.compiler.compile(&wrap_return(&code)) {
                Ok(ModifierSlot::UserDefined(modifier)) => Some(modifier),
                Ok(ModifierSlot::Unset) => None,
                Err(source) => {
                    let err = DirectorError::Compile {
                        origin: "Director::resolve".to_string(),
                        source,
                    };
                    tracing::warn!("Skipping modifier source: {}", err);
                    report(ctx, &self.config, &err);
                    None
                }
            },
        }
    }

    /// Merge this turn's catalog into the persisted one
    fn sync_catalog(&self, ctx: &mut TurnContext) -> DirectorResult<()> {
        if !self.config.persist_catalog {
            return Ok(());
        }

        let Some(state) = ctx.state.as_object_mut() else {
            return Ok(());
        };
        let store = state
            .entry(self.config.store_key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !store.is_object() {
            *store = Value::Object(Map::new());
        }

        if let Some(store) = store.as_object_mut() {
            for (hook, entry) in self.registry.entries() {
                let value = serde_json::to_value(entry).map_err(|source| DirectorError::Json {
                    origin: "Director::sync_catalog".to_string(),
                    source,
                })?;
                store.insert(hook.as_str().to_string(), value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(value: &'static str) -> Modifier {
        Modifier::new(value, move |_| Ok(value.into()))
    }

    #[test]
    fn test_output_pair_example() {
        let m1 = Modifier::new("m1", |_| Ok("Hello".into()));
        let m2 = Modifier::new("m2", |_| Ok(ModifierValue::pair("Hello!", false)));

        let mut ctx = TurnContext::with_text("raw");
        let mut director = Director::new(&mut ctx);
        director.output(&mut ctx, [m1, m2]).unwrap();

        assert_eq!(ctx.text(), Some("Hello!"));
        assert!(!ctx.stop());
        assert_eq!(
            director.registry().get(HookType::Output).unwrap().scripts,
            vec!["m1", "m2"]
        );
    }

    #[test]
    fn test_all_modifiers_run_after_stop() {
        let stopper = Modifier::new("stopper", |_| Ok(ModifierValue::pair("halt", true)));
        let after = Modifier::new("after", |call| {
            assert!(call.stop);
            call.state["after_ran"] = json!(true);
            Ok(ModifierValue::Null)
        });

        let mut ctx = TurnContext::with_text("go");
        let mut director = Director::new(&mut ctx);
        director.input(&mut ctx, [stopper, after]).unwrap();

        assert!(ctx.stop());
        assert_eq!(ctx.text(), None);
        assert_eq!(ctx.state["after_ran"], json!(true));
    }

    #[test]
    fn test_snapshot_is_write_once() {
        let mut ctx = TurnContext::with_text("first");
        let mut director = Director::new(&mut ctx);
        director
            .output(&mut ctx, [text("one")])
            .unwrap()
            .output(&mut ctx, [text("two")])
            .unwrap();

        // Both calls executed
        assert_eq!(ctx.text(), Some("two"));

        let entry = director.registry().get(HookType::Output).unwrap();
        assert_eq!(entry.snapshot.text.as_deref(), Some("first"));
        assert_eq!(entry.scripts, vec!["one"]);
    }

    #[test]
    fn test_conflict_blocks_phase() {
        let mut ctx = TurnContext::with_text("untouched");
        let mut director = Director::new(&mut ctx);
        ctx.define_modifier(text("rogue"));

        let err = director
            .input(&mut ctx, [text("never")])
            .err()
            .expect("conflict");
        assert!(matches!(
            err,
            DirectorError::ModifierConflict {
                hook: HookType::Input,
                ..
            }
        ));
        assert_eq!(ctx.text(), Some("untouched"));
        assert!(director.registry().is_empty());
    }

    #[test]
    fn test_duplicates_execute_twice() {
        let bang = Modifier::new("bang", |call| {
            Ok(format!("{}!", call.text.clone().unwrap_or_default()).into())
        });

        let mut ctx = TurnContext::with_text("hey");
        let mut director = Director::new(&mut ctx);
        director.output(&mut ctx, [bang.clone(), bang]).unwrap();

        assert_eq!(ctx.text(), Some("hey!!"));
        assert_eq!(director.registry().get(HookType::Output).unwrap().scripts, vec!["bang"]);
    }

    #[test]
    fn test_host_default_and_bad_sources_skipped() {
        let mut ctx = TurnContext::with_text("keep");
        let mut director = Director::new(&mut ctx);
        director
            .context(
                &mut ctx,
                [
                    ModifierSource::HostDefault,
                    ModifierSource::from("modifier"),
                    ModifierSource::from("missing"),
                ],
            )
            .unwrap();

        assert_eq!(ctx.text(), Some("keep"));
        assert!(director.registry().get(HookType::Context).unwrap().scripts.is_empty());
        assert!(ctx.state_str("message").unwrap().contains("\"missing\" is not defined"));
    }

    #[test]
    fn test_invalid_label() {
        let mut ctx = TurnContext::default();
        let mut director = Director::new(&mut ctx);
        let err = director
            .enter_label(&mut ctx, "postOutput", Vec::<ModifierSource>::new())
            .err()
            .expect("invalid hook");
        assert!(matches!(err, DirectorError::InvalidHookType { .. }));
    }

    #[test]
    fn test_catalog_persisted_and_merged() {
        let mut ctx = TurnContext::with_text("x").with_state(json!({
            "$store": { "input": { "_": { "text": "old", "stop": false }, "scripts": ["prev"] } }
        }));
        let mut director = Director::new(&mut ctx);
        director.output(&mut ctx, [text("y")]).unwrap();

        assert_eq!(ctx.state["$store"]["output"]["scripts"], json!(["y"]));
        assert_eq!(ctx.state["$store"]["input"]["scripts"], json!(["prev"]));
    }

    #[test]
    fn test_catalog_installed_on_construction() {
        let mut ctx = TurnContext::default();
        let _director = Director::new(&mut ctx);
        assert_eq!(ctx.state["$store"], json!({}));

        let mut ctx = TurnContext::default();
        let _director =
            Director::with_config(&mut ctx, DirectorConfig::new().with_persist_catalog(false));
        assert!(ctx.state.get("$store").is_none());
    }

    #[test]
    fn test_catalog_persisted_before_fatal_modifier() {
        let ok = text("ok");
        let bad = Modifier::new("bad", |_| Ok(ModifierValue::from(json!(42))));

        let mut ctx = TurnContext::with_text("x");
        let mut director = Director::new(&mut ctx);
        let err = director.input(&mut ctx, [ok, bad]).err().expect("type error");

        assert!(matches!(err, DirectorError::TypeValidation { .. }));
        assert!(director.registry().get(HookType::Input).is_some());
        assert_eq!(ctx.state["$store"]["input"]["scripts"], json!(["ok", "bad"]));
        assert_eq!(ctx.state["$store"]["input"]["_"]["text"], json!("x"));
    }

    #[test]
    fn test_custom_store_key() {
        let mut ctx = TurnContext::with_text("x");
        let config = DirectorConfig::new().with_store_key("catalog");
        let mut director = Director::with_config(&mut ctx, config);
        director.output(&mut ctx, [text("y")]).unwrap();

        assert_eq!(ctx.state["catalog"]["output"]["scripts"], json!(["y"]));
        assert!(ctx.state.get("$store").is_none());
    }

    #[test]
    fn test_catalog_not_synced_when_disabled() {
        let mut ctx = TurnContext::with_text("x");
        let config = DirectorConfig::new().with_persist_catalog(false);
        let mut director = Director::with_config(&mut ctx, config);
        director.output(&mut ctx, [text("y")]).unwrap();

        assert_eq!(ctx.text(), Some("y"));
        assert_eq!(ctx.state, json!({}));
    }

    #[test]
    fn test_custom_message_key() {
        let boom = Modifier::new("boom", |_| Err(anyhow::anyhow!("boom")));

        let mut ctx = TurnContext::with_text("safe");
        let config = DirectorConfig::new().with_message_key("notice");
        let mut director = Director::with_config(&mut ctx, config);
        director.output(&mut ctx, [boom]).unwrap();

        assert_eq!(ctx.state_str("notice"), Some("[boom] boom"));
        assert!(ctx.state.get("message").is_none());
    }

    #[test]
    fn test_errors_not_surfaced_when_disabled() {
        let boom = Modifier::new("boom", |_| Err(anyhow::anyhow!("boom")));

        let mut ctx = TurnContext::with_text("safe").with_state(json!({ "message": "welcome" }));
        let config = DirectorConfig::new().with_surface_errors(false);
        let mut director = Director::with_config(&mut ctx, config);
        director
            .output(&mut ctx, [ModifierSource::from(boom), ModifierSource::from("missing")])
            .unwrap();

        assert_eq!(ctx.text(), Some("safe"));
        assert_eq!(ctx.state_str("message"), Some("welcome"));
    }

    #[test]
    fn test_log_mirrors_message() {
        let mut ctx = TurnContext::default();
        let director = Director::new(&mut ctx);
        director.log(&mut ctx, format_args!("{} gold found", 3));
        assert_eq!(ctx.state_str("message"), Some("3 gold found"));

        let mut ctx = TurnContext::default();
        let director = Director::with_config(
            &mut ctx,
            DirectorConfig::new()
                .with_message_key("notice")
                .with_surface_errors(false),
        );
        director.log(&mut ctx, "quiet");
        assert!(ctx.state.get("notice").is_none());
    }

    #[test]
    fn test_cleared_modifier_allows_next_phase() {
        let mut ctx = TurnContext::with_text("start");
        let mut director = Director::new(&mut ctx);

        ctx.define_modifier(text("rogue"));
        assert!(director.input(&mut ctx, [text("never")]).is_err());

        ctx.clear_modifier();
        director.output(&mut ctx, [text("after")]).unwrap();
        assert_eq!(ctx.text(), Some("after"));
    }

    #[test]
    fn test_set_stop_value_coerces() {
        let mut ctx = TurnContext::with_text("pending");
        let director = Director::new(&mut ctx);
        director.set_stop_value(&mut ctx, &json!("yes"));
        assert!(ctx.stop());
        assert_eq!(ctx.text(), None);

        director.set_stop_value(&mut ctx, &json!(false));
        assert!(!ctx.stop());
    }
}
