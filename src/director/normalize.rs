//! Resolving modifier return values to text
//!
//! Resolution repeats until a terminal value is reached:
//! 1. Pending values are rejected
//! 2. Callables are invoked and their result resolved again
//! 3. `[text, stop]` pairs and `{text, stop}` records set `stop` and yield `text`
//! 4. Anything else is terminal
//!
//! A modifier that fails is logged and resolution falls back to the text as
//! it was before that modifier ran.

use super::config::DirectorConfig;
use super::context::TurnContext;
use crate::core::{DirectorError, DirectorResult};
use crate::hooks::HookType;
use crate::modifier::{CallConvention, ModifierCall, ModifierValue};

const ORIGIN: &str = "Director::set_text";

/// Resolves values for one hook type
pub(crate) struct ResultNormalizer<'a> {
    hook: HookType,
    config: &'a DirectorConfig,
}

impl<'a> ResultNormalizer<'a> {
    pub(crate) fn new(hook: HookType, config: &'a DirectorConfig) -> Self {
        Self { hook, config }
    }

    /// Resolve `value` and check the result is text unless the turn stopped
    pub(crate) fn normalize(
        &self,
        value: ModifierValue,
        ctx: &mut TurnContext,
    ) -> DirectorResult<ModifierValue> {
        let resolved = self.resolve(value, ctx)?;
        if !ctx.stop() && !matches!(resolved, ModifierValue::Text(_)) {
            return Err(DirectorError::TypeValidation {
                origin: ORIGIN.to_string(),
                found: resolved.type_name(),
            });
        }
        Ok(resolved)
    }

    fn resolve(&self, mut value: ModifierValue, ctx: &mut TurnContext) -> DirectorResult<ModifierValue> {
        loop {
            value = match value {
                ModifierValue::Pending(_) => {
                    return Err(DirectorError::UnsupportedValue {
                        origin: ORIGIN.to_string(),
                    });
                }
                ModifierValue::Callable(modifier) => {
                    let prior: ModifierValue = ctx.text().map(str::to_string).into();
                    let convention = modifier.convention_for(self.hook);
                    let mut call = ModifierCall {
                        text: match convention {
                            CallConvention::Registration => None,
                            _ => ctx.text().map(str::to_string),
                        },
                        stop: ctx.stop(),
                        hook: self.hook,
                        convention,
                        state: &mut ctx.state,
                    };

                    match modifier.invoke(&mut call) {
                        Ok(_) if convention == CallConvention::Registration => prior,
                        Ok(result) => result,
                        Err(e) => {
                            let err = DirectorError::invocation(modifier.name(), &e);
                            report(ctx, self.config, &err);
                            return Ok(prior);
                        }
                    }
                }
                ModifierValue::Pair { text, stop } | ModifierValue::Record { text, stop } => {
                    if stop {
                        ctx.store_stop(true);
                    }
                    return Ok(*text);
                }
                terminal => return Ok(terminal),
            };
        }
    }
}

/// Log a recovered error and mirror it into the user-visible message slot
pub(crate) fn report(ctx: &mut TurnContext, config: &DirectorConfig, err: &DirectorError) {
    tracing::error!(turn_id = %ctx.turn_id(), "{}", err);
    mirror(ctx, config, &err.to_string());
}

/// Copy `message` into the user-visible message slot when enabled
pub(crate) fn mirror(ctx: &mut TurnContext, config: &DirectorConfig, message: &str) {
    if config.surface_errors {
        ctx.post_message(&config.message_key, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    fn normalize(hook: HookType, value: ModifierValue, ctx: &mut TurnContext) -> DirectorResult<ModifierValue> {
        let config = DirectorConfig::default();
        ResultNormalizer::new(hook, &config).normalize(value, ctx)
    }

    #[test]
    fn test_pair_with_stop() {
        let mut ctx = TurnContext::with_text("prior");
        let value = normalize(HookType::Output, ModifierValue::pair("T", true), &mut ctx).unwrap();

        assert!(matches!(value, ModifierValue::Text(ref t) if t == "T"));
        assert!(ctx.stop());
        // The stop transition cleared the prior text
        assert_eq!(ctx.text(), None);
    }

    #[test]
    fn test_nested_callables_resolve() {
        let inner = Modifier::new("inner", |call| Ok(format!("{}!", call.text.clone().unwrap_or_default()).into()));
        let outer = Modifier::new("outer", move |_| Ok(inner.clone().into()));

        let mut ctx = TurnContext::with_text("Hello");
        let value = normalize(HookType::Output, outer.into(), &mut ctx).unwrap();
        assert!(matches!(value, ModifierValue::Text(ref t) if t == "Hello!"));
    }

    #[test]
    fn test_auto_card_in_library_keeps_prior() {
        let card = Modifier::new("autoCard", |call| {
            assert_eq!(call.convention, CallConvention::Registration);
            assert!(call.text.is_none());
            Ok("ignored".into())
        });

        let mut ctx = TurnContext::with_text("prior");
        let value = normalize(HookType::Library, card.into(), &mut ctx).unwrap();
        assert!(matches!(value, ModifierValue::Text(ref t) if t == "prior"));
    }

    #[test]
    fn test_auto_cards_positional_outside_library() {
        let cards = Modifier::new("AutoCards", |call| {
            assert_eq!(call.convention, CallConvention::Positional);
            assert_eq!(call.hook, HookType::Context);
            Ok("carded".into())
        });

        let mut ctx = TurnContext::with_text("prior");
        let value = normalize(HookType::Context, cards.into(), &mut ctx).unwrap();
        assert!(matches!(value, ModifierValue::Text(ref t) if t == "carded"));
    }

    #[test]
    fn test_failure_falls_back_to_prior() {
        let boom = Modifier::new("boom", |_| Err(anyhow::anyhow!("boom")));

        let mut ctx = TurnContext::with_text("safe");
        let value = normalize(HookType::Output, boom.into(), &mut ctx).unwrap();
        assert!(matches!(value, ModifierValue::Text(ref t) if t == "safe"));
        assert_eq!(ctx.state_str("message"), Some("[boom] boom"));
    }

    #[test]
    fn test_failure_not_surfaced_when_disabled() {
        let boom = Modifier::new("boom", |_| Err(anyhow::anyhow!("boom")));
        let config = DirectorConfig::new().with_surface_errors(false);

        let mut ctx = TurnContext::with_text("safe");
        let value = ResultNormalizer::new(HookType::Output, &config)
            .normalize(boom.into(), &mut ctx)
            .unwrap();
        assert!(matches!(value, ModifierValue::Text(ref t) if t == "safe"));
        assert!(ctx.state.get("message").is_none());
    }

    #[test]
    fn test_pending_rejected() {
        let mut ctx = TurnContext::with_text("x");
        let err = normalize(
            HookType::Input,
            ModifierValue::pending(async { Ok(ModifierValue::Null) }),
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(err, DirectorError::UnsupportedValue { .. }));
    }

    #[test]
    fn test_non_text_rejected_unless_stopped() {
        let mut ctx = TurnContext::with_text("x");
        let err = normalize(HookType::Input, ModifierValue::Null, &mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Director::set_text] text must be a type of string, got \"Null\""
        );

        let mut ctx = TurnContext::with_text("x").with_stop(true);
        assert!(normalize(HookType::Input, ModifierValue::Null, &mut ctx).is_ok());
    }
}
