//! Contract shared by all behavior layers

use crate::behavior::context::LayerContext;
use crate::core::error::Result;
use crate::tasks::ActionDescriptor;

/// One domain of behavior (looting, questing, mission duty) for one agent.
///
/// Methods return `Result` so that missing internal state surfaces as a
/// `BotError`; the brain turns every error into a safe default.
pub trait BehaviorLayer {
    fn name(&self) -> &'static str;

    /// Higher wins; equal priorities keep registration order
    fn priority(&self) -> i32;

    /// Cheap check, may trigger a throttled scan or objective refresh
    fn is_active(&mut self, ctx: &mut LayerContext) -> Result<bool>;

    fn next_action(&mut self, ctx: &mut LayerContext) -> Result<ActionDescriptor>;

    fn is_action_ending(&self) -> Result<bool>;

    fn start(&mut self, ctx: &mut LayerContext) -> Result<()>;

    fn stop(&mut self, ctx: &mut LayerContext);

    /// Advance the active task, picking the next goal when it ends
    fn update(&mut self, ctx: &mut LayerContext) -> Result<()>;
}
