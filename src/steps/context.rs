//! Scenario-scoped execution state
//!
//! A [`Context`] is created for each scenario and dropped at its end. It
//! borrows the collaborators (driver, catalog, settings, registry) and owns
//! the handles the scenario's steps hand to each other.

use std::collections::HashMap;
use std::time::Duration;

use crate::a11y::{Driver, Handle, MouseButton, NodeInfo, Query};
use crate::common::config::Timing;
use crate::common::{Error, Result};
use crate::side_channel::{SideChannel, Unavailable};

use super::poll::{non_empty, poll_until, RetryBudget};
use super::registry::Registry;
use super::translate::Catalog;

const DEFAULT_MAX_DEPTH: usize = 8;

/// State threaded through the steps of one scenario
pub struct Context<'a> {
    registry: &'a Registry,
    driver: &'a mut dyn Driver,
    catalog: &'a Catalog,
    settings: &'a dyn SideChannel,
    timing: Timing,
    max_depth: usize,
    depth: usize,
    app: Handle,
    handles: HashMap<String, Handle>,
}

impl<'a> Context<'a> {
    /// Fresh context anchored at the application handle
    pub fn new(
        registry: &'a Registry,
        driver: &'a mut dyn Driver,
        catalog: &'a Catalog,
        app: Handle,
    ) -> Self {
        Self {
            registry,
            driver,
            catalog,
            settings: &Unavailable,
            timing: Timing::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            app,
            handles: HashMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: &'a dyn SideChannel) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The active application or window
    pub fn current(&self) -> &Handle {
        &self.app
    }

    /// Switch to the first descendant matching `query` and focus it
    pub fn narrow(&mut self, query: Query) -> Result<()> {
        let window = self.app.child(query);
        self.driver.inspect(&window)?;
        tracing::debug!(window = %window, "narrowed application handle");
        self.app = window;
        self.driver.grab_focus(&self.app)
    }

    /// Keep a handle for later steps of this scenario
    pub fn remember(&mut self, key: &str, handle: Handle) {
        self.handles.insert(key.to_string(), handle);
    }

    /// Fetch a handle an earlier step kept
    pub fn recall(&self, key: &str) -> Result<Handle> {
        self.handles
            .get(key)
            .cloned()
            .ok_or_else(|| Error::HandleNotSet(key.to_string()))
    }

    /// Run a block of phrases through the registry before returning
    pub fn execute_steps(&mut self, block: &str) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }

        self.depth += 1;
        let registry = self.registry;
        let result = registry.run_block(self, block);
        self.depth -= 1;
        result
    }

    /// Localized form of a source-locale UI string
    pub fn translate(&self, source: &str) -> String {
        self.catalog.translate(source)
    }

    pub fn inspect(&mut self, node: &Handle) -> Result<NodeInfo> {
        self.driver.inspect(node)
    }

    pub fn showing(&mut self, node: &Handle) -> Result<bool> {
        Ok(self.driver.inspect(node)?.showing)
    }

    /// Current text content, read once
    pub fn text(&mut self, node: &Handle) -> Result<String> {
        Ok(self.driver.inspect(node)?.text)
    }

    pub fn click(&mut self, node: &Handle) -> Result<()> {
        self.driver.click(node, MouseButton::Left)
    }

    pub fn right_click(&mut self, node: &Handle) -> Result<()> {
        self.driver.click(node, MouseButton::Right)
    }

    pub fn point(&mut self, node: &Handle) -> Result<()> {
        self.driver.point(node)
    }

    pub fn focus(&mut self, node: &Handle) -> Result<()> {
        self.driver.grab_focus(node)
    }

    pub fn key_combo(&mut self, combo: &str) -> Result<()> {
        self.driver.key_combo(combo)
    }

    pub fn type_text(&mut self, text: &str) -> Result<()> {
        self.driver.type_text(text)
    }

    /// Poll budget from the configured timing
    pub fn budget(&self) -> RetryBudget {
        RetryBudget::new(
            self.timing.poll_attempts,
            Duration::from_millis(self.timing.poll_delay_ms),
        )
    }

    /// Read a node's text until it is non-empty or the budget runs out
    pub fn poll_text(&mut self, node: &Handle) -> Result<String> {
        let budget = self.budget();
        let driver = &mut *self.driver;
        poll_until(|| driver.inspect(node).map(|info| info.text), non_empty, budget)
    }

    /// Fixed wait after an action that redraws asynchronously
    pub fn settle(&self, base: Duration) {
        let wait = self.timing.settle(base);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }

    /// Query a system setting through the side channel
    pub fn setting(&self, schema: &str, key: &str) -> Result<String> {
        self.settings.get(schema, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a11y::memory::{Action, TreeNode};
    use crate::a11y::MemoryDriver;
    use crate::steps::registry::{Args, StepDef};

    fn desktop() -> MemoryDriver {
        let app = TreeNode::new("application", "eog")
            .with_child(TreeNode::new("frame", "Eye of GNOME"))
            .with_child(
                TreeNode::new("frame", "About Eye of GNOME")
                    .with_child(TreeNode::new("label", "Image viewer for GNOME")),
            );
        MemoryDriver::new(TreeNode::new("desktop", "").with_child(app))
    }

    #[test]
    fn test_narrow_replaces_handle_and_focuses() {
        let registry = Registry::new();
        let catalog = Catalog::identity();
        let mut driver = desktop();
        {
            let mut ctx =
                Context::new(&registry, &mut driver, &catalog, Handle::application("eog"));
            ctx.narrow(Query::role_name("frame", "About Eye of GNOME"))
                .unwrap();
            assert_eq!(
                ctx.current(),
                &Handle::application("eog").child(Query::role_name("frame", "About Eye of GNOME"))
            );
            let label = ctx.current().named("Image viewer for GNOME");
            assert!(ctx.showing(&label).unwrap());
        }
        assert_eq!(
            driver.journal(),
            &[Action::Focus {
                node: "About Eye of GNOME".to_string()
            }]
        );
    }

    #[test]
    fn test_narrow_to_missing_window_keeps_handle() {
        let registry = Registry::new();
        let catalog = Catalog::identity();
        let mut driver = desktop();
        let mut ctx = Context::new(&registry, &mut driver, &catalog, Handle::application("eog"));

        let err = ctx.narrow(Query::role_name("frame", "Preferences")).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
        assert_eq!(ctx.current(), &Handle::application("eog"));
    }

    #[test]
    fn test_remember_and_recall() {
        let registry = Registry::new();
        let catalog = Catalog::identity();
        let mut driver = desktop();
        let mut ctx = Context::new(&registry, &mut driver, &catalog, Handle::application("eog"));

        assert!(matches!(
            ctx.recall("about_dialog"),
            Err(Error::HandleNotSet(_))
        ));
        let dialog = ctx.current().named("About Eye of GNOME");
        ctx.remember("about_dialog", dialog.clone());
        assert_eq!(ctx.recall("about_dialog").unwrap(), dialog);
    }

    fn recurse(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
        ctx.execute_steps("* Recurse forever")
    }

    fn press_escape(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
        ctx.key_combo("<Esc>")
    }

    fn press_twice(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
        ctx.execute_steps("* Press escape\n* Press escape")?;
        ctx.key_combo("<Enter>")
    }

    #[test]
    fn test_recursion_is_bounded() {
        let mut registry = Registry::new();
        let catalog = Catalog::identity();
        registry
            .register(StepDef::action("Recurse forever", recurse))
            .unwrap();
        let mut driver = desktop();
        let mut ctx = Context::new(&registry, &mut driver, &catalog, Handle::application("eog"))
            .with_max_depth(3);

        match registry.run_phrase(&mut ctx, "Recurse forever") {
            Err(Error::RecursionLimit(limit)) => assert_eq!(limit, 3),
            other => panic!("Expected RecursionLimit, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_steps_finish_before_parent_continues() {
        let mut registry = Registry::new();
        let catalog = Catalog::identity();
        registry
            .register(StepDef::action("Press escape", press_escape))
            .unwrap();
        registry
            .register(StepDef::action("Press escape twice then enter", press_twice))
            .unwrap();
        let mut driver = desktop();
        {
            let mut ctx =
                Context::new(&registry, &mut driver, &catalog, Handle::application("eog"));
            registry
                .run_phrase(&mut ctx, "Press escape twice then enter")
                .unwrap();
            // depth is restored after the nested block
            ctx.execute_steps("* Press escape").unwrap();
        }
        assert_eq!(
            driver.journal(),
            &[
                Action::Key("<Esc>".to_string()),
                Action::Key("<Esc>".to_string()),
                Action::Key("<Enter>".to_string()),
                Action::Key("<Esc>".to_string()),
            ]
        );
    }

    #[test]
    fn test_poll_text_uses_budget() {
        let mut label = TreeNode::new("label", "size").with_text("640 × 480 pixels");
        label.text_delay = 3;
        let mut driver = MemoryDriver::new(TreeNode::new("desktop", "").with_child(label));
        let registry = Registry::new();
        let catalog = Catalog::identity();
        let node = Handle::root().named("size");

        let mut ctx = Context::new(&registry, &mut driver, &catalog, Handle::root())
            .with_timing(Timing::instant());
        assert_eq!(ctx.poll_text(&node).unwrap(), "640 × 480 pixels");
    }

    #[test]
    fn test_missing_settings_channel() {
        let registry = Registry::new();
        let catalog = Catalog::identity();
        let mut driver = desktop();
        let ctx = Context::new(&registry, &mut driver, &catalog, Handle::root());
        assert!(matches!(
            ctx.setting("org.gnome.desktop.background", "picture-uri"),
            Err(Error::SideChannel(_))
        ));
    }
}
