//! Renderer: the tree and its scheduler driven together by the host
//!
//! The host owns the event loop. It calls [`Renderer::tick`] whenever the
//! scheduler asks for a slice ([`Renderer::next_deferral`] tells it how to
//! defer), or [`Renderer::run_until_idle`] to settle everything at once.

use crate::arena::FiberId;
use crate::config::RendererConfig;
use crate::element::Element;
use crate::error::FiberResult;
use std::path::Path;
use crate::hooks::Updater;
use crate::reconcile::{RenderStats, Tree};
use void_dom::Backend;
use void_scheduler::{Clock, Deferral, Scheduler, SystemClock};

/// Fiber tree plus scheduler
pub struct Renderer<B: Backend + 'static> {
    tree: Tree<B>,
    scheduler: Scheduler<Tree<B>>,
}

impl<B: Backend + 'static> Renderer<B> {
    /// Create a renderer with default configuration
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, RendererConfig::default())
    }

    /// Create a renderer with the given configuration
    pub fn with_config(backend: B, config: RendererConfig) -> Self {
        Self::with_clock(backend, config, Box::new(SystemClock::new()))
    }

    /// Create a renderer configured from a TOML file
    pub fn from_config_file(backend: B, path: impl AsRef<Path>) -> FiberResult<Self> {
        let config = RendererConfig::load(path)?;
        Ok(Self::with_config(backend, config))
    }

    /// Create a renderer with a custom clock
    pub fn with_clock(backend: B, config: RendererConfig, clock: Box<dyn Clock>) -> Self {
        log::info!(
            "Renderer created (slice budget {:?}, continuation {:?})",
            config.scheduler.slice_budget(),
            config.scheduler.continuation
        );
        Self {
            tree: Tree::new(backend),
            scheduler: Scheduler::with_clock(config.scheduler, clock),
        }
    }

    /// Mount or re-render `element` into `container`. Work happens on the
    /// following ticks.
    pub fn render(&mut self, element: Element, container: &B::Node) -> FiberId {
        self.tree.render(element, container.clone(), &mut self.scheduler)
    }

    /// Re-render a fiber
    pub fn update(&mut self, fiber: FiberId) -> FiberResult<()> {
        self.tree.update(fiber, &mut self.scheduler)
    }

    /// Update requester that can be handed to callbacks
    pub fn updater(&self) -> Updater {
        self.tree.updater()
    }

    /// Schedule a callback on the scheduler
    pub fn start_transition(&mut self, func: impl FnOnce(&mut Tree<B>) + 'static) {
        self.scheduler.start_transition(func);
    }

    /// Pick up update requests and run one requested slice.
    /// Returns false when no slice was requested.
    pub fn tick(&mut self) -> bool {
        self.tree.drain_requests(&mut self.scheduler);
        self.scheduler.wake(&mut self.tree)
    }

    /// Tick until nothing is requested. Returns the number of ticks.
    pub fn run_until_idle(&mut self) -> u64 {
        let mut ticks = 0;
        while self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// How the host should defer the next tick, if one is requested
    pub fn next_deferral(&self) -> Option<Deferral> {
        self.scheduler.next_deferral()
    }

    /// Root fiber mounted on `container`
    pub fn root(&self, container: &B::Node) -> FiberResult<FiberId> {
        self.tree.root(container)
    }

    /// Get the tree
    pub fn tree(&self) -> &Tree<B> {
        &self.tree
    }

    /// Get the scheduler
    pub fn scheduler(&self) -> &Scheduler<Tree<B>> {
        &self.scheduler
    }

    /// Render statistics
    pub fn stats(&self) -> &RenderStats {
        self.tree.stats()
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        self.tree.backend()
    }

    /// Get the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        self.tree.backend_mut()
    }

    /// Tear down the renderer and hand the backend back
    pub fn into_backend(self) -> B {
        self.tree.into_backend()
    }
}
