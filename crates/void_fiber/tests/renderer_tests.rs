//! End-to-end tests: renderer over the memory document

use std::cell::{Cell, RefCell};
use std::time::Duration;
use void_fiber::prelude::*;
use void_fiber::ConfigError;

fn setup() -> (Renderer<MemoryDocument>, NodeId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = MemoryDocument::new();
    let root = doc.create_container("main");
    (Renderer::new(doc), root)
}

fn first_child(renderer: &Renderer<MemoryDocument>, node: NodeId) -> NodeId {
    renderer.backend().children(node)[0]
}

fn list(items: &[&str]) -> Element {
    h("ul").children(items.iter().map(|item| h("li").key(item).child(text(*item))))
}

fn toggle(scope: &mut Scope<'_>) -> Vec<Element> {
    let (shown, set) = scope.use_state(true);
    let child = if shown {
        h("h1").child(text(0))
    } else {
        h("a").child(text("none"))
    };
    vec![h("div").on("click", move |_| set.set(!shown)).child(child)]
}

const TOGGLE: Component = Component::new("Toggle", toggle);

#[test]
fn test_toggle_end_to_end() {
    let (mut renderer, root) = setup();
    renderer.render(Element::component(TOGGLE), &root);
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(root), "<div><h1>0</h1></div>");

    let div = first_child(&renderer, root);
    let h1 = first_child(&renderer, div);
    let root_fiber = renderer.root(&root).unwrap();
    let app = renderer.tree().children_of(root_fiber)[0];

    assert_eq!(renderer.backend().dispatch(div, &Event::new("click", Value::Null)), 1);
    renderer.run_until_idle();

    assert_eq!(renderer.backend().inner_html(root), "<div><a>none</a></div>");
    assert_eq!(renderer.backend().parent(h1), None);
    assert_eq!(first_child(&renderer, root), div);

    // same fiber, same slot
    assert_eq!(renderer.tree().children_of(root_fiber), vec![app]);
    let hooks = renderer.tree().fiber(app).unwrap().hooks();
    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks.state::<bool>(0), Some(false));

    // and back
    renderer.backend().dispatch(div, &Event::new("click", Value::Null));
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(root), "<div><h1>0</h1></div>");
}

#[test]
fn test_keyed_swap_is_one_move() {
    let (mut renderer, root) = setup();
    renderer.render(list(&["1", "2"]), &root);
    renderer.run_until_idle();
    let ul = first_child(&renderer, root);
    let before: Vec<NodeId> = renderer.backend().children(ul).to_vec();
    renderer.backend_mut().take_ops();
    let moves = renderer.stats().moves;

    renderer.render(list(&["2", "1"]), &root);
    renderer.run_until_idle();

    assert_eq!(renderer.backend().inner_html(ul), "<li>2</li><li>1</li>");
    assert_eq!(renderer.backend().children(ul), &[before[1], before[0]]);
    assert_eq!(renderer.stats().moves - moves, 1);

    let ops = renderer.backend_mut().take_ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(ops[0], DomOp::Insert { node, .. } if node == before[1]));
}

#[test]
fn test_keyed_insert_and_reorder() {
    let (mut renderer, root) = setup();
    renderer.render(list(&["b", "c"]), &root);
    renderer.run_until_idle();
    let ul = first_child(&renderer, root);

    renderer.render(list(&["a", "b", "c"]), &root);
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(ul), "<li>a</li><li>b</li><li>c</li>");

    renderer.render(list(&["c", "x", "a", "d"]), &root);
    renderer.run_until_idle();
    assert_eq!(
        renderer.backend().inner_html(ul),
        "<li>c</li><li>x</li><li>a</li><li>d</li>"
    );
}

#[test]
fn test_pure_insert_appends() {
    let (mut renderer, root) = setup();
    renderer.render(list(&["a"]), &root);
    renderer.run_until_idle();
    let ul = first_child(&renderer, root);
    let a = first_child(&renderer, ul);
    let before = renderer.stats().clone();

    renderer.render(list(&["a", "b"]), &root);
    renderer.run_until_idle();

    let stats = renderer.stats();
    assert_eq!(stats.inserts - before.inserts, 2); // li and its text
    assert_eq!(stats.moves, before.moves);
    assert_eq!(stats.removals, before.removals);
    assert_eq!(first_child(&renderer, ul), a);
    assert_eq!(renderer.backend().inner_html(ul), "<li>a</li><li>b</li>");
}

#[test]
fn test_removal_clears_ref() {
    let (mut renderer, root) = setup();
    let item = create_ref();

    renderer.render(
        h("ul").child(h("li").child(text("a"))).child(h("li").node_ref(item.clone()).child(text("b"))),
        &root,
    );
    renderer.run_until_idle();
    let b = item.current::<NodeId>().unwrap();
    assert_eq!(renderer.backend().text_content(b), "b");
    let fibers = renderer.tree().len();
    renderer.backend_mut().take_ops();

    renderer.render(h("ul").child(h("li").child(text("a"))), &root);
    renderer.run_until_idle();

    assert!(!item.is_set());
    assert_eq!(renderer.backend().parent(b), None);
    // li and its text fiber are freed
    assert_eq!(renderer.tree().len(), fibers - 2);

    let removed: Vec<_> = renderer
        .backend()
        .ops()
        .iter()
        .filter(|op| matches!(op, DomOp::Remove(_)))
        .collect();
    assert_eq!(removed, vec![&DomOp::Remove(b)]);
}

#[test]
fn test_identical_render_is_idempotent() {
    let (mut renderer, root) = setup();
    let tree = || {
        h("section")
            .prop("id", "main")
            .style("color", "red")
            .child(list(&["a", "b", "c"]))
            .child(h("p").child(text("tail")))
    };

    renderer.render(tree(), &root);
    renderer.run_until_idle();
    let html = renderer.backend().inner_html(root);
    renderer.backend_mut().take_ops();
    let before = renderer.stats().clone();

    renderer.render(tree(), &root);
    renderer.run_until_idle();

    let stats = renderer.stats();
    assert_eq!(stats.inserts, before.inserts);
    assert_eq!(stats.moves, before.moves);
    assert_eq!(stats.removals, before.removals);
    assert!(renderer.backend().ops().is_empty());
    assert_eq!(renderer.backend().inner_html(root), html);
}

thread_local! {
    static LABEL_RENDERS: Cell<u32> = const { Cell::new(0) };
}

fn label(scope: &mut Scope<'_>) -> Vec<Element> {
    LABEL_RENDERS.with(|n| n.set(n.get() + 1));
    let value = scope.prop("text").cloned().unwrap_or_default();
    vec![h("span").child(text(value))]
}

const LABEL: Component = Component::new("Label", label).memo();

#[test]
fn test_memo_short_circuit() {
    let (mut renderer, root) = setup();
    let page = |n: i64, label: &str| {
        h("div")
            .prop("n", n)
            .child(Element::component(LABEL).prop("text", label))
    };

    renderer.render(page(1, "hi"), &root);
    renderer.run_until_idle();
    assert_eq!(LABEL_RENDERS.with(Cell::get), 1);
    let div = first_child(&renderer, root);
    renderer.backend_mut().take_ops();

    renderer.render(page(2, "hi"), &root);
    renderer.run_until_idle();
    assert_eq!(LABEL_RENDERS.with(Cell::get), 1);
    assert_eq!(renderer.stats().memo_skips, 1);
    assert_eq!(
        renderer.backend().ops(),
        &[DomOp::SetAttribute(div, "n".into(), "2".into())]
    );

    renderer.render(page(2, "bye"), &root);
    renderer.run_until_idle();
    assert_eq!(LABEL_RENDERS.with(Cell::get), 2);
    assert_eq!(renderer.backend().inner_html(root), "<div n=\"2\"><span>bye</span></div>");
}

fn pair(scope: &mut Scope<'_>) -> Vec<Element> {
    let label = scope.prop("label").cloned().unwrap_or_default();
    vec![h("b").child(text(label.clone())), h("i").child(text(label))]
}

const PAIR: Component = Component::new("Pair", pair);

#[test]
fn test_component_move_carries_all_nodes() {
    let (mut renderer, root) = setup();
    let row = |keys: &[&str]| {
        h("div").children(
            keys.iter()
                .map(|k| Element::component(PAIR).key(k).prop("label", *k)),
        )
    };

    renderer.render(row(&["1", "2"]), &root);
    renderer.run_until_idle();
    let div = first_child(&renderer, root);
    assert_eq!(renderer.backend().inner_html(div), "<b>1</b><i>1</i><b>2</b><i>2</i>");

    renderer.render(row(&["2", "1"]), &root);
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(div), "<b>2</b><i>2</i><b>1</b><i>1</i>");

    renderer.render(row(&["3", "1"]), &root);
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(div), "<b>3</b><i>3</i><b>1</b><i>1</i>");
}

#[test]
fn test_fragment_children() {
    let (mut renderer, root) = setup();
    renderer.render(
        h("p").child(fragment([text("a"), text("b")])).child(h("hr")),
        &root,
    );
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(root), "<p>ab<hr></hr></p>");
}

#[test]
fn test_svg_namespace_propagates() {
    let (mut renderer, root) = setup();
    renderer.render(
        h("div").child(h("svg").child(h("g").child(h("rect").prop("value", "v")))),
        &root,
    );
    renderer.run_until_idle();

    let div = first_child(&renderer, root);
    let svg = first_child(&renderer, div);
    let rect = first_child(&renderer, first_child(&renderer, svg));
    let doc = renderer.backend();
    assert!(!doc.is_svg(&div));
    assert!(doc.is_svg(&svg));
    assert!(doc.is_svg(&rect));
    assert_eq!(doc.attribute(rect, "value"), Some("v"));
    assert_eq!(doc.property(rect, "value"), None);
}

thread_local! {
    static LIFECYCLE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn record(entry: &'static str) {
    LIFECYCLE.with(|log| log.borrow_mut().push(entry));
}

fn lifecycle(scope: &mut Scope<'_>) -> Vec<Element> {
    scope.use_effect(Some(Vec::new()), || {
        record("effect");
        Some(Box::new(|| record("effect cleanup")) as Cleanup)
    });
    scope.use_layout(Some(Vec::new()), || {
        record("layout");
        None
    });
    vec![h("span")]
}

const LIFECYCLE_COMPONENT: Component = Component::new("Lifecycle", lifecycle);

#[test]
fn test_layout_before_effects_and_cleanup_on_removal() {
    let (mut renderer, root) = setup();
    renderer.render(h("div").child(Element::component(LIFECYCLE_COMPONENT)), &root);
    renderer.run_until_idle();
    assert_eq!(LIFECYCLE.with(|log| log.borrow().clone()), vec!["layout", "effect"]);

    // deps unchanged: nothing re-runs
    renderer.render(h("div").child(Element::component(LIFECYCLE_COMPONENT)), &root);
    renderer.run_until_idle();
    assert_eq!(LIFECYCLE.with(|log| log.borrow().len()), 2);

    renderer.render(h("div"), &root);
    renderer.run_until_idle();
    assert_eq!(
        LIFECYCLE.with(|log| log.borrow().clone()),
        vec!["layout", "effect", "effect cleanup"]
    );
    assert_eq!(renderer.backend().inner_html(root), "<div></div>");
}

fn counter(scope: &mut Scope<'_>) -> Vec<Element> {
    let (count, set) = scope.use_state(0i64);
    scope.use_effect(Some(vec![count.into()]), move || {
        if count < 3 {
            set.set(count + 1);
        }
        None
    });
    vec![text(count)]
}

#[test]
fn test_effect_updates_settle() {
    let (mut renderer, root) = setup();
    renderer.render(Element::component(Component::new("Counter", counter)), &root);
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(root), "3");
}

#[test]
fn test_fairness_across_roots() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = MemoryDocument::new();
    let containers: Vec<NodeId> = (0..5).map(|_| doc.create_container("main")).collect();

    let clock = ManualClock::with_step(Duration::from_millis(1));
    let config = RendererConfig::default()
        .with_scheduler(SchedulerConfig::default().with_slice_budget(Duration::from_millis(1)));
    let mut renderer = Renderer::with_clock(doc, config, Box::new(clock));

    for (i, container) in containers.iter().enumerate() {
        renderer.render(h("p").child(text(i)), container);
    }
    let ticks = renderer.run_until_idle();

    assert!(ticks > 5);
    assert!(renderer.scheduler().stats().jobs_resumed > 0);
    for (i, container) in containers.iter().enumerate() {
        assert_eq!(renderer.backend().inner_html(*container), format!("<p>{i}</p>"));
    }
    assert_eq!(renderer.stats().walks, 5);
}

#[test]
fn test_walk_resumes_across_slices() {
    let mut doc = MemoryDocument::new();
    let root = doc.create_container("main");
    let clock = ManualClock::with_step(Duration::from_millis(2));
    let config = RendererConfig::default()
        .with_scheduler(SchedulerConfig::default().with_slice_budget(Duration::from_millis(1)));
    let mut renderer = Renderer::with_clock(doc, config, Box::new(clock));

    renderer.render(list(&["a", "b", "c", "d"]), &root);
    assert!(renderer.tick());
    // one slice is not enough for the whole tree
    assert_eq!(renderer.backend().inner_html(root), "");
    assert_eq!(renderer.next_deferral(), Some(Deferral::Message));

    renderer.run_until_idle();
    assert_eq!(
        renderer.backend().inner_html(root),
        "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>"
    );
}

#[test]
fn test_updater_and_stale_handles() {
    let (mut renderer, root) = setup();
    renderer.render(h("div").child(Element::component(TOGGLE)), &root);
    renderer.run_until_idle();

    let root_fiber = renderer.root(&root).unwrap();
    let div_fiber = renderer.tree().children_of(root_fiber)[0];
    let app = renderer.tree().children_of(div_fiber)[0];
    let walks = renderer.stats().walks;

    renderer.updater().request_update(app);
    renderer.updater().request_update(app);
    renderer.run_until_idle();
    // the second request found the fiber already dirty
    assert_eq!(renderer.stats().walks, walks + 1);

    renderer.render(h("div"), &root);
    renderer.run_until_idle();
    assert!(renderer.tree().fiber(app).is_none());
    assert!(matches!(renderer.update(app), Err(FiberError::StaleFiber(id)) if id == app));

    // stale requests through the channel are dropped
    renderer.updater().request_update(app);
    renderer.run_until_idle();

    let div = first_child(&renderer, root);
    assert!(matches!(renderer.root(&div), Err(FiberError::UnknownRoot)));
}

#[test]
fn test_start_transition_runs_on_scheduler() {
    let (mut renderer, root) = setup();
    renderer.start_transition(move |tree| {
        let node = tree.backend_mut().create_element("p", false);
        tree.backend_mut().insert_before(&root, &node, None);
    });
    assert_eq!(renderer.backend().inner_html(root), "");
    renderer.run_until_idle();
    assert_eq!(renderer.backend().inner_html(root), "<p></p>");
}

thread_local! {
    static GROW: RefCell<Option<SetState<i64>>> = const { RefCell::new(None) };
}

fn grow(scope: &mut Scope<'_>) -> Vec<Element> {
    let (n, set) = scope.use_state(1i64);
    GROW.with(|slot| *slot.borrow_mut() = Some(set));
    (0..n).map(|i| h("li").key(i).child(text(i))).collect()
}

#[test]
fn test_component_append_stays_before_later_siblings() {
    let (mut renderer, root) = setup();
    renderer.render(
        h("ul")
            .child(Element::component(Component::new("Grow", grow)))
            .child(h("li").key("end").child(text("end"))),
        &root,
    );
    renderer.run_until_idle();
    let ul = first_child(&renderer, root);
    assert_eq!(renderer.backend().inner_html(ul), "<li>0</li><li>end</li>");

    GROW.with(|slot| slot.borrow().as_ref().map(|set| set.set(3)));
    renderer.run_until_idle();
    assert_eq!(
        renderer.backend().inner_html(ul),
        "<li>0</li><li>1</li><li>2</li><li>end</li>"
    );
}

fn sliced_renderer() -> (Renderer<MemoryDocument>, NodeId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = MemoryDocument::new();
    let root = doc.create_container("main");
    let clock = ManualClock::with_step(Duration::from_millis(2));
    let config = RendererConfig::default()
        .with_scheduler(SchedulerConfig::default().with_slice_budget(Duration::from_millis(1)));
    (Renderer::with_clock(doc, config, Box::new(clock)), root)
}

#[test]
fn test_render_during_paused_walk_wins() {
    let (mut renderer, root) = sliced_renderer();

    renderer.render(list(&["a", "b", "c", "d"]), &root);
    assert!(renderer.tick());
    assert_eq!(renderer.backend().inner_html(root), "");

    renderer.render(list(&["x"]), &root);
    renderer.run_until_idle();

    assert_eq!(renderer.backend().inner_html(root), "<ul><li>x</li></ul>");
    assert_eq!(renderer.stats().walks, 2);
}

#[test]
fn test_renders_before_walk_starts_coalesce() {
    let (mut renderer, root) = sliced_renderer();

    renderer.render(list(&["a"]), &root);
    renderer.render(list(&["b", "c"]), &root);
    renderer.run_until_idle();

    assert_eq!(renderer.backend().inner_html(root), "<ul><li>b</li><li>c</li></ul>");
    assert_eq!(renderer.stats().walks, 1);
}

thread_local! {
    static CANVAS: RefObject = create_ref();
    static LAYOUT_SEEN: RefCell<Vec<Option<NodeId>>> = const { RefCell::new(Vec::new()) };
}

fn measured(scope: &mut Scope<'_>) -> Vec<Element> {
    let target = CANVAS.with(RefObject::clone);
    let seen = target.clone();
    scope.use_layout(Some(Vec::new()), move || {
        LAYOUT_SEEN.with(|log| log.borrow_mut().push(seen.current::<NodeId>()));
        None
    });
    vec![h("canvas").prop("width", 300i64).node_ref(target)]
}

#[test]
fn test_layout_sees_committed_node() {
    let (mut renderer, root) = setup();
    renderer.render(h("div").child(Element::component(Component::new("Measured", measured))), &root);
    renderer.run_until_idle();

    let div = first_child(&renderer, root);
    let canvas = first_child(&renderer, div);
    assert_eq!(LAYOUT_SEEN.with(|log| log.borrow().clone()), vec![Some(canvas)]);
    assert_eq!(renderer.backend().parent(canvas), Some(div));
    assert_eq!(renderer.backend().attribute(canvas, "width"), Some("300"));
}

thread_local! {
    static FROZEN_RENDERS: Cell<u32> = const { Cell::new(0) };
}

fn frozen(scope: &mut Scope<'_>) -> Vec<Element> {
    FROZEN_RENDERS.with(|n| n.set(n.get() + 1));
    let value = scope.prop("text").cloned().unwrap_or_default();
    vec![h("em").child(text(value))]
}

fn always_equal(_: &Props, _: &Props) -> bool {
    true
}

const FROZEN: Component = Component::new("Frozen", frozen).memo_with(always_equal);

#[test]
fn test_custom_memo_comparator_skips_changed_props() {
    let (mut renderer, root) = setup();
    let page = |n: i64, label: &str| {
        h("div")
            .prop("n", n)
            .child(Element::component(FROZEN).prop("text", label))
    };

    renderer.render(page(1, "a"), &root);
    renderer.run_until_idle();
    assert_eq!(FROZEN_RENDERS.with(Cell::get), 1);
    renderer.backend_mut().take_ops();

    renderer.render(page(2, "b"), &root);
    renderer.run_until_idle();

    assert_eq!(FROZEN_RENDERS.with(Cell::get), 1);
    assert_eq!(renderer.stats().memo_skips, 1);
    assert_eq!(renderer.backend().inner_html(root), "<div n=\"2\"><em>a</em></div>");
    assert!(!renderer.backend().ops().iter().any(DomOp::is_structural));
}

#[test]
fn test_config_file_and_backend_handoff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renderer.toml");
    std::fs::write(&path, "[scheduler]\nslice_budget_ms = 8.0\ncontinuation = \"timer\"\n").unwrap();

    let mut doc = MemoryDocument::new();
    let root = doc.create_container("main");
    let mut renderer = Renderer::from_config_file(doc, &path).unwrap();
    assert_eq!(renderer.scheduler().config().continuation, Deferral::Timer);

    renderer.render(h("p").child(text("kept")), &root);
    renderer.run_until_idle();
    let doc = renderer.into_backend();
    assert_eq!(doc.inner_html(root), "<p>kept</p>");

    let missing = Renderer::from_config_file(MemoryDocument::new(), dir.path().join("missing.toml"));
    assert!(matches!(missing, Err(FiberError::Config(ConfigError::Io(_)))));

    std::fs::write(&path, "[scheduler]\nslice_budget_ms = -2.0\n").unwrap();
    let invalid = Renderer::from_config_file(MemoryDocument::new(), &path);
    assert!(matches!(invalid, Err(FiberError::Config(ConfigError::Invalid { .. }))));
}
