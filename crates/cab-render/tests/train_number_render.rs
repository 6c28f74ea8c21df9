//! Integration tests: train-number fixture through layout, diff passes,
//! SVG output and hit testing.

use cab_core::*;
use cab_render::*;
use kurbo::Size;
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("../../cab-core/tests/fixtures/train_number.json");

struct Scene {
    tree: ActionTree,
    config: LayoutConfig,
    rules: PlacementRules,
    renderer: DiffRenderer,
}

impl Scene {
    fn load() -> Self {
        let mut tree = build_tree_from_str(FIXTURE, TreeSchema::TrainNumber).unwrap();
        let config = LayoutConfig::train_number_actions();
        let rules = PlacementRules::train_number_actions();
        let mut renderer = DiffRenderer::new(
            LinkStyle::train_number_actions(),
            Size::new(f64::from(config.base_width), f64::from(config.base_height)),
            Easing::Linear,
        );
        let layout = layout_tree(&mut tree, &config, &rules);
        let root = tree.root;
        renderer.update(&mut tree, &layout, root, 0.0, 200.0);
        Self {
            tree,
            config,
            rules,
            renderer,
        }
    }

    fn toggle(&mut self, order: usize, now_ms: f64) -> KeyDiff {
        let idx = self.tree.index_of(NodeId::from_order(order)).unwrap();
        assert!(self.tree.toggle(idx));
        let layout = layout_tree(&mut self.tree, &self.config, &self.rules);
        self.renderer
            .update(&mut self.tree, &layout, idx, now_ms, 200.0)
    }
}

fn link_ids(frame: &Frame) -> Vec<usize> {
    frame.links.iter().map(|l| l.id.order()).collect()
}

#[test]
fn first_pass_draws_every_node_and_filtered_links() {
    let scene = Scene::load();
    let frame = scene.renderer.frame(1000.0);

    assert_eq!(frame.nodes.len(), 11);
    assert!(frame.nodes.iter().all(|n| n.opacity == 1.0));
    // Links hang off the train number and the line events only.
    assert_eq!(link_ids(&frame), vec![1, 3, 4, 5, 7, 8, 9]);

    let svg = render_svg(&frame, &scene.tree, None, &SvgTheme::light());
    assert_eq!(svg.matches("transform=\"translate(").count(), 11);
    assert_eq!(svg.matches("<path data-node=").count(), 7);
    // Actions 11 and 14 open complex actions.
    assert_eq!(svg.matches("cursor=\"pointer\"").count(), 2);
}

#[test]
fn collapsing_a_line_event_exits_its_actions() {
    let mut scene = Scene::load();
    let diff = scene.toggle(6, 1000.0);

    let exiting: Vec<usize> = diff.exiting.iter().map(|id| id.order()).collect();
    assert_eq!(exiting, vec![7, 8, 9]);
    assert_eq!(diff.updating.len(), 8);
    assert!(diff.entering.is_empty());

    let mid = scene.renderer.frame(1100.0);
    assert_eq!(mid.nodes.len(), 11);
    assert_eq!(
        mid.nodes.iter().filter(|n| n.phase == Phase::Exiting).count(),
        3
    );

    let pruned: Vec<usize> = scene
        .renderer
        .prune(1200.0)
        .into_iter()
        .map(NodeId::order)
        .collect();
    assert_eq!(pruned, vec![7, 8, 9]);
    let after = scene.renderer.frame(1200.0);
    assert_eq!(after.nodes.len(), 8);
    assert_eq!(link_ids(&after), vec![1, 3, 4, 5]);
}

#[test]
fn expanding_again_grows_out_of_the_line_event() {
    let mut scene = Scene::load();
    scene.toggle(6, 1000.0);
    scene.renderer.prune(1200.0);

    let diff = scene.toggle(6, 2000.0);
    let entering: Vec<usize> = diff.entering.iter().map(|id| id.order()).collect();
    assert_eq!(entering, vec![7, 8, 9]);

    let event = scene.tree.index_of(NodeId::from_order(6)).unwrap();
    let (ex, ey) = scene.tree.node(event).position.current();
    let start = scene.renderer.frame(2000.0);
    let action = start.node(NodeId::from_order(7)).unwrap();
    assert_eq!(action.opacity, 0.0);
    assert_eq!(
        (action.center.x, action.center.y),
        (f64::from(ex), f64::from(ey))
    );
}

#[test]
fn hit_test_finds_attached_actions() {
    let scene = Scene::load();
    let frame = scene.renderer.frame(1000.0);

    for order in [3, 4, 7, 8, 9] {
        let idx = scene.tree.index_of(NodeId::from_order(order)).unwrap();
        let (x, y) = scene.tree.node(idx).position.current();
        assert_eq!(
            hit_test(&frame, f64::from(x), f64::from(y)),
            Some(NodeId::from_order(order)),
            "action {order}"
        );
    }
}
