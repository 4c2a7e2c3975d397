//! End-to-end layout of small box trees.

use std::sync::Arc;

use quire_layout::{LayoutEngine, LayoutError, Viewport};
use quire_style::{
    AutoLength, Clear, ComputedStyle, DisplayValue, FloatMode, JustifyContent, LengthValue,
    Position, TableSection, TextAlign,
};
use quire_tree::{CustomData, LayoutNode, LayoutTree, NodeId, Rect};

const EPSILON: f32 = 0.01;

fn styled(display: DisplayValue, configure: impl FnOnce(&mut ComputedStyle)) -> Arc<ComputedStyle> {
    let mut style = ComputedStyle::with_display(display);
    configure(&mut style);
    Arc::new(style)
}

fn block(configure: impl FnOnce(&mut ComputedStyle)) -> Arc<ComputedStyle> {
    styled(DisplayValue::block(), configure)
}

fn text(content: &str) -> LayoutNode {
    LayoutNode::text(content, Arc::new(ComputedStyle::inline()))
}

fn new_tree() -> LayoutTree {
    LayoutTree::new(LayoutNode::element("body", block(|_| {})))
}

fn layout(tree: &mut LayoutTree) {
    let _ = LayoutEngine::new()
        .layout_tree(tree, Viewport::new(800.0, 600.0), None)
        .expect("layout succeeds");
}

fn border_box(tree: &LayoutTree, id: NodeId) -> Rect {
    tree.get(id).expect("node exists").geometry.border_box()
}

fn content(tree: &LayoutTree, id: NodeId) -> Rect {
    tree.get(id).expect("node exists").geometry.content
}

// ---------------------------------------------------------------------------
// Block flow
//
// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
// ---------------------------------------------------------------------------

#[test]
fn test_auto_margins_center_a_sized_block() {
    let mut tree = new_tree();
    let root = tree.root();
    let centered = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.width = AutoLength::px(200.0);
                s.margin_left = AutoLength::Auto;
                s.margin_right = AutoLength::Auto;
            }),
        ),
    );
    layout(&mut tree);

    let rect = content(&tree, centered);
    assert_eq!(rect.x, 300.0);
    assert_eq!(rect.width, 200.0);
    let geometry = &tree.get(centered).unwrap().geometry;
    assert_eq!(geometry.margin.left, 300.0);
    assert_eq!(geometry.margin.right, 300.0);
}

#[test]
fn test_sibling_margins_collapse() {
    let mut tree = new_tree();
    let root = tree.root();
    let first = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.height = AutoLength::px(10.0);
                s.margin_bottom = AutoLength::px(20.0);
            }),
        ),
    );
    let second = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.height = AutoLength::px(10.0);
                s.margin_top = AutoLength::px(30.0);
            }),
        ),
    );
    layout(&mut tree);

    assert_eq!(border_box(&tree, first).y, 0.0);
    assert_eq!(border_box(&tree, second).y, 40.0);
}

#[test]
fn test_first_child_margins_collapse_through_nesting() {
    let mut tree = new_tree();
    let root = tree.root();
    let outer = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.margin_top = AutoLength::px(10.0))),
    );
    let middle = tree.append_child(
        outer,
        LayoutNode::element("div", block(|s| s.margin_top = AutoLength::px(20.0))),
    );
    let inner = tree.append_child(
        middle,
        LayoutNode::element(
            "div",
            block(|s| {
                s.margin_top = AutoLength::px(30.0);
                s.height = AutoLength::px(10.0);
            }),
        ),
    );
    layout(&mut tree);

    // One 30px margin above all three boxes, not 10 + 20 + 30.
    for id in [outer, middle, inner] {
        assert_eq!(border_box(&tree, id).y, 30.0, "{id}");
    }
    assert_eq!(border_box(&tree, outer).height, 10.0);
}

#[test]
fn test_padding_stops_first_child_collapse() {
    let mut tree = new_tree();
    let root = tree.root();
    let outer = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.margin_top = AutoLength::px(10.0))),
    );
    let padded = tree.append_child(
        outer,
        LayoutNode::element(
            "div",
            block(|s| {
                s.margin_top = AutoLength::px(20.0);
                s.padding_top = LengthValue::Px(1.0);
            }),
        ),
    );
    let inner = tree.append_child(
        padded,
        LayoutNode::element(
            "div",
            block(|s| {
                s.margin_top = AutoLength::px(30.0);
                s.height = AutoLength::px(10.0);
            }),
        ),
    );
    layout(&mut tree);

    assert_eq!(border_box(&tree, outer).y, 20.0);
    assert_eq!(border_box(&tree, padded).y, 20.0);
    assert_eq!(border_box(&tree, inner).y, 51.0);
}

#[test]
fn test_relative_offset_moves_only_the_box() {
    let mut tree = new_tree();
    let root = tree.root();
    let moved = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.height = AutoLength::px(10.0);
                s.position = Position::Relative;
                s.top = AutoLength::px(5.0);
                s.left = AutoLength::px(7.0);
            }),
        ),
    );
    let next = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(10.0))),
    );
    layout(&mut tree);

    let rect = border_box(&tree, moved);
    assert_eq!((rect.x, rect.y), (7.0, 5.0));
    assert_eq!(border_box(&tree, next).y, 10.0);
}

#[test]
fn test_image_keeps_aspect_ratio() {
    let mut tree = new_tree();
    let root = tree.root();
    let image = tree.append_child(
        root,
        LayoutNode::element("img", block(|s| s.width = AutoLength::px(100.0))).with_custom_data(
            CustomData::Image {
                width: 200.0,
                height: 50.0,
                source: Some("logo.png".to_string()),
            },
        ),
    );
    layout(&mut tree);

    let rect = content(&tree, image);
    assert_eq!(rect.width, 100.0);
    assert_eq!(rect.height, 25.0);
}

// ---------------------------------------------------------------------------
// Inline flow
//
// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
// ---------------------------------------------------------------------------

#[test]
fn test_inline_children_wrap_in_document_order() {
    let mut tree = new_tree();
    let root = tree.root();
    let paragraph = tree.append_child(
        root,
        LayoutNode::element("p", block(|s| s.width = AutoLength::px(100.0))),
    );
    let first = tree.append_child(paragraph, text("aaaa bbbb"));
    let _ = tree.append_child(paragraph, text(" cccc dddd"));
    layout(&mut tree);

    let lines = &tree.get(paragraph).unwrap().line_boxes;
    assert!(lines.len() >= 2, "expected a wrap, got {} lines", lines.len());
    for pair in lines.windows(2) {
        assert!(pair[0].bounds.y < pair[1].bounds.y);
    }
    assert_eq!(lines[0].fragments[0].source, first);
    assert!(lines.iter().all(|line| line.bounds.x.abs() < EPSILON));
}

#[test]
fn test_centered_text_splits_the_slack() {
    let mut tree = new_tree();
    let root = tree.root();
    let paragraph = tree.append_child(
        root,
        LayoutNode::element(
            "p",
            block(|s| {
                s.width = AutoLength::px(200.0);
                s.text_align = TextAlign::Center;
            }),
        ),
    );
    let _ = tree.append_child(paragraph, text("abc"));
    layout(&mut tree);

    let line = &tree.get(paragraph).unwrap().line_boxes[0];
    let fragment = line.fragments[0].bounds;
    let left_slack = fragment.x - line.bounds.x;
    let right_slack = line.bounds.right() - fragment.right();
    assert!(left_slack > 0.0);
    assert!((left_slack - right_slack).abs() < EPSILON);
}

#[test]
fn test_lines_beside_a_float_are_shortened() {
    let mut tree = new_tree();
    let root = tree.root();
    let container = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.width = AutoLength::px(300.0))),
    );
    let float = tree.append_child(
        container,
        LayoutNode::element(
            "div",
            block(|s| {
                s.float = FloatMode::Left;
                s.width = AutoLength::px(100.0);
                s.height = AutoLength::px(100.0);
            }),
        ),
    );
    let words = vec!["word"; 80].join(" ");
    let _ = tree.append_child(container, text(&words));
    layout(&mut tree);

    let float_box = border_box(&tree, float);
    assert_eq!((float_box.x, float_box.y), (0.0, 0.0));

    let lines = &tree.get(container).unwrap().line_boxes;
    assert!(lines.iter().any(|line| line.bounds.y >= 100.0));
    for line in lines {
        let start = line.fragments[0].bounds.x;
        if line.bounds.y < 100.0 {
            assert!(start >= 100.0 - EPSILON, "line at {} starts at {start}", line.bounds.y);
        } else {
            assert!(start.abs() < EPSILON, "line at {} starts at {start}", line.bounds.y);
        }
    }
}

#[test]
fn test_clear_moves_block_below_the_float() {
    let mut tree = new_tree();
    let root = tree.root();
    let float = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.float = FloatMode::Left;
                s.width = AutoLength::px(100.0);
                s.height = AutoLength::px(80.0);
            }),
        ),
    );
    let beside = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(10.0))),
    );
    let cleared = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.clear = Clear::Left;
                s.height = AutoLength::px(10.0);
            }),
        ),
    );
    layout(&mut tree);

    assert_eq!(border_box(&tree, float).bottom(), 80.0);
    assert_eq!(border_box(&tree, beside).y, 0.0);
    assert_eq!(border_box(&tree, cleared).y, 80.0);
}

// ---------------------------------------------------------------------------
// Absolute positioning
//
// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
// ---------------------------------------------------------------------------

#[test]
fn test_absolute_boxes_use_static_position_and_offsets() {
    let mut tree = new_tree();
    let root = tree.root();
    let positioned = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.position = Position::Relative;
                s.width = AutoLength::px(400.0);
                s.height = AutoLength::px(300.0);
                s.padding_top = LengthValue::Px(10.0);
                s.padding_left = LengthValue::Px(10.0);
            }),
        ),
    );
    let _ = tree.append_child(
        positioned,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(50.0))),
    );
    let at_static = tree.append_child(
        positioned,
        LayoutNode::element(
            "div",
            block(|s| {
                s.position = Position::Absolute;
                s.width = AutoLength::px(50.0);
                s.height = AutoLength::px(50.0);
            }),
        ),
    );
    let offset = tree.append_child(
        positioned,
        LayoutNode::element(
            "div",
            block(|s| {
                s.position = Position::Absolute;
                s.top = AutoLength::px(5.0);
                s.left = AutoLength::px(7.0);
                s.width = AutoLength::px(20.0);
                s.height = AutoLength::px(20.0);
            }),
        ),
    );
    let after = tree.append_child(
        positioned,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(10.0))),
    );
    layout(&mut tree);

    let rect = border_box(&tree, at_static);
    assert_eq!((rect.x, rect.y), (10.0, 60.0));
    assert_eq!((rect.width, rect.height), (50.0, 50.0));

    let padding_box = tree.get(positioned).unwrap().geometry.padding_box();
    let rect = border_box(&tree, offset);
    assert_eq!((rect.x, rect.y), (padding_box.x + 7.0, padding_box.y + 5.0));

    // Absolutely positioned boxes take no room in the flow.
    assert_eq!(border_box(&tree, after).y, 60.0);
}

#[test]
fn test_absolute_box_between_offsets_fills_the_gap() {
    let mut tree = new_tree();
    let root = tree.root();
    let stretched = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.position = Position::Absolute;
                s.left = AutoLength::px(100.0);
                s.right = AutoLength::px(100.0);
                s.top = AutoLength::px(0.0);
                s.bottom = AutoLength::px(0.0);
            }),
        ),
    );
    layout(&mut tree);

    assert_eq!(content(&tree, stretched), Rect::new(100.0, 0.0, 600.0, 600.0));
}

// ---------------------------------------------------------------------------
// Tables
//
// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
// ---------------------------------------------------------------------------

fn table_cell_with_child(tree: &mut LayoutTree, row: NodeId, child_height: f32) -> NodeId {
    let mut cell = LayoutNode::element("td", styled(DisplayValue::table_cell(), |_| {}));
    cell.text = Some("Hi".to_string());
    let cell = tree.append_child(row, cell);
    let _ = tree.append_child(
        cell,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(child_height))),
    );
    cell
}

#[test]
fn test_cell_height_is_max_of_text_and_children() {
    let mut tree = new_tree();
    let root = tree.root();
    let table = tree.append_child(
        root,
        LayoutNode::element("table", styled(DisplayValue::table(), |_| {})),
    );
    let tall_row = tree.append_child(
        table,
        LayoutNode::element("tr", styled(DisplayValue::table_row(), |_| {})),
    );
    let short_row = tree.append_child(
        table,
        LayoutNode::element("tr", styled(DisplayValue::table_row(), |_| {})),
    );
    let tall = table_cell_with_child(&mut tree, tall_row, 40.0);
    let short = table_cell_with_child(&mut tree, short_row, 5.0);
    layout(&mut tree);

    let line_height = tree.get(short).unwrap().intrinsic.line_height;
    assert!(line_height > 5.0);
    assert!((content(&tree, tall).height - 40.0).abs() < EPSILON);
    assert!((content(&tree, short).height - line_height).abs() < EPSILON);
    assert!(content(&tree, short_row).y > content(&tree, tall_row).y);
}

#[test]
fn test_header_rows_come_first() {
    let mut tree = new_tree();
    let root = tree.root();
    let table = tree.append_child(
        root,
        LayoutNode::element("table", styled(DisplayValue::table(), |_| {})),
    );
    let body = tree.append_child(
        table,
        LayoutNode::element(
            "tbody",
            styled(DisplayValue::table_row_group(TableSection::Body), |_| {}),
        ),
    );
    let head = tree.append_child(
        table,
        LayoutNode::element(
            "thead",
            styled(DisplayValue::table_row_group(TableSection::Head), |_| {}),
        ),
    );
    let mut rows = Vec::new();
    for group in [body, head] {
        let row = tree.append_child(
            group,
            LayoutNode::element("tr", styled(DisplayValue::table_row(), |_| {})),
        );
        let _ = tree.append_child(
            row,
            LayoutNode::element(
                "td",
                styled(DisplayValue::table_cell(), |s| s.height = AutoLength::px(20.0)),
            ),
        );
        rows.push(row);
    }
    layout(&mut tree);

    assert!(content(&tree, rows[1]).y < content(&tree, rows[0]).y);
    assert!(content(&tree, head).y < content(&tree, body).y);
}

#[test]
fn test_huge_colspan_is_clamped() {
    let mut tree = new_tree();
    let root = tree.root();
    let table = tree.append_child(
        root,
        LayoutNode::element(
            "table",
            styled(DisplayValue::table(), |s| s.border_spacing = LengthValue::Px(0.0)),
        ),
    );
    let row = tree.append_child(
        table,
        LayoutNode::element("tr", styled(DisplayValue::table_row(), |_| {})),
    );
    let cell = tree.append_child(
        row,
        LayoutNode::element(
            "td",
            styled(DisplayValue::table_cell(), |s| {
                s.colspan = u32::MAX;
                s.height = AutoLength::px(20.0);
            }),
        ),
    );
    layout(&mut tree);

    // A thousand empty columns share the table width.
    let rect = content(&tree, cell);
    assert!((rect.width - 800.0).abs() < 0.1, "cell width {}", rect.width);
    assert_eq!(rect.height, 20.0);
}

#[test]
fn test_nested_table_rows_do_not_widen_the_outer_table() {
    let mut tree = new_tree();
    let root = tree.root();
    let float = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.float = FloatMode::Left)),
    );
    let outer = tree.append_child(
        float,
        LayoutNode::element(
            "table",
            styled(DisplayValue::table(), |s| s.border_spacing = LengthValue::Px(50.0)),
        ),
    );
    let outer_row = tree.append_child(
        outer,
        LayoutNode::element("tr", styled(DisplayValue::table_row(), |_| {})),
    );
    let outer_cell = tree.append_child(
        outer_row,
        LayoutNode::element("td", styled(DisplayValue::table_cell(), |_| {})),
    );
    let inner = tree.append_child(
        outer_cell,
        LayoutNode::element(
            "table",
            styled(DisplayValue::table(), |s| s.border_spacing = LengthValue::Px(0.0)),
        ),
    );
    let inner_row = tree.append_child(
        inner,
        LayoutNode::element("tr", styled(DisplayValue::table_row(), |_| {})),
    );
    for _ in 0..10 {
        let _ = tree.append_child(
            inner_row,
            LayoutNode::element("td", styled(DisplayValue::table_cell(), |_| {})),
        );
    }
    layout(&mut tree);

    // Two 50px spacings around one empty column. Counting the inner row
    // with the outer spacing would give 550.
    assert!((content(&tree, float).width - 100.0).abs() < EPSILON);
}

// ---------------------------------------------------------------------------
// Flex
//
// [§ 9.7 Resolving Flexible Lengths](https://www.w3.org/TR/css-flexbox-1/#resolve-flexible-lengths)
// ---------------------------------------------------------------------------

#[test]
fn test_flex_items_grow_into_free_space() {
    let mut tree = new_tree();
    let root = tree.root();
    let container = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            styled(DisplayValue::flex(), |s| s.width = AutoLength::px(300.0)),
        ),
    );
    let items: Vec<NodeId> = (0..2)
        .map(|_| {
            tree.append_child(
                container,
                LayoutNode::element(
                    "div",
                    block(|s| {
                        s.width = AutoLength::px(50.0);
                        s.height = AutoLength::px(20.0);
                        s.flex_grow = 1.0;
                    }),
                ),
            )
        })
        .collect();
    layout(&mut tree);

    let first = border_box(&tree, items[0]);
    let second = border_box(&tree, items[1]);
    assert_eq!((first.x, first.width), (0.0, 150.0));
    assert_eq!((second.x, second.width), (150.0, 150.0));
    assert_eq!(content(&tree, container).height, 20.0);
}

#[test]
fn test_single_flex_item_is_centered() {
    let mut tree = new_tree();
    let root = tree.root();
    let container = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            styled(DisplayValue::flex(), |s| {
                s.width = AutoLength::px(300.0);
                s.justify_content = JustifyContent::SpaceAround;
            }),
        ),
    );
    let item = tree.append_child(
        container,
        LayoutNode::element(
            "div",
            block(|s| {
                s.width = AutoLength::px(100.0);
                s.height = AutoLength::px(10.0);
            }),
        ),
    );
    layout(&mut tree);

    assert_eq!(border_box(&tree, item).x, 100.0);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_grid_is_unhandled() {
    let mut tree = new_tree();
    let root = tree.root();
    let grid = tree.append_child(
        root,
        LayoutNode::element("div", styled(DisplayValue::grid(), |_| {})),
    );
    let err = LayoutEngine::new()
        .layout_tree(&mut tree, Viewport::new(800.0, 600.0), None)
        .unwrap_err();
    match err {
        LayoutError::UnhandledDisplay { node, display } => {
            assert_eq!(node, grid);
            assert_eq!(display, "grid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_display_none_subtree_has_no_geometry() {
    let mut tree = new_tree();
    let root = tree.root();
    let hidden = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            Arc::new(ComputedStyle {
                display: None,
                height: AutoLength::px(50.0),
                ..ComputedStyle::default()
            }),
        ),
    );
    let child = tree.append_child(hidden, text("invisible"));
    let next = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(10.0))),
    );
    layout(&mut tree);

    assert_eq!(content(&tree, hidden), Rect::default());
    assert_eq!(content(&tree, child), Rect::default());
    assert_eq!(border_box(&tree, next).y, 0.0);
}

#[test]
fn test_deep_tree_fails_instead_of_overflowing() {
    // Built and laid out on a thread with a fixed, ordinary stack size.
    let handle = std::thread::Builder::new()
        .stack_size(16 * 1024 * 1024)
        .spawn(|| {
            let style = block(|_| {});
            let mut tree = LayoutTree::new(LayoutNode::element("body", Arc::clone(&style)));
            let mut parent = tree.root();
            for _ in 0..100_000 {
                parent = tree.append_child(parent, LayoutNode::element("div", Arc::clone(&style)));
            }
            LayoutEngine::new()
                .layout_tree(&mut tree, Viewport::new(800.0, 600.0), None)
                .map(|_| ())
        })
        .expect("spawn layout thread");
    let err = handle.join().expect("no stack overflow").unwrap_err();
    assert!(matches!(err, LayoutError::TooDeep { limit: 512, .. }), "{err}");
}

#[test]
fn test_malformed_sizes_are_clamped() {
    let mut tree = new_tree();
    let root = tree.root();
    let broken = tree.append_child(
        root,
        LayoutNode::element(
            "div",
            block(|s| {
                s.width = AutoLength::px(f32::NAN);
                s.height = AutoLength::px(-50.0);
                s.margin_top = AutoLength::px(f32::INFINITY);
                s.padding_left = LengthValue::Px(-10.0);
                s.padding_top = LengthValue::Px(f32::NAN);
            }),
        ),
    );
    let next = tree.append_child(
        root,
        LayoutNode::element("div", block(|s| s.height = AutoLength::px(10.0))),
    );
    layout(&mut tree);

    let geometry = &tree.get(broken).unwrap().geometry;
    assert_eq!(geometry.content.width, 0.0);
    assert_eq!(geometry.content.height, 0.0);
    assert_eq!(geometry.padding.left, 0.0);
    assert_eq!(geometry.padding.top, 0.0);
    assert_eq!(geometry.margin.top, 0.0);
    assert_eq!(border_box(&tree, next).y, 0.0);
}
