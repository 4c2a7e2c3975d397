//! Layout of trees loaded from their JSON description.

use quire_layout::{LayoutEngine, Viewport};
use quire_tree::{LayoutTree, NodeId, TreeDescription, dump};

fn load(json: &str) -> LayoutTree {
    TreeDescription::from_json(json)
        .expect("valid json")
        .into_tree()
        .expect("valid tree")
}

#[test]
fn test_padded_paragraphs_stack() {
    let mut tree = load(
        r#"{
            "tag": "body",
            "style": { "display": "block", "padding-top": "8px", "padding-left": "8px" },
            "children": [
                { "tag": "h1", "style": { "display": "block", "height": 40, "margin-bottom": "10px" } },
                { "tag": "p", "style": { "display": "block", "margin-top": "0.5em" },
                  "children": [ { "text": "Hello" } ] }
            ]
        }"#,
    );
    let _ = LayoutEngine::new()
        .layout_tree(&mut tree, Viewport::new(400.0, 300.0), None)
        .expect("layout succeeds");

    let root = tree.root();
    let heading = tree.children(root)[0];
    let paragraph = tree.children(root)[1];

    let heading_box = tree.get(heading).unwrap().geometry.border_box();
    assert_eq!((heading_box.x, heading_box.y), (8.0, 8.0));
    assert_eq!(heading_box.width, 392.0);

    // 10px and 8px (0.5em of 16px) collapse to 10px.
    let paragraph_node = tree.get(paragraph).unwrap();
    assert_eq!(paragraph_node.geometry.border_box().y, 58.0);
    assert_eq!(paragraph_node.line_boxes.len(), 1);
}

#[test]
fn test_image_description_is_replaced() {
    let mut tree = load(
        r#"{
            "tag": "body",
            "style": { "display": "block" },
            "children": [
                { "tag": "img", "style": { "display": "block", "height": "30px" },
                  "custom": { "type": "image", "width": 120, "height": 60 } }
            ]
        }"#,
    );
    let _ = LayoutEngine::new()
        .layout_tree(&mut tree, Viewport::new(400.0, 300.0), None)
        .expect("layout succeeds");

    let image = tree.get(NodeId(1)).unwrap();
    assert_eq!(image.geometry.content.width, 60.0);
    assert_eq!(image.geometry.content.height, 30.0);
}

#[test]
fn test_snapshot_mirrors_the_tree() {
    let mut tree = load(
        r#"{
            "tag": "body",
            "style": { "display": "block" },
            "children": [
                { "tag": "div", "style": { "display": "block", "height": 20 } },
                { "tag": "div", "style": { "display": "none" } }
            ]
        }"#,
    );
    let _ = LayoutEngine::new()
        .layout_tree(&mut tree, Viewport::new(200.0, 100.0), None)
        .expect("layout succeeds");

    let snapshot = dump::snapshot(&tree, tree.root()).expect("root exists");
    assert_eq!(snapshot.label, "body");
    assert_eq!(snapshot.children.len(), 2);
    assert_eq!(snapshot.children[0].border_box.height, 20.0);

    let json = serde_json::to_value(&snapshot).expect("serializable");
    assert_eq!(json["children"][0]["label"], "div");

    let mut text = String::new();
    dump::dump(&tree, tree.root(), &mut text).expect("writes to a string");
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(2).unwrap().contains("[none]"));
}
