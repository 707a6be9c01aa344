//! Tests for tree operations

use super::*;
use crate::models::{ImageAttachment, ManualTimeProvider, NestedNode, TimeProvider};
use crate::tree::NodeStore;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

struct Fixture {
    store: NodeStore,
    root: String,
    a: String,
    g1: String,
    g2: String,
}

/// root -> A -> (G1, G2)
fn fixture() -> Fixture {
    let mut store = NodeStore::new("Outline");
    let root = store.root_id().to_string();
    let a = store.add_child(&root).unwrap();
    let g1 = store.add_child(&a).unwrap();
    let g2 = store.add_child(&a).unwrap();
    store.update_content(&a, "A").unwrap();
    store.update_content(&g1, "G1").unwrap();
    store.update_content(&g2, "G2").unwrap();
    Fixture {
        store,
        root,
        a,
        g1,
        g2,
    }
}

fn children(store: &NodeStore, id: &str) -> Vec<String> {
    store.get(id).unwrap().children.clone()
}

fn level(store: &NodeStore, id: &str) -> usize {
    store.get(id).unwrap().level
}

#[test]
fn test_add_child_appends_empty_node() {
    let Fixture {
        mut store, root, a, ..
    } = fixture();
    let b = store.add_child(&root).unwrap();

    assert_eq!(children(&store, &root), vec![a, b.clone()]);
    let node = store.get(&b).unwrap();
    assert_eq!(node.content, "");
    assert_eq!(node.level, 1);
    assert_eq!(node.parent_id.as_deref(), Some(root.as_str()));
    store.check_integrity().unwrap();
}

#[test]
fn test_add_child_unknown_parent() {
    let Fixture { mut store, .. } = fixture();
    let before = store.snapshot();
    assert_eq!(
        store.add_child("missing"),
        Err(NodeOperationError::node_not_found("missing"))
    );
    assert!(store.matches(&before));
}

#[test]
fn test_indent_moves_under_previous_sibling() {
    let Fixture {
        mut store, a, g1, g2, ..
    } = fixture();
    store.indent(&g2).unwrap();

    assert_eq!(children(&store, &a), vec![g1.clone()]);
    assert_eq!(children(&store, &g1), vec![g2.clone()]);
    assert_eq!(level(&store, &g2), 3);
    assert_eq!(store.get(&g2).unwrap().parent_id.as_deref(), Some(g1.as_str()));
    store.check_integrity().unwrap();
}

#[test]
fn test_outdent_places_node_after_parent() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        g2,
    } = fixture();
    store.indent(&g2).unwrap();
    store.outdent(&g1).unwrap();

    assert_eq!(children(&store, &root), vec![a.clone(), g1.clone()]);
    assert!(children(&store, &a).is_empty());
    assert_eq!(level(&store, &g1), 1);
    assert_eq!(children(&store, &g1), vec![g2.clone()]);
    assert_eq!(level(&store, &g2), 2);
    store.check_integrity().unwrap();
}

#[test]
fn test_outdent_leaves_following_siblings_with_parent() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        g2,
    } = fixture();
    store.outdent(&g1).unwrap();

    assert_eq!(children(&store, &root), vec![a.clone(), g1]);
    assert_eq!(children(&store, &a), vec![g2]);
    store.check_integrity().unwrap();
}

#[test]
fn test_add_sibling_inserts_after_node() {
    let Fixture {
        mut store, a, g1, g2, ..
    } = fixture();
    let n = store.add_sibling(&g1).unwrap();

    assert_eq!(children(&store, &a), vec![g1, n.clone(), g2]);
    assert_eq!(level(&store, &n), 2);
    assert_eq!(store.get(&n).unwrap().content, "");
    store.check_integrity().unwrap();
}

#[test]
fn test_delete_removes_whole_subtree() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        g2,
    } = fixture();
    assert_eq!(store.delete_node(&a).unwrap(), 3);

    assert!(children(&store, &root).is_empty());
    for id in [&a, &g1, &g2] {
        assert!(!store.contains(id));
    }
    assert_eq!(store.len(), 1);
    store.check_integrity().unwrap();
}

#[test]
fn test_preconditions_leave_store_untouched() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        g2,
    } = fixture();
    let before = store.snapshot();

    assert_eq!(store.indent(&g1), Err(NodeOperationError::first_sibling(&g1)));
    assert_eq!(store.outdent(&a), Err(NodeOperationError::parent_is_root(&a)));
    assert_eq!(
        store.move_up(&g1),
        Err(NodeOperationError::at_boundary(&g1, "up"))
    );
    assert_eq!(
        store.move_down(&g2),
        Err(NodeOperationError::at_boundary(&g2, "down"))
    );
    assert!(matches!(
        store.delete_node(&root),
        Err(NodeOperationError::RootNotAllowed { .. })
    ));
    assert!(matches!(
        store.add_sibling(&root),
        Err(NodeOperationError::RootNotAllowed { .. })
    ));
    assert!(matches!(
        store.indent(&root),
        Err(NodeOperationError::RootNotAllowed { .. })
    ));
    assert!(matches!(
        store.indent("ghost"),
        Err(NodeOperationError::NodeNotFound { .. })
    ));

    assert!(store.matches(&before));
}

#[test]
fn test_move_up_and_down_swap_siblings() {
    let Fixture {
        mut store, a, g1, g2, ..
    } = fixture();
    store.move_down(&g1).unwrap();
    assert_eq!(children(&store, &a), vec![g2.clone(), g1.clone()]);

    store.move_up(&g1).unwrap();
    assert_eq!(children(&store, &a), vec![g1, g2]);
    store.check_integrity().unwrap();
}

#[test]
fn test_move_inside_becomes_first_child() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        g2,
    } = fixture();
    let b = store.add_child(&root).unwrap();
    store.move_node(&b, &a, Placement::Inside).unwrap();

    assert_eq!(children(&store, &a), vec![b.clone(), g1, g2]);
    assert_eq!(children(&store, &root), vec![a]);
    assert_eq!(level(&store, &b), 2);
    store.check_integrity().unwrap();
}

#[test]
fn test_move_before_and_after_recomputes_subtree_levels() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        g2,
    } = fixture();
    let b = store.add_child(&root).unwrap();
    let deep = store.add_child(&g2).unwrap();

    store.move_node(&g2, &b, Placement::After).unwrap();
    assert_eq!(children(&store, &root), vec![a.clone(), b.clone(), g2.clone()]);
    assert_eq!(level(&store, &g2), 1);
    assert_eq!(level(&store, &deep), 2);

    store.move_node(&g2, &g1, Placement::Before).unwrap();
    assert_eq!(children(&store, &a), vec![g2.clone(), g1]);
    assert_eq!(level(&store, &deep), 3);
    store.check_integrity().unwrap();
}

#[test]
fn test_move_within_same_parent() {
    let Fixture {
        mut store, a, g1, g2, ..
    } = fixture();
    let g3 = store.add_child(&a).unwrap();

    store.move_node(&g1, &g3, Placement::After).unwrap();
    assert_eq!(children(&store, &a), vec![g2.clone(), g3.clone(), g1.clone()]);

    store.move_node(&g1, &g2, Placement::Before).unwrap();
    assert_eq!(children(&store, &a), vec![g1, g2, g3]);
    store.check_integrity().unwrap();
}

#[test]
fn test_move_into_own_subtree_is_rejected() {
    let Fixture {
        mut store, a, g1, ..
    } = fixture();
    let before = store.snapshot();

    for placement in [Placement::Inside, Placement::Before, Placement::After] {
        assert_eq!(
            store.move_node(&a, &g1, placement),
            Err(NodeOperationError::move_into_own_subtree(&a, &g1))
        );
    }
    assert_eq!(
        store.move_node(&a, &a, Placement::Inside),
        Err(NodeOperationError::move_into_own_subtree(&a, &a))
    );
    assert!(store.matches(&before));
}

#[test]
fn test_move_beside_root_is_rejected() {
    let Fixture {
        mut store, root, g1, ..
    } = fixture();
    let before = store.snapshot();

    assert_eq!(
        store.move_node(&g1, &root, Placement::Before),
        Err(NodeOperationError::root_has_no_siblings(&root))
    );
    assert!(matches!(
        store.move_node(&root, &g1, Placement::Inside),
        Err(NodeOperationError::RootNotAllowed { .. })
    ));
    assert!(store.matches(&before));

    // Inside the root is allowed
    store.move_node(&g1, &root, Placement::Inside).unwrap();
    assert_eq!(children(&store, &root)[0], g1);
    assert_eq!(level(&store, &g1), 1);
}

#[test]
fn test_update_content_reports_changes_and_touches() {
    let clock = Arc::new(ManualTimeProvider::with_time(
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
    ));
    let mut store = NodeStore::with_clock("Doc", clock.clone());
    let root = store.root_id().to_string();
    let child = store.add_child(&root).unwrap();
    let created = store.get(&child).unwrap().updated_at;

    clock.advance(Duration::minutes(5));
    assert_eq!(store.update_content(&child, "hello"), Ok(true));
    assert_eq!(store.get(&child).unwrap().updated_at, clock.now());
    assert!(store.get(&child).unwrap().updated_at > created);

    clock.advance(Duration::minutes(5));
    assert_eq!(store.update_content(&child, "hello"), Ok(false));
    assert!(store.get(&child).unwrap().updated_at < clock.now());
}

#[test]
fn test_collapse_operations() {
    let Fixture {
        mut store,
        root,
        a,
        g1,
        ..
    } = fixture();

    assert_eq!(store.toggle_collapsed(&a), Ok(true));
    assert_eq!(store.set_collapsed(&a, true), Ok(false));
    assert_eq!(store.expand_all(), 1);

    // Only non-root nodes with children collapse
    assert_eq!(store.collapse_all(), 1);
    assert!(store.get(&a).unwrap().collapsed);
    assert!(!store.get(&g1).unwrap().collapsed);
    assert!(!store.get(&root).unwrap().collapsed);
}

#[test]
fn test_bulk_collapse_counts_changed_nodes() {
    let Fixture {
        mut store, a, g1, ..
    } = fixture();

    let flipped = |before: &NodeStore, after: &NodeStore| {
        after
            .nodes()
            .filter(|n| before.get(&n.id).unwrap().collapsed != n.collapsed)
            .count()
    };

    store.set_collapsed(&a, true).unwrap();
    store.set_collapsed(&g1, true).unwrap();
    let before = store.clone();
    assert_eq!(store.expand_all(), 2);
    assert_eq!(flipped(&before, &store), 2);
    assert_eq!(store.expand_all(), 0);

    let before = store.clone();
    let collapsed = store.collapse_all();
    assert_eq!(collapsed, flipped(&before, &store));
    assert_eq!(store.collapse_all(), 0);
}

#[test]
fn test_tags() {
    let Fixture { mut store, a, .. } = fixture();

    assert_eq!(store.add_tag(&a, "#work"), Ok(true));
    assert_eq!(store.add_tag(&a, " work "), Ok(false));
    assert_eq!(
        store.add_tag(&a, " # "),
        Err(NodeOperationError::invalid_tag(" # "))
    );
    assert_eq!(store.get(&a).unwrap().tags, vec!["work"]);
    assert_eq!(store.nodes_with_tag("work").len(), 1);

    assert_eq!(store.remove_tag(&a, "#work"), Ok(true));
    assert_eq!(store.remove_tag(&a, "work"), Ok(false));
}

#[test]
fn test_sync_hashtags_adds_missing_tags() {
    let Fixture { mut store, a, .. } = fixture();
    store.add_tag(&a, "home").unwrap();
    store
        .update_content(&a, "Call #home about #errands and #home")
        .unwrap();

    assert_eq!(store.sync_hashtags(&a), Ok(1));
    assert_eq!(store.get(&a).unwrap().tags, vec!["home", "errands"]);
    assert_eq!(store.sync_hashtags(&a), Ok(0));
}

#[test]
fn test_images() {
    let Fixture { mut store, a, .. } = fixture();
    let image = ImageAttachment::new("https://example.com/cat.png").with_name("cat");
    let image_id = image.id.clone();

    assert_eq!(store.add_image(&a, image.clone()), Ok(true));
    assert_eq!(store.add_image(&a, image), Ok(false));
    assert_eq!(store.get(&a).unwrap().images.len(), 1);

    assert_eq!(store.remove_image(&a, &image_id), Ok(true));
    assert_eq!(store.remove_image(&a, &image_id), Ok(false));
}

#[test]
fn test_replace_children_splices_new_subtrees() {
    let Fixture {
        mut store, a, g1, g2, ..
    } = fixture();
    let proposal = vec![
        NestedNode::new("Fruit").with_children(vec![NestedNode::new("G1")]),
        NestedNode::new("G2"),
    ];

    let new_children = store.replace_children(&a, &proposal).unwrap();
    assert_eq!(new_children.len(), 2);
    assert_eq!(children(&store, &a), new_children);
    assert!(!store.contains(&g1));
    assert!(!store.contains(&g2));

    let fruit = store.get(&new_children[0]).unwrap();
    assert_eq!(fruit.content, "Fruit");
    assert_eq!(fruit.level, 2);
    let grandchild = store.get(&fruit.children[0]).unwrap();
    assert_eq!(grandchild.content, "G1");
    assert_eq!(grandchild.level, 3);
    assert_eq!(store.len(), 5);
    store.check_integrity().unwrap();
}

#[test]
fn test_replace_children_regenerates_colliding_ids() {
    let Fixture {
        mut store, root, a, ..
    } = fixture();
    let mut copy = NestedNode::new("copy of A");
    copy.id = Some(a.clone());

    let new_children = store.replace_children(&root, &[copy]).unwrap();
    assert_ne!(new_children[0], a);
    assert!(!store.contains(&a));
    store.check_integrity().unwrap();
}
