use mapgraph_core::{
    Element, ElementId, EventCode, Graph, LifeStage, Meta, ID_ATTR,
};
use serde_json::json;

#[test]
fn inner_ids_increase_and_survive_external_edits() {
    let mut graph = Graph::new();
    let first = graph.create_node(0.0, 0.0);
    let second = graph.create_way();
    let third = graph.create_relation();
    assert!(first.inner() < second.inner());
    assert!(second.inner() < third.inner());

    graph.set_external_id(first, 4242);
    let node = graph.node(first).unwrap();
    assert_eq!(node.inner_id(), first.inner());
    assert_eq!(node.external_id(), 4242);
    assert_eq!(node.attr(ID_ATTR), Some("4242"));
}

#[test]
fn placeholders_are_negative_and_decreasing() {
    let mut graph = Graph::new();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(0.0, 0.0);
    let a_id = graph.node(a).unwrap().external_id();
    let b_id = graph.node(b).unwrap().external_id();
    assert!(a_id < 0);
    assert!(b_id < a_id);
}

#[test]
fn supplied_placeholder_pushes_bound_below_it() {
    let mut graph = Graph::new();
    let loaded = graph.create_way_with_id(-5_000_000);
    let fresh = graph.create_way();
    assert_eq!(graph.way(loaded).unwrap().external_id(), -5_000_000);
    assert!(graph.way(fresh).unwrap().external_id() < -5_000_000);
}

#[test]
fn id_attribute_is_read_only_through_the_core() {
    let mut graph = Graph::new();
    let node = graph.create_node_with_id(15, 0.0, 0.0);
    let core = graph.core_mut(node).unwrap();
    assert!(!core.set_attr(ID_ATTR, "16"));
    assert!(core.set_attr("version", "3"));
    assert_eq!(graph.node(node).unwrap().attr(ID_ATTR), Some("15"));
    assert_eq!(graph.node(node).unwrap().attr("version"), Some("3"));
}

#[test]
fn tags_are_plain_string_pairs() {
    let mut graph = Graph::new();
    let way = graph.create_way();
    let core = graph.core_mut(way).unwrap();
    core.set_tag("highway", "residential");
    core.set_tag("name", "Main");
    core.set_tag("name", "High");
    assert_eq!(core.remove_tag("highway").as_deref(), Some("residential"));

    let way = graph.way(way).unwrap();
    assert_eq!(way.tag("name"), Some("High"));
    assert_eq!(way.tag("highway"), None);
    assert_eq!(way.core().tags().len(), 1);
}

#[test]
fn lifestage_follows_destroy() {
    let mut graph = Graph::new();
    let relation = graph.create_relation();
    assert_eq!(graph.lifestage(relation), Some(LifeStage::Alive));
    graph.destroy(relation);
    assert_eq!(graph.lifestage(relation), Some(LifeStage::Dead));
    assert!(graph.relation(relation).is_none());
    assert_eq!(
        serde_json::to_value(LifeStage::Dying).unwrap(),
        json!("dying")
    );
}

#[test]
fn element_ids_serialize_with_kind_tag() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let element = ElementId::from(node);

    let value = serde_json::to_value(element).unwrap();
    assert_eq!(value, json!({ "kind": "node", "id": node.inner() }));
    let back: ElementId = serde_json::from_value(value).unwrap();
    assert_eq!(back, element);
    assert_eq!(element.to_string(), format!("node#{}", node.inner()));
}

#[test]
fn meta_serializes_with_snake_case_codes() {
    let mut graph = Graph::new();
    let way = graph.create_way();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(0.0, 0.0);
    graph.push_node(way, a);
    graph.push_node(way, b);

    let meta = Meta::new(EventCode::NodeAddedBack)
        .with_subject(b)
        .with_neighbours(Some(a.into()), None)
        .at(1);
    let value = serde_json::to_value(meta).unwrap();
    assert_eq!(value["code"], json!("node_added_back"));
    assert_eq!(value["subject"], json!({ "kind": "node", "id": b.inner() }));
    assert_eq!(value["next"], json!(null));
    assert_eq!(value["pos"], json!(1));
    assert_eq!(serde_json::from_value::<Meta>(value).unwrap(), meta);
}
