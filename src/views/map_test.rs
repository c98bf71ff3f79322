use std::time::Duration;

use projection::geo::{Bounds, LatLon};

use super::*;
use crate::app::test_helpers::{PLAYER_ID, logged_in_harness, object};
use crate::events::GameObjectActionDone;

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn objects() -> Vec<GameObject> {
    let mut hidden = object(21, 52.001, 13.0, "chest");
    hidden.attributes.isonmap = false;
    vec![object(PLAYER_ID, 52.0, 13.0, "avatar"), object(20, 52.001, 13.001, "apple"), hidden]
}

fn count(calls: &[String], prefix: &str) -> usize {
    calls.iter().filter(|call| call.starts_with(prefix)).count()
}

#[tokio::test]
async fn inactive_map_draws_nothing() {
    let harness = logged_in_harness(objects()).await;
    harness.app.sync().update_game_objects().await;
    assert!(harness.map.take().is_empty());
    assert!(harness.app.map().marker_ids().is_empty());
}

#[tokio::test]
async fn activation_draws_on_map_objects_and_own_player() {
    let harness = logged_in_harness(objects()).await;

    harness.app.map().activate().await;

    let calls = harness.map.take();
    assert_eq!(calls[0], "visible:true");
    assert!(calls.contains(&"add:7:img://7/avatar".to_owned()));
    assert!(calls.contains(&"add:20:img://20/apple".to_owned()));
    assert_eq!(count(&calls, "add:21"), 0);
    assert_eq!(harness.app.map().marker_ids(), vec![7, 20]);
}

#[tokio::test]
async fn unchanged_icons_are_moved_not_recreated() {
    let harness = logged_in_harness(objects()).await;
    harness.app.map().activate().await;
    harness.map.take();

    harness.app.sync().update_game_objects().await;

    let calls = harness.map.take();
    assert_eq!(count(&calls, "add:"), 0);
    assert_eq!(count(&calls, "remove:"), 0);
    assert_eq!(count(&calls, "move:"), 2);
}

#[tokio::test]
async fn changed_icon_recreates_marker() {
    let harness = logged_in_harness(objects()).await;
    harness.app.map().activate().await;
    harness.map.take();

    let mut updated = objects();
    updated[1].attributes.image = Some("pear".into());
    harness.api.set_objects(updated);
    harness.app.sync().update_game_objects().await;

    let calls = harness.map.take();
    let remove = calls.iter().position(|call| call == "remove:20").unwrap();
    let add = calls.iter().position(|call| call == "add:20:img://20/pear").unwrap();
    assert!(remove < add);
    assert_eq!(harness.app.map().marker_ids(), vec![7, 20]);
}

#[tokio::test]
async fn vanished_or_hidden_objects_lose_their_marker() {
    let harness = logged_in_harness(objects()).await;
    harness.app.map().activate().await;
    harness.map.take();

    let mut updated = objects();
    updated[1].attributes.isonmap = false;
    harness.api.set_objects(updated);
    harness.app.sync().update_game_objects().await;
    assert!(harness.map.take().contains(&"remove:20".to_owned()));

    harness.api.set_objects(vec![object(PLAYER_ID, 52.0, 13.0, "avatar")]);
    harness.app.sync().update_game_objects().await;
    assert_eq!(harness.app.map().marker_ids(), vec![7]);
}

#[tokio::test]
async fn first_fix_centers_the_map_once() {
    let harness = logged_in_harness(objects()).await;
    harness.app.map().activate().await;
    assert_eq!(count(&harness.map.take(), "center:"), 0);

    harness.fix(52.0, 13.0);
    harness.fix(52.1, 13.1);

    let calls = harness.map.take();
    assert_eq!(count(&calls, "center:"), 1);
    assert!(calls.contains(&"center:52,13".to_owned()));
}

#[tokio::test]
async fn viewport_changes_feed_bounds_only_while_active() {
    let harness = logged_in_harness(objects()).await;
    let bounds = Bounds::new(LatLon::new(51.9, 12.9), LatLon::new(52.1, 13.1));

    harness.app.map().on_viewport_changed(bounds);
    assert_eq!(harness.app.sync().query_bounds(), None);

    harness.app.map().activate().await;
    let lists_before = harness.api.calls.lock().unwrap().len();
    harness.app.map().on_viewport_changed(bounds);
    assert_eq!(harness.app.sync().query_bounds(), Some(bounds));
    wait_for(|| harness.api.calls.lock().unwrap().len() > lists_before).await;
}

#[tokio::test]
async fn action_results_reach_the_originating_view_only() {
    let harness = logged_in_harness(objects()).await;
    harness.app.map().activate().await;
    harness.map.take();

    harness.app.bus().publish(&GameObjectActionDone {
        origin: Some(ViewKind::Ar),
        action: GameAction::Collect,
        object_id: 20,
        data: serde_json::json!({"message": "not for the map"}),
    });
    assert_eq!(count(&harness.map.take(), "message:"), 0);

    harness.app.map().on_marker_action(20, GameAction::Collect);
    wait_for(|| harness.map.calls.lock().unwrap().contains(&"message:collect done".to_owned())).await;
}

#[tokio::test]
async fn deactivated_map_stops_drawing() {
    let harness = logged_in_harness(objects()).await;
    harness.app.map().activate().await;
    harness.app.map().deactivate();
    assert!(!harness.app.map().is_active());
    assert_eq!(harness.map.take().last().map(String::as_str), Some("visible:false"));

    harness.app.sync().update_game_objects().await;
    assert!(harness.map.take().is_empty());
}
