//! Scenario tests for the conversation facade: adjacency after edits,
//! context rollover, the typing indicator lifecycle and scroll anchoring.

use chatlayout::model::{LayoutError, Message, MessageId, SenderId};
use chatlayout::view_state::{
    AnchorState, CacheConfig, CancellationToken, CellMeasurer, Change, ConversationView, ItemKind,
    LayoutContext, LayoutEngine, LayoutStyle, ScrollAnchor, ScrollCommand,
};
use chrono::{DateTime, TimeDelta, Utc};

// ===== Helpers =====

fn base_time() -> DateTime<Utc> {
    "2025-12-25T10:30:00Z".parse().expect("valid timestamp")
}

fn text(id: &str, from: &str, body: &str, minutes: i64) -> Message {
    Message::text(
        MessageId::new(id).unwrap(),
        SenderId::new(from).unwrap(),
        body,
        base_time() + TimeDelta::minutes(minutes),
    )
}

fn engine_with(width: u16, style: LayoutStyle) -> LayoutEngine<CellMeasurer> {
    LayoutEngine::new(
        CellMeasurer,
        SenderId::new("me").unwrap(),
        LayoutContext::new(width, style).unwrap(),
        CacheConfig::default(),
    )
}

fn conversation(width: u16, height: usize, messages: Vec<Message>) -> ConversationView<CellMeasurer> {
    let mut view = ConversationView::new(
        engine_with(width, LayoutStyle::default()),
        ScrollAnchor::default(),
        height,
    );
    view.load(messages);
    view
}

fn long_conversation(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            let from = if i % 2 == 0 { "alice" } else { "me" };
            text(&format!("m{i}"), from, &format!("message {i}"), i as i64)
        })
        .collect()
}

// ===== Concrete scenario =====

#[test]
fn greeting_exchange_places_avatar_label_and_scrolls_on_reply() {
    let mut view = conversation(
        300,
        40,
        vec![
            text("1", "A", "Hi", 0),
            text("2", "A", "How are you?", 1),
        ],
    );
    view.visible_items();

    let messages = view.messages().to_vec();
    let item0 = view.engine_mut().attributes_for(&messages, 0).unwrap();
    let item1 = view.engine_mut().attributes_for(&messages, 1).unwrap();
    assert_eq!(item0.kind(), ItemKind::IncomingMessage);
    assert!(item0.avatar_frame().is_some());
    assert!(item0.top_label_height() > 0);
    assert!(item1.avatar_frame().is_none());
    assert_eq!(item1.top_label_height(), 0);

    let command = view.push_message(text("3", "me", "Good, thanks!", 2));
    assert_eq!(command, Some(ScrollCommand::ToBottom { animated: true }));

    let messages = view.messages().to_vec();
    let item1 = view.engine_mut().attributes_for(&messages, 1).unwrap();
    let item2 = view.engine_mut().attributes_for(&messages, 2).unwrap();
    assert_eq!(item1.bottom_label_height(), 0);
    assert_eq!(item2.kind(), ItemKind::OutgoingMessage);
    assert!(item2.bubble_frame().x > item1.bubble_frame().x);
}

// ===== Adjacency =====

#[test]
fn same_sender_insert_moves_trailing_timestamp_under_last_item_policy() {
    let mut style = LayoutStyle::default();
    style.timestamps.first_item = false;
    style.timestamps.last_item = true;
    let mut engine = engine_with(120, style);

    let mut messages = vec![text("a", "alice", "first", 0)];
    engine.reload_data(messages.len());
    let before = engine.attributes_for(&messages, 0).unwrap();
    assert!(before.bottom_label_height() > 0, "last item carries the label");

    messages.push(text("b", "alice", "second", 1));
    engine.data_set_mutated(Change::Inserted(1)).unwrap();

    let first = engine.attributes_for(&messages, 0).unwrap();
    let second = engine.attributes_for(&messages, 1).unwrap();
    assert_eq!(first.bottom_label_height(), 0);
    assert!(second.bottom_label_height() > 0);
    assert_eq!(second.top_label_height(), 0, "same run, no sender label");
    assert!(second.avatar_frame().is_none());
}

#[test]
fn gap_beyond_threshold_labels_the_later_item() {
    let mut engine = engine_with(120, LayoutStyle::default());
    let messages = vec![
        text("a", "alice", "morning", 0),
        text("b", "alice", "afternoon", 6 * 60),
    ];
    engine.reload_data(messages.len());

    let later = engine.attributes_for(&messages, 1).unwrap();
    assert!(later.bottom_label_height() > 0);
}

#[test]
fn stale_mutation_is_rejected_without_side_effects() {
    let mut engine = engine_with(80, LayoutStyle::default());
    engine.reload_data(2);

    let err = engine.data_set_mutated(Change::Removed(5)).unwrap_err();
    assert_eq!(err, LayoutError::StaleIndex { index: 5, count: 2 });
    assert_eq!(engine.item_count(), 2);
}

// ===== Context rollover =====

#[test]
fn width_change_never_serves_pre_change_values() {
    let messages = long_conversation(20);
    let mut engine = engine_with(80, LayoutStyle::default());
    engine.reload_data(messages.len());
    for index in 0..messages.len() {
        engine.attributes_for(&messages, index).unwrap();
    }
    let generation = engine.context().generation();
    let misses = engine.stats().cache.misses;

    engine.on_container_resized(140).unwrap();

    assert!(engine.context().generation() > generation);
    for index in 0..messages.len() {
        let attributes = engine.attributes_for(&messages, index).unwrap();
        assert_eq!(attributes.size().width, 140);
    }
    assert_eq!(engine.stats().cache.misses, misses + messages.len() as u64);
}

#[test]
fn equal_context_is_a_no_op() {
    let mut engine = engine_with(80, LayoutStyle::default());
    let generation = engine.context().generation();

    engine.on_container_resized(80).unwrap();
    engine.on_style_changed(LayoutStyle::default()).unwrap();

    assert_eq!(engine.context().generation(), generation);
}

#[test]
fn invalid_context_keeps_previous_one() {
    let mut engine = engine_with(80, LayoutStyle::default());
    let mut style = LayoutStyle::default();
    style.bubble.max_width_percent = 0;

    assert!(matches!(
        engine.on_style_changed(style),
        Err(LayoutError::ContextInvalid(_))
    ));
    assert!(engine.on_container_resized(0).is_err());
    assert_eq!(engine.context().container_width(), 80);
}

// ===== Typing indicator lifecycle =====

#[test]
fn typing_show_then_hide_restores_items() {
    let mut view = conversation(100, 30, long_conversation(6));
    let messages = view.messages().to_vec();
    let before: Vec<_> = (0..messages.len())
        .map(|i| view.engine_mut().attributes_for(&messages, i).unwrap())
        .collect();
    let count = view.engine().item_count();

    view.set_typing(true);
    assert_eq!(view.engine().item_count(), count + 1);
    let typing = view
        .engine_mut()
        .attributes_for(&messages, count)
        .expect("typing indicator occupies the trailing slot");
    assert_eq!(typing.kind(), ItemKind::TypingIndicator);
    assert!(typing.z_index() > before[0].z_index());

    view.set_typing(false);
    assert_eq!(view.engine().item_count(), count);
    let after: Vec<_> = (0..messages.len())
        .map(|i| view.engine_mut().attributes_for(&messages, i).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn showing_typing_at_bottom_scrolls_animated() {
    let mut view = conversation(100, 10, long_conversation(40));
    view.visible_items();

    let command = view.set_typing(true);

    assert_eq!(command, Some(ScrollCommand::ToBottom { animated: true }));
}

// ===== Scroll anchoring =====

#[test]
fn append_at_bottom_scrolls_to_bottom() {
    let mut view = conversation(100, 20, long_conversation(300));
    view.visible_items();
    assert_eq!(view.anchor().state(), AnchorState::Tracking);

    let command = view.push_message(text("new", "alice", "fresh", 400));
    view.visible_items();

    assert!(matches!(command, Some(ScrollCommand::ToBottom { .. })));
    let viewport = view.viewport();
    assert_eq!(viewport.offset, viewport.bottom_offset());
}

#[test]
fn append_far_above_bottom_leaves_viewport_alone() {
    let mut view = conversation(100, 20, long_conversation(300));
    view.visible_items();
    view.scroll_by(-500);
    view.visible_items();
    let offset = view.scroll_offset();
    assert_eq!(view.anchor().state(), AnchorState::Free);

    let command = view.push_message(text("new", "alice", "fresh", 400));

    assert_eq!(command, None);
    assert_eq!(view.scroll_offset(), offset);
}

#[test]
fn returning_to_bottom_resumes_tracking() {
    let mut view = conversation(100, 20, long_conversation(300));
    view.visible_items();
    view.scroll_by(-500);
    assert_eq!(view.anchor().state(), AnchorState::Free);

    view.scroll_to_bottom();

    assert_eq!(view.anchor().state(), AnchorState::Tracking);
    assert!(view.push_message(text("new", "me", "back", 400)).is_some());
}

#[test]
fn disabled_auto_scroll_never_follows() {
    let mut view = ConversationView::new(
        engine_with(100, LayoutStyle::default()),
        ScrollAnchor::new(false, 1),
        20,
    );
    view.load(long_conversation(50));
    view.visible_items();
    let offset = view.scroll_offset();
    assert!(view.viewport().is_at_bottom(0));

    assert_eq!(view.push_message(text("new", "alice", "quiet", 100)), None);
    view.visible_items();
    assert_eq!(view.scroll_offset(), offset);

    assert_eq!(view.set_typing(true), None);
    view.visible_items();
    assert_eq!(view.scroll_offset(), offset);
}

// ===== Reading position =====

fn on_screen(view: &mut ConversationView<CellMeasurer>) -> Vec<(String, isize)> {
    view.visible_items()
        .iter()
        .filter_map(|item| item.message.map(|m| (m.id().as_str().to_string(), item.y)))
        .collect()
}

#[test]
fn adopting_prefetched_heights_keeps_the_reading_position() {
    let mut view = conversation(100, 20, long_conversation(300));
    view.visible_items();
    view.scroll_by(-500);
    let before = on_screen(&mut view);

    let lookahead = 32;
    let job = view.prefetch_job(lookahead);
    let outcome = job.run(&CellMeasurer, &CancellationToken::default());
    assert!(outcome.merged);
    let visible = view.engine().visible_range();
    let range = visible.start.saturating_sub(lookahead)..visible.end + lookahead;
    assert!(view.adopt_prefetched(range) > 0);

    assert_eq!(on_screen(&mut view), before);
}

#[test]
fn inserting_above_a_scrolled_away_viewport_keeps_items_in_place() {
    let mut view = conversation(100, 20, long_conversation(300));
    view.visible_items();
    view.scroll_by(-500);
    let before = on_screen(&mut view);

    view.insert_message(10, text("late", "bob", "arrived late", 10))
        .unwrap();
    view.remove_message(0).unwrap();

    assert_eq!(on_screen(&mut view), before);
}
