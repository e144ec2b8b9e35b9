// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end editor scenarios driven through the recording host.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Point;
use ridgeline_canvas::{CanvasHost, CanvasOp, DrawOp, Event, RecordHost};
use ridgeline_editor::{Action, Key, KeyEvent, Modifiers, MouseButton, RenderContext};
use ridgeline_geom::{Box3, Vec3};
use ridgeline_map::{
    InsertNodeOptions, MapEvent, Mapper, NodeRef, NodeRole, meters_to_units, units_to_meters,
};
use ridgeline_store::MemoryStore;

fn editor(host: &mut RecordHost) -> RenderContext {
    let display = host.create_canvas(800, 600);
    let mapper = Mapper::new(Box::new(MemoryStore::new()));
    RenderContext::new(mapper, display, 800.0, 600.0)
}

fn everything() -> Box3 {
    Box3::new(
        Vec3::new(-100_000.0, -100_000.0, 0.0),
        Vec3::new(100_000.0, 100_000.0, 0.0),
    )
}

/// Switches the default add brush from water to grass.
fn pick_grass(ctx: &mut RenderContext) {
    ctx.key_down(KeyEvent::new(Key::Char('q'), Modifiers::NONE))
        .unwrap();
    ctx.wheel(1.0).unwrap();
    ctx.key_up(Key::Char('q'));
    assert_eq!(ctx.brush().type_key(), Some("grass"));
}

/// Paints the scenario stroke: grass, size 1, from (100,100) to (200,100).
fn paint_stroke(ctx: &mut RenderContext) {
    pick_grass(ctx);
    ctx.mouse_down(MouseButton::Left, Point::new(100.0, 100.0), Modifiers::NONE)
        .unwrap();
    ctx.mouse_move(Point::new(150.0, 100.0)).unwrap();
    ctx.mouse_move(Point::new(200.0, 100.0)).unwrap();
    ctx.mouse_up(MouseButton::Left, Point::new(200.0, 100.0))
        .unwrap();
}

fn sole_object(ctx: &RenderContext) -> NodeRef {
    let objects = ctx
        .mapper()
        .object_nodes_touching_area(everything(), 0.0)
        .unwrap();
    assert_eq!(objects.len(), 1, "expected exactly one object node");
    objects[0]
}

#[test]
fn paint_then_undo_leaves_nothing() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);

    let parent = sole_object(&ctx);
    let children = ctx.mapper_mut().node_children(parent).unwrap();
    assert!(children.len() >= 2, "a stroke places at least two children");
    assert!(
        ctx.mapper().radius(parent).unwrap() >= ctx.pixels_to_units(15.0),
        "the parent grew to cover the stroke"
    );

    ctx.key_down(KeyEvent::new(Key::Char('z'), Modifiers::CTRL))
        .unwrap();

    assert!(
        ctx.mapper()
            .object_nodes_touching_area(everything(), 0.0)
            .unwrap()
            .is_empty(),
        "undo must remove the object"
    );
    for child in children {
        assert!(!ctx.mapper().node_valid(child).unwrap());
        assert!(
            ctx.mapper_mut().node_edges(child).unwrap().is_empty(),
            "no stroke edge may survive the undo"
        );
    }
}

#[test]
fn redo_restores_the_stroke() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);
    let parent = sole_object(&ctx);

    ctx.key_down(KeyEvent::new(Key::Char('z'), Modifiers::CTRL))
        .unwrap();
    assert!(!ctx.mapper().node_valid(parent).unwrap());

    ctx.key_down(KeyEvent::new(Key::Char('y'), Modifiers::CTRL))
        .unwrap();
    assert!(ctx.mapper().node_valid(parent).unwrap());
    assert!(!ctx.mapper_mut().node_children(parent).unwrap().is_empty());
}

#[test]
fn peg_overlay_reports_the_distance() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    // Map points 100 m and 200 m out: 1 unit is 2 m, and the default
    // zoom is pixel-per-unit, so the canvas points are the unit values.
    let first = Point::new(meters_to_units(100.0), meters_to_units(100.0));
    let second = Point::new(meters_to_units(100.0), meters_to_units(200.0));

    ctx.key_down(KeyEvent::new(Key::Char('1'), Modifiers::NONE))
        .unwrap();
    ctx.mouse_down(MouseButton::Left, first, Modifiers::NONE)
        .unwrap();
    ctx.mouse_up(MouseButton::Left, first).unwrap();
    ctx.key_down(KeyEvent::new(Key::Char('2'), Modifiers::NONE))
        .unwrap();
    ctx.mouse_down(MouseButton::Left, second, Modifiers::NONE)
        .unwrap();
    ctx.mouse_up(MouseButton::Left, second).unwrap();

    let pegs = ctx.pegs();
    let distance = units_to_meters((pegs[1].unwrap() - pegs[0].unwrap()).length());
    assert_eq!(distance, 100.0);

    ctx.redraw_tick(&mut host).unwrap();
    let reported = host.events().iter().any(|event| {
        matches!(
            event,
            Event::Op {
                op: CanvasOp::Draw(DrawOp::FillText { text, .. }),
                ..
            } if text == "Distance between markers: 100m (0km)"
        )
    });
    assert!(reported, "peg overlay must report the measured distance");
}

#[test]
fn hovering_the_stroke_selects_its_family() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);
    ctx.recalc_tick(&mut host).unwrap();

    ctx.mouse_move(Point::new(150.0, 100.0)).unwrap();
    ctx.recheck_tick().unwrap();

    let parent = sole_object(&ctx);
    let children = ctx.mapper_mut().node_children(parent).unwrap();
    let hover = ctx.hover_selection().clone();
    assert!(hover.has_node(parent), "hover must include the parent");
    for &child in &children {
        assert!(hover.has_node(child), "hover must include every child");
    }
}

#[test]
fn translating_the_selection_moves_the_whole_stroke() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);
    ctx.recalc_tick(&mut host).unwrap();

    let parent = sole_object(&ctx);
    let children = ctx.mapper_mut().node_children(parent).unwrap();
    let parent_before = ctx.mapper().center(parent).unwrap();
    let child_before: Vec<Vec3> = children
        .iter()
        .map(|&child| ctx.mapper().center(child).unwrap())
        .collect();

    // Count updateNode events during the drag.
    let updates = Rc::new(RefCell::new(0_usize));
    let sink = updates.clone();
    ctx.mapper_mut().hooks_mut().on(move |event: &MapEvent| {
        if matches!(event, MapEvent::UpdateNode(_)) {
            *sink.borrow_mut() += 1;
        }
        Ok(())
    });

    // Click to select, then click-drag by 50 px.
    ctx.key_down(KeyEvent::new(Key::Char('s'), Modifiers::NONE))
        .unwrap();
    let grab = Point::new(150.0, 100.0);
    ctx.mouse_down(MouseButton::Left, grab, Modifiers::NONE)
        .unwrap();
    ctx.mouse_up(MouseButton::Left, grab).unwrap();
    assert!(!ctx.active_selection().is_empty());

    ctx.mouse_down(MouseButton::Left, grab, Modifiers::NONE)
        .unwrap();
    ctx.mouse_move(Point::new(200.0, 100.0)).unwrap();
    ctx.mouse_up(MouseButton::Left, Point::new(200.0, 100.0))
        .unwrap();

    let offset = ctx.pixels_to_units(50.0);
    let parent_after = ctx.mapper().center(parent).unwrap();
    assert!((parent_after.x - parent_before.x - offset).abs() < 1e-9);
    for (child, before) in children.iter().zip(&child_before) {
        let after = ctx.mapper().center(*child).unwrap();
        assert!((after.x - before.x - offset).abs() < 1e-9);
        assert_eq!(after.y, before.y);
    }
    assert_eq!(
        *updates.borrow(),
        children.len() + 1,
        "one updateNode per translated node"
    );
}

#[test]
fn zooming_keeps_the_point_under_the_cursor() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    let cursor = Point::new(320.0, 240.0);
    ctx.mouse_move(cursor).unwrap();
    let fixed = ctx.canvas_point_to_map(cursor);

    // Wheel up: zoom in by one level, applied at the next recalc.
    ctx.wheel(-1.0).unwrap();
    ctx.recalc_tick(&mut host).unwrap();

    let after = ctx.map_point_to_canvas(fixed);
    assert!((after.x - cursor.x).abs() <= 1.0);
    assert!((after.y - cursor.y).abs() <= 1.0);
}

#[test]
fn delete_cascade_and_unremove_restore_the_family() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    let parent = ctx
        .mapper_mut()
        .insert_node(
            Vec3::ZERO,
            NodeRole::Object,
            InsertNodeOptions {
                type_key: "grass".into(),
                radius: 10.0,
                ..InsertNodeOptions::default()
            },
        )
        .unwrap();
    let children: Vec<NodeRef> = (0..3)
        .map(|i| {
            ctx.mapper_mut()
                .insert_node(
                    Vec3::new(f64::from(i) * 4.0, 0.0, 0.0),
                    NodeRole::Point,
                    InsertNodeOptions {
                        parent: Some(parent),
                        type_key: "grass".into(),
                        radius: 3.0,
                        ..InsertNodeOptions::default()
                    },
                )
                .unwrap()
        })
        .collect();
    for pair in [(0, 1), (1, 2), (2, 0)] {
        ctx.mapper_mut()
            .insert_edge(children[pair.0], children[pair.1])
            .unwrap();
    }
    assert_eq!(ctx.mapper_mut().node_edges(children[0]).unwrap().len(), 2);

    ctx.perform_action(Action::Remove {
        nodes: vec![parent],
    })
    .unwrap();

    for &node in children.iter().chain([parent].iter()) {
        assert!(!ctx.mapper().node_valid(node).unwrap());
    }
    assert!(ctx.mapper_mut().node_edges(children[0]).unwrap().is_empty());

    ctx.undo().unwrap();

    for &node in children.iter().chain([parent].iter()) {
        assert!(ctx.mapper().node_valid(node).unwrap());
    }
    assert_eq!(ctx.mapper_mut().node_edges(children[0]).unwrap().len(), 2);
    assert_eq!(ctx.mapper_mut().node_children(parent).unwrap(), children);
}

#[test]
fn delete_brush_erases_leaves_under_the_stroke() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);
    ctx.recalc_tick(&mut host).unwrap();
    let parent = sole_object(&ctx);
    assert!(!ctx.mapper_mut().node_children(parent).unwrap().is_empty());

    ctx.key_down(KeyEvent::new(Key::Char('d'), Modifiers::NONE))
        .unwrap();
    ctx.mouse_down(MouseButton::Left, Point::new(90.0, 100.0), Modifiers::NONE)
        .unwrap();
    for x in [100.0, 125.0, 150.0, 175.0, 200.0, 215.0] {
        ctx.mouse_move(Point::new(x, 100.0)).unwrap();
    }
    ctx.mouse_up(MouseButton::Left, Point::new(215.0, 100.0))
        .unwrap();

    // Everything the erase stroke reached is gone; anything left must
    // sit clear of the erased band.
    let survivors = ctx.mapper_mut().node_children(parent).unwrap();
    for survivor in survivors {
        let center = ctx.mapper().effective_center(survivor).unwrap();
        let canvas = ctx.map_point_to_canvas(center);
        assert!(
            (canvas.y - 100.0).abs() > 2.0 || !(95.0..=220.0).contains(&canvas.x),
            "node at {canvas:?} should have been erased"
        );
    }
}

#[test]
fn right_click_cancels_an_in_flight_stroke() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    pick_grass(&mut ctx);
    ctx.mouse_down(MouseButton::Left, Point::new(100.0, 100.0), Modifiers::NONE)
        .unwrap();
    ctx.mouse_move(Point::new(160.0, 100.0)).unwrap();
    assert!(!ctx
        .mapper()
        .object_nodes_touching_area(everything(), 0.0)
        .unwrap()
        .is_empty());

    ctx.mouse_down(MouseButton::Right, Point::new(160.0, 100.0), Modifiers::NONE)
        .unwrap();

    // The placements are rolled back; the empty parent object remains
    // until its next removal, but carries no children.
    let objects = ctx
        .mapper()
        .object_nodes_touching_area(everything(), 0.0)
        .unwrap();
    for object in objects {
        assert!(ctx.mapper_mut().node_children(object).unwrap().is_empty());
    }
    assert_eq!(ctx.undo_depth(), 0, "a cancelled stroke leaves no undo entry");
}

#[test]
fn export_import_round_trips_through_the_editor() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);
    let parent = sole_object(&ctx);
    let children = ctx.mapper_mut().node_children(parent).unwrap();
    let bytes = ctx.mapper_mut().export_map().unwrap();

    let mut fresh_host = RecordHost::new();
    let mut fresh = editor(&mut fresh_host);
    fresh.mapper_mut().import_map(&bytes).unwrap();

    assert_eq!(fresh.mapper_mut().node_children(parent).unwrap(), children);
    assert_eq!(
        fresh.mapper().radius(parent).unwrap(),
        ctx.mapper().radius(parent).unwrap()
    );
}

#[test]
fn labels_anchor_inside_the_screen() {
    let mut host = RecordHost::new();
    let mut ctx = editor(&mut host);

    paint_stroke(&mut ctx);
    let parent = sole_object(&ctx);
    ctx.mapper_mut().set_name(parent, Some("Greenfield")).unwrap();
    ctx.recalc_tick(&mut host).unwrap();

    host.clear_events();
    ctx.redraw_tick(&mut host).unwrap();
    let mut saw_label = false;
    for event in host.events() {
        if let Event::Op {
            op: CanvasOp::Draw(DrawOp::FillText { at, text, .. }),
            ..
        } = event
            && text == "Greenfield"
        {
            saw_label = true;
            assert!((0.0..=800.0).contains(&at.x), "label anchor off screen");
            assert!((0.0..=600.0).contains(&at.y), "label anchor off screen");
        }
    }
    assert!(saw_label, "the named object must draw its label");
}
