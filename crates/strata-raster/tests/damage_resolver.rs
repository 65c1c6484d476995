//! Damage resolver tests over built display lists.

mod common;

use common::DisplayListBuilder;
use strata_raster::DamageResolver;
use strata_types::Rect;

fn resolve_damage(resolver: &mut DamageResolver, builder: DisplayListBuilder) -> Vec<Rect> {
    let list = builder.finish();
    resolver.begin_updates(100.0, 100.0);
    resolver.add_damage_from_display_list(&list);
    resolver.end_updates()
}

#[test]
fn test_returns_full_rect_on_initial_draw() {
    let mut resolver = DamageResolver::new();

    let mut builder = DisplayListBuilder::new(100.0, 100.0);
    builder.context(0.0, 0.0, 1.0, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context(50.0, 50.0, 1.0, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
    });

    let damage = resolve_damage(&mut resolver, builder);
    assert_eq!(vec![Rect::from_xywh(0.0, 0.0, 100.0, 100.0)], damage);
}

fn stable_frame(builder: &mut DisplayListBuilder) {
    builder.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context_tracked(50.0, 50.0, 1.0, 2, false, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
        builder.context_tracked(20.0, 20.0, 1.0, 3, false, |builder| {
            builder.rectangle(50.0, 50.0, 1.0);
        });
    });
}

#[test]
fn test_returns_partial_damage_rect() {
    let mut resolver = DamageResolver::new();

    let mut first = DisplayListBuilder::new(100.0, 100.0);
    first.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context_tracked(50.0, 50.0, 1.0, 2, true, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
    });
    // First pass populates the previous layer contents (full damage from
    // the size change).
    resolve_damage(&mut resolver, first);

    let mut second = DisplayListBuilder::new(100.0, 100.0);
    second.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context_tracked(50.0, 50.0, 1.0, 2, true, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
    });

    let damage = resolve_damage(&mut resolver, second);
    assert_eq!(vec![Rect::from_xywh(50.0, 50.0, 10.0, 10.0)], damage);
}

#[test]
fn test_returns_multiple_damage_rects() {
    let mut resolver = DamageResolver::new();

    let build = |updated: bool| {
        let mut builder = DisplayListBuilder::new(100.0, 100.0);
        builder.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
            builder.rectangle(100.0, 100.0, 1.0);
            builder.context_tracked(50.0, 50.0, 1.0, 2, updated, |builder| {
                builder.rectangle(10.0, 10.0, 1.0);
            });
            builder.context_tracked(20.0, 20.0, 1.0, 3, updated, |builder| {
                builder.rectangle(15.0, 15.0, 1.0);
            });
        });
        builder
    };

    resolve_damage(&mut resolver, build(true));
    let damage = resolve_damage(&mut resolver, build(true));

    assert_eq!(
        vec![
            Rect::from_xywh(50.0, 50.0, 10.0, 10.0),
            Rect::from_xywh(20.0, 20.0, 15.0, 15.0),
        ],
        damage
    );
}

#[test]
fn test_merges_damage_rects_when_possible() {
    let mut resolver = DamageResolver::new();

    let build = || {
        let mut builder = DisplayListBuilder::new(100.0, 100.0);
        builder.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
            builder.rectangle(100.0, 100.0, 1.0);
            builder.context_tracked(50.0, 50.0, 1.0, 2, true, |builder| {
                builder.rectangle(20.0, 20.0, 1.0);
            });
            builder.context_tracked(20.0, 20.0, 1.0, 3, true, |builder| {
                builder.rectangle(40.0, 40.0, 1.0);
            });
        });
        builder
    };

    resolve_damage(&mut resolver, build());
    let damage = resolve_damage(&mut resolver, build());

    assert_eq!(vec![Rect::from_xywh(20.0, 20.0, 50.0, 50.0)], damage);
}

#[test]
fn test_no_damage_without_changes() {
    let mut resolver = DamageResolver::new();

    let mut first = DisplayListBuilder::new(100.0, 100.0);
    stable_frame(&mut first);
    resolve_damage(&mut resolver, first);

    let mut second = DisplayListBuilder::new(100.0, 100.0);
    stable_frame(&mut second);
    let damage = resolve_damage(&mut resolver, second);

    assert!(damage.is_empty());
}

#[test]
fn test_damage_on_inserted_layer() {
    let mut resolver = DamageResolver::new();

    let mut first = DisplayListBuilder::new(100.0, 100.0);
    stable_frame(&mut first);
    resolve_damage(&mut resolver, first);

    let mut second = DisplayListBuilder::new(100.0, 100.0);
    second.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context_tracked(50.0, 50.0, 1.0, 2, false, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
        builder.context_tracked(20.0, 20.0, 1.0, 3, false, |builder| {
            builder.rectangle(50.0, 50.0, 1.0);
        });
        builder.context_tracked(10.0, 10.0, 1.0, 4, true, |builder| {
            builder.rectangle(15.0, 15.0, 1.0);
        });
    });

    let damage = resolve_damage(&mut resolver, second);
    assert_eq!(vec![Rect::from_xywh(10.0, 10.0, 15.0, 15.0)], damage);
}

#[test]
fn test_damage_on_removed_layer() {
    let mut resolver = DamageResolver::new();

    let mut first = DisplayListBuilder::new(100.0, 100.0);
    stable_frame(&mut first);
    resolve_damage(&mut resolver, first);

    let mut second = DisplayListBuilder::new(100.0, 100.0);
    second.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context_tracked(50.0, 50.0, 1.0, 2, false, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
    });

    let damage = resolve_damage(&mut resolver, second);
    assert_eq!(vec![Rect::from_xywh(20.0, 20.0, 50.0, 50.0)], damage);
}

#[test]
fn test_damage_on_moved_layer() {
    let mut resolver = DamageResolver::new();

    let mut first = DisplayListBuilder::new(100.0, 100.0);
    stable_frame(&mut first);
    resolve_damage(&mut resolver, first);

    let mut second = DisplayListBuilder::new(100.0, 100.0);
    second.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
        builder.rectangle(100.0, 100.0, 1.0);
        builder.context_tracked(10.0, 10.0, 1.0, 2, false, |builder| {
            builder.rectangle(10.0, 10.0, 1.0);
        });
        builder.context_tracked(20.0, 20.0, 1.0, 3, false, |builder| {
            builder.rectangle(50.0, 50.0, 1.0);
        });
    });

    let damage = resolve_damage(&mut resolver, second);
    assert_eq!(
        vec![
            Rect::from_xywh(50.0, 50.0, 10.0, 10.0),
            Rect::from_xywh(10.0, 10.0, 10.0, 10.0),
        ],
        damage
    );
}

#[test]
fn test_damage_on_opacity_change() {
    let mut resolver = DamageResolver::new();

    let build = |opacity: f32| {
        let mut builder = DisplayListBuilder::new(100.0, 100.0);
        builder.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
            builder.context_tracked(30.0, 30.0, opacity, 2, false, |builder| {
                builder.rectangle(10.0, 10.0, 1.0);
            });
        });
        builder
    };

    resolve_damage(&mut resolver, build(1.0));
    let damage = resolve_damage(&mut resolver, build(0.5));

    assert_eq!(vec![Rect::from_xywh(30.0, 30.0, 10.0, 10.0)], damage);
}

#[test]
fn test_damage_scales_with_surface_size() {
    let mut resolver = DamageResolver::new();

    // The display list is 100x100 but the surface is 200x200: damage comes
    // back in surface pixels.
    let build = |updated: bool| {
        let mut builder = DisplayListBuilder::new(100.0, 100.0);
        builder.context_tracked(0.0, 0.0, 1.0, 1, false, |builder| {
            builder.context_tracked(10.0, 10.0, 1.0, 2, updated, |builder| {
                builder.rectangle(20.0, 20.0, 1.0);
            });
        });
        builder.finish()
    };

    resolver.begin_updates(200.0, 200.0);
    resolver.add_damage_from_display_list(&build(true));
    resolver.end_updates();

    resolver.begin_updates(200.0, 200.0);
    resolver.add_damage_from_display_list(&build(true));
    let damage = resolver.end_updates();

    assert_eq!(vec![Rect::from_xywh(20.0, 20.0, 40.0, 40.0)], damage);
}
