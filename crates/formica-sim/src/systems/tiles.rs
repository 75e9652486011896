//! Tiled-sprite cache: recompute the same-kind neighbour mask of stale tiles.

use formica_core::components::Body;
use formica_core::enums::Tag;

use crate::context::SimContext;

pub fn run(ctx: &mut SimContext) {
    for id in ctx.store.take_stale_tiles() {
        if !ctx.store.has_tag(id, Tag::Tiled) {
            continue;
        }
        let Some(body) = ctx.store.body(id) else {
            continue;
        };
        let p = body.position;
        let directions = [p.offset(-1, 0), p.offset(0, -1), p.offset(1, 0), p.offset(0, 1)];
        let mut mask = 0u8;
        for (bit, cell) in directions.into_iter().enumerate() {
            let same = ctx
                .store
                .occupants(cell)
                .iter()
                .any(|other| *other != id && ctx.store.kind(*other) == Some(body.kind));
            if same {
                mask |= 1 << bit;
            }
        }
        ctx.store.with_mut::<Body, _>(id, |b| b.tile_mask = mask);
    }
}
