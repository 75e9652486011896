//! End-of-tick removal of entities whose `Die` expired.

use crate::context::SimContext;
use crate::operations;

pub fn run(ctx: &mut SimContext) {
    let doomed = std::mem::take(&mut ctx.doomed);
    for id in doomed {
        if let Err(err) = operations::remove_entity(ctx, id) {
            tracing::debug!(entity = %id, %err, "doomed entity already gone");
        }
    }
}
