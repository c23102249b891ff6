//! Push-down collision resolution.
//!
//! Blocks only ever move down, so the page height never shrinks during a
//! reflow and two blocks cannot trade places forever. Horizontal positions of
//! displaced blocks are left untouched.

use std::cmp::Ordering;

use crate::geometry::{GridPosition, overlaps};

use super::core::{BlockId, Layout};

/// The block the user is holding and where they are holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveMove<'a> {
    pub id: &'a str,
    pub position: GridPosition,
}

impl<'a> ActiveMove<'a> {
    pub fn new(id: &'a str, position: GridPosition) -> Self {
        Self { id, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReflowOutcome<K = String> {
    pub layout: Layout<K>,
    /// Passes run, including the final pass that found nothing to move.
    pub passes: usize,
    /// `false` when the pass cap ran out while blocks were still moving.
    pub converged: bool,
    /// Blocks pushed down at least once, in layout order.
    pub displaced: Vec<BlockId>,
}

/// Place `active` (if any) and push every overlapping block down until no
/// two blocks overlap or `max_passes` is spent.
///
/// The active block never moves. Between two other blocks the one earlier in
/// `(y, x, layout index)` order stays put. The returned layout keeps the
/// input block order. An `active` id missing from the layout is ignored.
pub fn reflow<K: Clone>(
    layout: &Layout<K>,
    active: Option<ActiveMove<'_>>,
    max_passes: usize,
) -> ReflowOutcome<K> {
    let mut positions: Vec<GridPosition> = layout.iter().map(|block| block.position).collect();
    let active_index = active.and_then(|active| {
        let idx = layout.index_of(active.id)?;
        positions[idx] = active.position;
        Some(idx)
    });

    let mut displaced = vec![false; positions.len()];
    let mut passes = 0;
    let mut converged = false;

    while passes < max_passes {
        passes += 1;
        let order = processing_order(&positions);
        let mut moved = false;

        for &a in &order {
            for &b in &order {
                if a == b || !overlaps(&positions[a], &positions[b]) {
                    continue;
                }
                let (stationary, mover) = split_pair(a, b, &positions, active_index);
                let floor = positions[stationary].bottom();
                if positions[mover].y < floor {
                    positions[mover].y = floor;
                    displaced[mover] = true;
                    moved = true;
                }
            }
        }

        if !moved {
            converged = true;
            break;
        }
    }

    let mut working = layout.clone();
    let mut displaced_ids = Vec::new();
    for (idx, block) in working.blocks.iter_mut().enumerate() {
        block.position = positions[idx];
        if displaced[idx] {
            displaced_ids.push(block.id.clone());
        }
    }

    ReflowOutcome {
        layout: working,
        passes,
        converged,
        displaced: displaced_ids,
    }
}

/// Resolve overlaps already present in `layout` without favouring any block.
pub fn settle<K: Clone>(layout: &Layout<K>, max_passes: usize) -> ReflowOutcome<K> {
    reflow(layout, None, max_passes)
}

fn processing_order(positions: &[GridPosition]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| placement_order(a, b, positions));
    order
}

/// Top-to-bottom, left-to-right, then layout index.
fn placement_order(a: usize, b: usize, positions: &[GridPosition]) -> Ordering {
    let (pa, pb) = (&positions[a], &positions[b]);
    pa.y.cmp(&pb.y).then(pa.x.cmp(&pb.x)).then(a.cmp(&b))
}

/// Returns `(stationary, mover)` for an overlapping pair.
fn split_pair(
    a: usize,
    b: usize,
    positions: &[GridPosition],
    active: Option<usize>,
) -> (usize, usize) {
    if active == Some(a) {
        return (a, b);
    }
    if active == Some(b) {
        return (b, a);
    }
    match placement_order(a, b, positions) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, MAX_REFLOW_PASSES};
    use crate::layout::Block;
    use proptest::prelude::*;

    fn layout(blocks: &[(&str, i32, i32, i32, i32)]) -> Layout {
        let blocks = blocks
            .iter()
            .map(|&(id, x, y, w, h)| Block::new(id, "record".to_string(), GridPosition::new(x, y, w, h)))
            .collect();
        Layout::from_blocks(blocks, &GridConfig::default()).unwrap()
    }

    fn y_of(layout: &Layout, id: &str) -> i32 {
        layout.position_of(id).unwrap().y
    }

    #[test]
    fn active_block_stays_and_the_other_moves() {
        let input = layout(&[("a", 0, 0, 6, 2), ("b", 0, 0, 6, 2)]);
        let active = ActiveMove::new("b", GridPosition::new(0, 0, 6, 2));
        let outcome = reflow(&input, Some(active), MAX_REFLOW_PASSES);

        assert!(outcome.converged);
        assert_eq!(y_of(&outcome.layout, "a"), 2);
        assert_eq!(y_of(&outcome.layout, "b"), 0);
        assert_eq!(outcome.displaced, vec!["a".to_string()]);
        assert!(outcome.layout.is_conflict_free());
    }

    #[test]
    fn dropping_onto_a_neighbour_pushes_it_down() {
        let input = layout(&[("a", 0, 0, 4, 2), ("b", 4, 0, 4, 2)]);
        let active = ActiveMove::new("a", GridPosition::new(4, 0, 4, 2));
        let outcome = reflow(&input, Some(active), MAX_REFLOW_PASSES);

        assert_eq!(outcome.layout.position_of("a"), Some(GridPosition::new(4, 0, 4, 2)));
        assert_eq!(outcome.layout.position_of("b"), Some(GridPosition::new(4, 2, 4, 2)));
        assert!(outcome.layout.is_conflict_free());
    }

    #[test]
    fn pushes_cascade_down_a_stack() {
        let input = layout(&[("a", 0, 0, 12, 2), ("b", 0, 2, 12, 2), ("c", 0, 4, 12, 2)]);
        let active = ActiveMove::new("a", GridPosition::new(0, 2, 12, 2));
        let outcome = reflow(&input, Some(active), MAX_REFLOW_PASSES);

        assert!(outcome.converged);
        assert_eq!(y_of(&outcome.layout, "a"), 2);
        assert_eq!(y_of(&outcome.layout, "b"), 4);
        assert_eq!(y_of(&outcome.layout, "c"), 6);
        assert_eq!(outcome.displaced, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn equal_rows_keep_the_leftmost_block() {
        let input = layout(&[("right", 3, 0, 4, 2), ("left", 0, 0, 4, 2)]);
        let outcome = settle(&input, MAX_REFLOW_PASSES);

        assert_eq!(y_of(&outcome.layout, "left"), 0);
        assert_eq!(y_of(&outcome.layout, "right"), 2);
    }

    #[test]
    fn identical_footprints_keep_the_earlier_block() {
        let input = layout(&[("first", 2, 1, 4, 2), ("second", 2, 1, 4, 2)]);
        let outcome = settle(&input, MAX_REFLOW_PASSES);

        assert_eq!(y_of(&outcome.layout, "first"), 1);
        assert_eq!(y_of(&outcome.layout, "second"), 3);

        let swapped = layout(&[("second", 2, 1, 4, 2), ("first", 2, 1, 4, 2)]);
        let outcome = settle(&swapped, MAX_REFLOW_PASSES);
        assert_eq!(y_of(&outcome.layout, "second"), 1);
        assert_eq!(y_of(&outcome.layout, "first"), 3);
    }

    #[test]
    fn higher_block_stays_when_neither_is_active() {
        let input = layout(&[("low", 0, 1, 4, 2), ("high", 2, 0, 4, 2)]);
        let outcome = settle(&input, MAX_REFLOW_PASSES);

        assert_eq!(y_of(&outcome.layout, "high"), 0);
        assert_eq!(y_of(&outcome.layout, "low"), 2);
    }

    #[test]
    fn conflict_free_layout_is_returned_unchanged() {
        let input = layout(&[("a", 0, 0, 6, 2), ("b", 6, 0, 6, 3), ("c", 0, 2, 4, 2)]);
        let outcome = settle(&input, MAX_REFLOW_PASSES);

        assert_eq!(outcome.layout, input);
        assert_eq!(outcome.passes, 1);
        assert!(outcome.displaced.is_empty());
    }

    #[test]
    fn output_keeps_input_order() {
        let input = layout(&[("z", 0, 4, 4, 2), ("a", 0, 0, 4, 6)]);
        let outcome = settle(&input, MAX_REFLOW_PASSES);
        let ids: Vec<_> = outcome.layout.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(y_of(&outcome.layout, "z"), 6);
    }

    #[test]
    fn unknown_active_id_is_ignored() {
        let input = layout(&[("a", 0, 0, 4, 2)]);
        let active = ActiveMove::new("ghost", GridPosition::new(0, 0, 4, 2));
        let outcome = reflow(&input, Some(active), MAX_REFLOW_PASSES);
        assert_eq!(outcome.layout, input);
        assert!(outcome.converged);
    }

    #[test]
    fn exhausted_cap_returns_partial_result() {
        let input = layout(&[("a", 0, 0, 12, 2), ("b", 0, 2, 12, 2), ("c", 0, 4, 12, 2)]);
        let active = ActiveMove::new("a", GridPosition::new(0, 2, 12, 2));
        let outcome = reflow(&input, Some(active), 1);

        assert!(!outcome.converged);
        assert_eq!(outcome.passes, 1);
        assert_eq!(y_of(&outcome.layout, "a"), 2);
        assert!(y_of(&outcome.layout, "b") >= 2);
    }

    #[test]
    fn zero_passes_leaves_blocks_in_place() {
        let input = layout(&[("a", 0, 0, 4, 2), ("b", 0, 0, 4, 2)]);
        let outcome = settle(&input, 0);
        assert!(!outcome.converged);
        assert_eq!(outcome.passes, 0);
        assert_eq!(outcome.layout, input);
    }

    fn arb_layout() -> impl Strategy<Value = Layout> {
        prop::collection::vec((2..=6i32, 2..=4i32, 0..=12i32, 0..=8i32), 1..8).prop_map(|specs| {
            let blocks = specs
                .into_iter()
                .enumerate()
                .map(|(idx, (w, h, x, y))| {
                    let x = x.min(12 - w);
                    Block::new(format!("b{idx}"), "chart".to_string(), GridPosition::new(x, y, w, h))
                })
                .collect();
            Layout::from_blocks(blocks, &GridConfig::default()).unwrap()
        })
    }

    proptest! {
        #[test]
        fn reflow_resolves_every_overlap(
            input in arb_layout(),
            pick in 0usize..8,
            x in 0..=10i32,
            y in 0..=10i32,
        ) {
            let target = &input.blocks()[pick % input.len()];
            let width = target.position.width;
            let proposed = GridPosition::new(x.min(12 - width), y, width, target.position.height);
            let outcome = reflow(&input, Some(ActiveMove::new(&target.id, proposed)), MAX_REFLOW_PASSES);

            prop_assert!(outcome.converged);
            prop_assert!(outcome.layout.is_conflict_free());
            prop_assert_eq!(outcome.layout.position_of(&target.id), Some(proposed));
            prop_assert_eq!(outcome.layout.len(), input.len());

            for (before, after) in input.iter().zip(outcome.layout.iter()) {
                prop_assert_eq!(&before.id, &after.id);
                if before.id != target.id {
                    prop_assert_eq!(before.position.x, after.position.x);
                    prop_assert!(after.position.y >= before.position.y);
                }
            }
        }

        #[test]
        fn settled_layouts_are_fixed_points(input in arb_layout()) {
            let settled = settle(&input, MAX_REFLOW_PASSES);
            prop_assert!(settled.converged);
            let again = settle(&settled.layout, MAX_REFLOW_PASSES);
            prop_assert_eq!(&again.layout, &settled.layout);
            prop_assert!(again.displaced.is_empty());
        }
    }
}
