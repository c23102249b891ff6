use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::{GridPosition, overlaps};

/// Unique identifier for a block on the page.
pub type BlockId = String;

/// A named rectangle on the grid. `kind` is carried for the host and never
/// read by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block<K = String> {
    pub id: BlockId,
    pub kind: K,
    pub position: GridPosition,
}

impl<K> Block<K> {
    pub fn new(id: impl Into<BlockId>, kind: K, position: GridPosition) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
        }
    }
}

/// A block whose position differs between two layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMove {
    pub id: BlockId,
    pub from: GridPosition,
    pub to: GridPosition,
}

/// Ordered set of blocks, unique by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Layout<K = String> {
    pub(crate) blocks: Vec<Block<K>>,
}

impl<K> Default for Layout<K> {
    fn default() -> Self {
        Self { blocks: Vec::new() }
    }
}

impl<K> Layout<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate ids and positions. Overlaps are allowed here; the controller
    /// settles them when it takes ownership.
    pub fn from_blocks(blocks: Vec<Block<K>>, grid: &GridConfig) -> Result<Self> {
        let mut seen = HashSet::with_capacity(blocks.len());
        for block in &blocks {
            if !seen.insert(block.id.as_str()) {
                return Err(LayoutError::DuplicateBlock(block.id.clone()));
            }
            check_position(block, grid)?;
        }
        Ok(Self { blocks })
    }

    pub fn from_json(json: &str, grid: &GridConfig) -> Result<Self>
    where
        K: DeserializeOwned,
    {
        let blocks: Vec<Block<K>> = serde_json::from_str(json)?;
        Self::from_blocks(blocks, grid)
    }

    pub fn blocks(&self) -> &[Block<K>] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block<K>> {
        self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block<K>> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Block<K>> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn position_of(&self, id: &str) -> Option<GridPosition> {
        self.get(id).map(|block| block.position)
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    pub(crate) fn set_position(&mut self, id: &str, position: GridPosition) -> bool {
        match self.blocks.iter_mut().find(|block| block.id == id) {
            Some(block) => {
                block.position = position;
                true
            }
            None => false,
        }
    }

    /// Append a block. Its footprint may overlap others until the layout is
    /// reflowed.
    pub fn insert(&mut self, block: Block<K>, grid: &GridConfig) -> Result<()> {
        if self.contains(&block.id) {
            return Err(LayoutError::DuplicateBlock(block.id));
        }
        check_position(&block, grid)?;
        self.blocks.push(block);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Block<K>> {
        let idx = self.index_of(id)?;
        Some(self.blocks.remove(idx))
    }

    /// Every pair of distinct blocks whose footprints overlap, in layout order.
    pub fn overlapping_pairs(&self) -> Vec<(BlockId, BlockId)> {
        let mut pairs = Vec::new();
        for (idx, a) in self.blocks.iter().enumerate() {
            for b in &self.blocks[idx + 1..] {
                if overlaps(&a.position, &b.position) {
                    pairs.push((a.id.clone(), b.id.clone()));
                }
            }
        }
        pairs
    }

    pub fn is_conflict_free(&self) -> bool {
        self.blocks.iter().enumerate().all(|(idx, a)| {
            self.blocks[idx + 1..]
                .iter()
                .all(|b| !overlaps(&a.position, &b.position))
        })
    }

    /// First row below every block; zero for an empty layout.
    pub fn bottom(&self) -> i32 {
        self.blocks
            .iter()
            .map(|block| block.position.bottom())
            .max()
            .unwrap_or(0)
    }

    /// Hash of block ids and positions, in order. Payloads are not hashed.
    pub fn digest(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for block in &self.blocks {
            hasher.update(block.id.as_bytes());
            hasher.update(&[0]);
            let GridPosition {
                x,
                y,
                width,
                height,
            } = block.position;
            for value in [x, y, width, height] {
                hasher.update(&value.to_le_bytes());
            }
        }
        hasher.finalize()
    }

    /// Blocks of `self` that sit somewhere else in `next`.
    pub fn diff<L>(&self, next: &Layout<L>) -> Vec<BlockMove> {
        self.blocks
            .iter()
            .filter_map(|block| {
                let to = next.position_of(&block.id)?;
                (to != block.position).then(|| BlockMove {
                    id: block.id.clone(),
                    from: block.position,
                    to,
                })
            })
            .collect()
    }
}

fn check_position<K>(block: &Block<K>, grid: &GridConfig) -> Result<()> {
    block
        .position
        .validate(grid)
        .map_err(|source| LayoutError::InvalidPosition {
            id: block.id.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridError;

    fn block(id: &str, x: i32, y: i32, w: i32, h: i32) -> Block {
        Block::new(id, "list".to_string(), GridPosition::new(x, y, w, h))
    }

    #[test]
    fn from_blocks_rejects_duplicates_and_bad_positions() {
        let grid = GridConfig::default();
        let err = Layout::from_blocks(vec![block("a", 0, 0, 4, 2), block("a", 4, 0, 4, 2)], &grid)
            .unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateBlock(id) if id == "a"));

        let err = Layout::from_blocks(vec![block("wide", 8, 0, 6, 2)], &grid).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidPosition {
                source: GridError::ExceedsColumns { .. },
                ..
            }
        ));
    }

    #[test]
    fn from_json_reads_block_list() {
        let grid = GridConfig::default();
        let json = r#"[
            {"id": "list", "kind": "data_list", "position": {"x": 0, "y": 0, "width": 6, "height": 4}},
            {"id": "chart", "kind": "chart", "position": {"x": 6, "y": 0, "width": 6, "height": 4}}
        ]"#;
        let layout: Layout = Layout::from_json(json, &grid).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.get("chart").unwrap().kind, "chart");
        assert!(layout.is_conflict_free());
        assert_eq!(layout.bottom(), 4);
    }

    #[test]
    fn overlapping_pairs_lists_each_pair_once() {
        let grid = GridConfig::default();
        let layout = Layout::from_blocks(
            vec![
                block("a", 0, 0, 6, 2),
                block("b", 0, 0, 6, 2),
                block("c", 6, 0, 6, 2),
            ],
            &grid,
        )
        .unwrap();
        assert_eq!(
            layout.overlapping_pairs(),
            vec![("a".to_string(), "b".to_string())]
        );
        assert!(!layout.is_conflict_free());
    }

    #[test]
    fn insert_and_remove_are_plain_list_edits() {
        let grid = GridConfig::default();
        let mut layout = Layout::new();
        layout.insert(block("a", 0, 0, 4, 2), &grid).unwrap();
        assert!(layout.insert(block("a", 4, 0, 4, 2), &grid).is_err());
        assert!(layout.insert(block("tiny", 4, 0, 1, 2), &grid).is_err());
        assert_eq!(layout.remove("a").map(|b| b.id), Some("a".to_string()));
        assert!(layout.remove("a").is_none());
        assert!(layout.is_empty());
    }

    #[test]
    fn digest_tracks_positions_not_payloads() {
        let grid = GridConfig::default();
        let a = Layout::from_blocks(vec![block("a", 0, 0, 4, 2)], &grid).unwrap();
        let mut b = a.clone();
        b.blocks[0].kind = "chart".to_string();
        assert_eq!(a.digest(), b.digest());

        b.set_position("a", GridPosition::new(0, 2, 4, 2));
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn diff_reports_moved_blocks() {
        let grid = GridConfig::default();
        let before =
            Layout::from_blocks(vec![block("a", 0, 0, 4, 2), block("b", 4, 0, 4, 2)], &grid)
                .unwrap();
        let mut after = before.clone();
        after.set_position("b", GridPosition::new(4, 2, 4, 2));

        let moves = before.diff(&after);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].id, "b");
        assert_eq!(moves[0].from.y, 0);
        assert_eq!(moves[0].to.y, 2);
        assert!(before.diff(&before).is_empty());
    }
}
