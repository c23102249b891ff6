use std::io::Write;

use crate::error::Result;
use crate::layout::{Block, Layout};
use crate::width::fit_to_width;

/// Glyphs and cell sizes used by [`LayoutRenderer`].
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Terminal cells per grid column.
    pub cell_width: u16,
    /// Terminal lines per grid row.
    pub row_lines: u16,
    pub empty: char,
    pub body: char,
    pub overlap: char,
    /// Grid rows drawn at most; blocks further down are cut off.
    pub max_rows: i32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            cell_width: 3,
            row_lines: 1,
            empty: '.',
            body: ':',
            overlap: '#',
            max_rows: 256,
        }
    }
}

/// Draws each block as a filled rectangle with its id in the top-left corner.
/// Cells claimed by more than one block are drawn with the overlap glyph so
/// an unsettled preview is visible at a glance.
pub struct LayoutRenderer {
    settings: RendererSettings,
}

impl LayoutRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// One string per terminal line. Always draws at least one grid row and
    /// never more than `max_rows`.
    pub fn render_lines<K>(&self, layout: &Layout<K>, columns: i32) -> Vec<String> {
        let columns = columns.max(0);
        let rows = layout.bottom().min(self.settings.max_rows).max(1);
        let cell = self.settings.cell_width as usize;
        let mut lines = Vec::new();

        for row in 0..rows {
            let owners: Vec<Vec<&Block<K>>> = (0..columns)
                .map(|column| {
                    layout
                        .iter()
                        .filter(|block| block.position.contains_cell(column, row))
                        .collect()
                })
                .collect();

            for line in 0..self.settings.row_lines {
                lines.push(self.render_line(&owners, row, line == 0, cell));
            }
        }
        lines
    }

    pub fn render_to_string<K>(&self, layout: &Layout<K>, columns: i32) -> String {
        self.render_lines(layout, columns).join("\n")
    }

    pub fn render<K>(&self, writer: &mut impl Write, layout: &Layout<K>, columns: i32) -> Result<()> {
        for line in self.render_lines(layout, columns) {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        Ok(())
    }

    fn render_line<K>(&self, owners: &[Vec<&Block<K>>], row: i32, first_line: bool, cell: usize) -> String {
        let mut out = String::new();
        let mut column = 0;

        while column < owners.len() {
            match owners[column].as_slice() {
                [] => {
                    push_repeated(&mut out, self.settings.empty, cell);
                    column += 1;
                }
                [block] => {
                    let start = column;
                    while column < owners.len()
                        && matches!(owners[column].as_slice(), [other] if other.id == block.id)
                    {
                        column += 1;
                    }
                    let run = (column - start) * cell;
                    let labelled = first_line
                        && row == block.position.y
                        && start as i32 == block.position.x;
                    if labelled {
                        out.push_str(&fit_to_width(&block.id, run, self.settings.body));
                    } else {
                        push_repeated(&mut out, self.settings.body, run);
                    }
                }
                _ => {
                    push_repeated(&mut out, self.settings.overlap, cell);
                    column += 1;
                }
            }
        }
        out
    }
}

fn push_repeated(out: &mut String, glyph: char, count: usize) {
    out.extend(std::iter::repeat(glyph).take(count));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::geometry::GridPosition;

    fn layout(blocks: &[(&str, i32, i32, i32, i32)]) -> Layout {
        let blocks = blocks
            .iter()
            .map(|&(id, x, y, w, h)| Block::new(id, "chart".to_string(), GridPosition::new(x, y, w, h)))
            .collect();
        Layout::from_blocks(blocks, &GridConfig::default()).unwrap()
    }

    #[test]
    fn draws_labels_and_bodies() {
        let renderer = LayoutRenderer::with_default();
        let lines = renderer.render_lines(&layout(&[("a", 0, 0, 2, 2), ("b", 2, 0, 2, 2)]), 4);
        assert_eq!(lines, vec!["a:::::b:::::", "::::::::::::"]);
    }

    #[test]
    fn marks_overlapping_cells() {
        let mut renderer = LayoutRenderer::with_default();
        renderer.settings_mut().cell_width = 2;
        let lines = renderer.render_lines(&layout(&[("a", 0, 0, 2, 2), ("b", 1, 0, 2, 2)]), 4);
        assert_eq!(lines[0], "a:##::..");
    }

    #[test]
    fn long_ids_are_cut_to_the_block() {
        let mut renderer = LayoutRenderer::with_default();
        renderer.settings_mut().row_lines = 2;
        let lines = renderer.render_lines(&layout(&[("revenue_chart", 0, 0, 2, 2)]), 3);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "revenu...");
        assert_eq!(lines[1], "::::::...");
    }

    #[test]
    fn far_away_blocks_are_cut_at_max_rows() {
        let mut renderer = LayoutRenderer::with_default();
        renderer.settings_mut().max_rows = 4;
        let page = layout(&[("a", 0, 0, 2, 2), ("deep", 0, i32::MAX - 2, 2, 2)]);
        let lines = renderer.render_lines(&page, 2);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "......");
    }

    #[test]
    fn empty_layout_draws_one_row() {
        let renderer = LayoutRenderer::with_default();
        let mut out = Vec::new();
        renderer.render(&mut out, &Layout::<String>::new(), 2).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "......\n");
    }
}
