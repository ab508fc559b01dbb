//! Grid: children fill cells row-major.
//!
//! Column and row definitions come from the `columns` and `rows` size lists.
//! When one list is empty its count follows from the number of children;
//! when both are empty the grid is a single column.
//!
//! ```text
//! wanted pass:  per column max width, per row max height, pixel defs override
//! layout pass:  auto → wanted, pixels → fixed, percent → share of available,
//!               expand → equal split of what is left
//! ```

use farsight_shared::{PropertyId, Rect, Size, SizeDef};

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

/// Column and row counts for `children` visible children.
fn dimensions(columns: usize, rows: usize, children: usize) -> (usize, usize) {
    match (columns, rows) {
        (0, 0) => (1, children),
        (0, rows) => (children.div_ceil(rows), rows),
        (columns, 0) => (columns, children.div_ceil(columns)),
        (columns, rows) => (columns, rows),
    }
}

/// Final track sizes for one axis.
///
/// `wanted` holds one entry per track and may be longer than `defs`; tracks
/// without a definition keep their wanted size.
fn calculate_sizes(defs: &[SizeDef], wanted: &[i32], available: i32) -> Vec<i32> {
    let mut sizes = wanted.to_vec();
    let mut fixed = 0;
    let mut expanders = 0;
    for (index, size) in sizes.iter_mut().enumerate() {
        match defs.get(index) {
            Some(SizeDef::Expand) => {
                expanders += 1;
                continue;
            }
            Some(SizeDef::Percent(fraction)) => *size = (fraction * available as f32) as i32,
            Some(SizeDef::Pixels(pixels)) => *size = *pixels,
            Some(SizeDef::Auto) | None => {}
        }
        fixed += *size;
    }

    if expanders > 0 {
        let share = (available - fixed).max(0) / expanders;
        for (index, size) in sizes.iter_mut().enumerate() {
            if matches!(defs.get(index), Some(SizeDef::Expand)) {
                *size = share;
            }
        }
    }
    sizes
}

fn offsets(sizes: &[i32], start: i32) -> Vec<i32> {
    sizes
        .iter()
        .scan(start, |next, &size| {
            let at = *next;
            *next += size;
            Some(at)
        })
        .collect()
}

impl WidgetTree {
    fn grid_defs(&self, ctx: &dyn WidgetContext, id: WidgetId) -> (Vec<SizeDef>, Vec<SizeDef>) {
        self.get(id).map_or_else(Default::default, |widget| {
            let props = widget.props(ctx);
            (props.size_list(PropertyId::Columns), props.size_list(PropertyId::Rows))
        })
    }

    pub(crate) fn grid_wanted_size(&mut self, ctx: &dyn WidgetContext, id: WidgetId) -> Size {
        let (column_defs, row_defs) = self.grid_defs(ctx, id);
        let visible: Vec<WidgetId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&child| !self.is_user_collapsed(ctx, child))
            .collect();
        let (columns, rows) = dimensions(column_defs.len(), row_defs.len(), visible.len());

        let mut widths = vec![0; columns];
        let mut heights = vec![0; rows];
        for (index, &child) in visible.iter().enumerate() {
            let (column, row) = (index % columns, index / columns);
            if row >= rows {
                break;
            }
            let wanted = self.wanted_size_with_margins(ctx, child);
            widths[column] = widths[column].max(wanted.width);
            heights[row] = heights[row].max(wanted.height);
        }

        for (track, def) in widths.iter_mut().zip(&column_defs) {
            if let SizeDef::Pixels(pixels) = def {
                *track = *pixels;
            }
        }
        for (track, def) in heights.iter_mut().zip(&row_defs) {
            if let SizeDef::Pixels(pixels) = def {
                *track = *pixels;
            }
        }

        let size = Size::new(widths.iter().sum(), heights.iter().sum());
        if let Some(widget) = self.get_mut(id) {
            widget.state.column_widths = widths;
            widget.state.row_heights = heights;
        }
        size
    }

    pub(crate) fn layout_grid(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, area: Rect) {
        let (column_defs, row_defs) = self.grid_defs(&*ctx, id);
        let Some(widget) = self.get(id) else {
            return;
        };
        let widths = calculate_sizes(&column_defs, &widget.state.column_widths, area.width);
        let heights = calculate_sizes(&row_defs, &widget.state.row_heights, area.height);
        let xs = offsets(&widths, area.x);
        let ys = offsets(&heights, area.y);

        let children = self.children(id).to_vec();
        let mut cell = 0;
        for child in children {
            self.set_hidden_by_layout(child, false);
            if self.is_user_collapsed(&*ctx, child) {
                continue;
            }
            let (column, row) = (cell % widths.len().max(1), cell / widths.len().max(1));
            if column >= widths.len() || row >= heights.len() {
                self.set_hidden_by_layout(child, true);
                continue;
            }
            cell += 1;
            let bounds = Rect::new(xs[column], ys[row], widths[column], heights[row]);
            self.layout(ctx, child, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{bounds, container, fixed, run};
    use super::*;
    use crate::context::LocalContext;
    use farsight_shared::{Value, WidgetType};

    fn grid(tree: &mut WidgetTree, columns: Vec<SizeDef>, rows: Vec<SizeDef>) -> WidgetId {
        let grid = container(tree, WidgetType::Grid);
        let widget = tree.get_mut(grid).unwrap();
        widget.set_literal(PropertyId::Columns, Value::SizeList(columns)).unwrap();
        widget.set_literal(PropertyId::Rows, Value::SizeList(rows)).unwrap();
        grid
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(dimensions(0, 0, 3), (1, 3));
        assert_eq!(dimensions(2, 0, 3), (2, 2));
        assert_eq!(dimensions(0, 2, 5), (3, 2));
        assert_eq!(dimensions(2, 2, 9), (2, 2));
    }

    #[test]
    fn test_calculate_sizes() {
        let defs = [SizeDef::Pixels(10), SizeDef::Percent(0.25), SizeDef::Expand, SizeDef::Expand];
        assert_eq!(calculate_sizes(&defs, &[1, 1, 1, 1, 6], 100), vec![10, 25, 29, 29, 6]);
        assert_eq!(calculate_sizes(&[SizeDef::Expand], &[50, 70], 40), vec![0, 70]);
    }

    #[test]
    fn test_two_column_grid() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let grid = grid(&mut tree, vec![SizeDef::Auto, SizeDef::Auto], Vec::new());
        let cells: Vec<WidgetId> = (0..3).map(|_| fixed(&mut tree, grid, 10, 10)).collect();

        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 100));
        assert_eq!(tree.get(grid).unwrap().wanted_size(), Size::new(20, 20));
        assert_eq!(bounds(&tree, cells[0]), Rect::new(0, 0, 10, 10));
        assert_eq!(bounds(&tree, cells[1]), Rect::new(10, 0, 10, 10));
        assert_eq!(bounds(&tree, cells[2]), Rect::new(0, 10, 10, 10));
    }

    #[test]
    fn test_overflow_hidden_and_expand() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let grid = grid(
            &mut tree,
            vec![SizeDef::Pixels(30), SizeDef::Expand],
            vec![SizeDef::Percent(0.5)],
        );
        let a = fixed(&mut tree, grid, 10, 10);
        let b = fixed(&mut tree, grid, 10, 10);
        let extra = fixed(&mut tree, grid, 10, 10);

        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 100));
        assert_eq!(tree.get(grid).unwrap().wanted_size(), Size::new(40, 10));
        assert_eq!(bounds(&tree, a), Rect::new(0, 0, 30, 50));
        assert_eq!(bounds(&tree, b), Rect::new(30, 0, 70, 50));
        assert!(tree.get(extra).unwrap().is_hidden_by_layout());
        assert!(!tree.get(a).unwrap().is_hidden_by_layout());
    }
}
