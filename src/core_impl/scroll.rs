use super::*;

impl Document {
    /// Scrolls every scrollable overflow ancestor of `node`, innermost first,
    /// by the smallest amount that brings the target region into its client
    /// box. The region is the element's rect, or a 1x1 square at `offset`
    /// within it. Falls back once to aligning the region with each
    /// container's top-left corner when that is not enough.
    pub(crate) fn scroll_region_into_view(
        &mut self,
        node: NodeId,
        offset: Option<Point>,
    ) -> Result<ClipState> {
        let layout = self.layout();
        let fixed = self.is_fixed_subtree(node);
        let containers = self
            .overflow_ancestors(node)
            .into_iter()
            .filter(|container| self.is_scrollable_container(*container))
            .filter(|container| !(fixed && self.dom.has_tag(*container, "html")))
            .collect::<Vec<_>>();

        for container in &containers {
            let region = self.target_region(&layout, node, offset);
            let bounds = self.client_padding_rect(&layout, *container);
            let dx = minimal_delta(region.left, region.right(), bounds.left, bounds.right());
            let dy = minimal_delta(region.top, region.bottom(), bounds.top, bounds.bottom());
            if dx != 0.0 || dy != 0.0 {
                self.scroll_container_by(&layout, *container, dx, dy);
            }
        }

        let region = self.target_region(&layout, node, offset);
        let state = self.clip_state_in(&layout, node, Some(region));
        if state == ClipState::None {
            return Ok(state);
        }

        tracing::warn!(
            node = %node,
            ?state,
            "minimal scrolling left the element clipped; aligning it to its containers"
        );
        self.trace_device(format!(
            "[scroll] fallback target={} state={state:?}",
            self.trace_node_label(node)
        ));
        for container in &containers {
            let region = self.target_region(&layout, node, offset);
            let bounds = self.client_padding_rect(&layout, *container);
            self.scroll_container_by(
                &layout,
                *container,
                region.left - bounds.left,
                region.top - bounds.top,
            );
        }
        let region = self.target_region(&layout, node, offset);
        Ok(self.clip_state_in(&layout, node, Some(region)))
    }

    fn target_region(&self, layout: &Layout, node: NodeId, offset: Option<Point>) -> Rect {
        let rect = self.client_rect(layout, node);
        match offset {
            Some(point) => Rect::new(rect.left + point.x, rect.top + point.y, 1.0, 1.0),
            None => rect,
        }
    }

    /// Adds to a container's scroll offsets, clamped to its scroll range. The
    /// root element scrolls the window.
    fn scroll_container_by(&mut self, layout: &Layout, container: NodeId, dx: f64, dy: f64) {
        if self.dom.has_tag(container, "html") {
            let (max_x, max_y) = self.max_scroll(layout, None);
            self.viewport.scroll_x = (self.viewport.scroll_x + dx).clamp(0.0, max_x);
            self.viewport.scroll_y = (self.viewport.scroll_y + dy).clamp(0.0, max_y);
            return;
        }
        let (max_x, max_y) = self.max_scroll(layout, Some(container));
        if let Some(element) = self.dom.element_mut(container) {
            element.scroll_left = (element.scroll_left + dx).clamp(0.0, max_x);
            element.scroll_top = (element.scroll_top + dy).clamp(0.0, max_y);
        }
    }
}

/// Signed scroll needed along one axis: reveal the near edge when the region
/// starts before the box, otherwise pull the far edge in without pushing the
/// near edge out.
fn minimal_delta(start: f64, end: f64, box_start: f64, box_end: f64) -> f64 {
    if start < box_start {
        start - box_start
    } else if end > box_end {
        (end - box_end).min(start - box_start)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_delta_prefers_the_smallest_move() {
        assert_eq!(minimal_delta(10.0, 20.0, 0.0, 100.0), 0.0);
        assert_eq!(minimal_delta(-30.0, -10.0, 0.0, 100.0), -30.0);
        assert_eq!(minimal_delta(150.0, 160.0, 0.0, 100.0), 60.0);
        // Taller than the box: align the near edge.
        assert_eq!(minimal_delta(150.0, 400.0, 0.0, 100.0), 150.0);
    }

    #[test]
    fn scrolls_nested_containers_and_window() -> Result<()> {
        let mut doc = Document::from_html(
            r#"<div style='height: 1000px'></div>
               <div id='outer' style='overflow: auto; width: 200px; height: 100px'>
                 <div style='height: 500px'></div>
                 <button id='b'>go</button>
               </div>"#,
        )?;
        let outer = doc.select_one("#outer")?;
        let button = doc.select_one("#b")?;
        assert_eq!(doc.clip_state(button)?, ClipState::Scroll);
        doc.scroll_into_view(button)?;
        assert_eq!(doc.clip_state(button)?, ClipState::None);
        assert_eq!(doc.scroll_offset(outer)?, (0.0, 420.0));
        let window = doc.window_scroll();
        assert!(window.1 > 0.0);

        doc.scroll_into_view(button)?;
        assert_eq!(doc.scroll_offset(outer)?, (0.0, 420.0));
        assert_eq!(doc.window_scroll(), window);
        Ok(())
    }
}
