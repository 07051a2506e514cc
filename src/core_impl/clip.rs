use super::*;

/// How an element's region is cut off by its overflow ancestors.
///
/// Variants are ordered by severity: `Hidden` dominates `Scroll`, which
/// dominates `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipState {
    None,
    /// Out of view, but an ancestor can scroll it in.
    Scroll,
    /// Cut off by an `overflow: hidden` ancestor or unreachable by scrolling.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overflow {
    Visible,
    Hidden,
    Scrollable,
}

impl Overflow {
    fn parse(value: &str) -> Self {
        match value {
            "visible" => Self::Visible,
            "hidden" | "clip" => Self::Hidden,
            _ => Self::Scrollable,
        }
    }
}

impl Document {
    /// Clip state of `region` (client coordinates; the element's own rect
    /// when `None`) against the overflow ancestors of `node`.
    pub(crate) fn clip_state_in(
        &self,
        layout: &Layout,
        node: NodeId,
        region: Option<Rect>,
    ) -> ClipState {
        let region = region.unwrap_or_else(|| self.client_rect(layout, node));
        let mut treat_as_fixed = false;
        let mut state = ClipState::None;
        let mut cursor = self.overflow_parent(node, &mut treat_as_fixed);

        while let Some(container) = cursor {
            cursor = self.overflow_parent(container, &mut treat_as_fixed);
            let (overflow_x, overflow_y) = self.overflow_styles(container);
            if overflow_x == Overflow::Visible && overflow_y == Overflow::Visible {
                continue;
            }
            let container_rect = self.client_padding_rect(layout, container);
            if !container_rect.has_area() {
                return ClipState::Hidden;
            }
            let is_root = self.dom.has_tag(container, "html");
            let (scroll_x, scroll_y) = self.container_scroll(container);

            let underflows_x = region.right() < container_rect.left;
            let underflows_y = region.bottom() < container_rect.top;
            let overflows_x = region.left >= container_rect.right();
            let overflows_y = region.top >= container_rect.bottom();

            let axis_state = |outside: bool, overflow: Overflow| match (outside, overflow) {
                (false, _) | (_, Overflow::Visible) => ClipState::None,
                (true, Overflow::Hidden) => ClipState::Hidden,
                (true, Overflow::Scrollable) => ClipState::Scroll,
            };
            let mut container_state = [
                axis_state(underflows_x, overflow_x),
                axis_state(underflows_y, overflow_y),
                axis_state(overflows_x, overflow_x),
                axis_state(overflows_y, overflow_y),
            ]
            .into_iter()
            .max()
            .unwrap_or(ClipState::None);

            if container_state == ClipState::Scroll {
                // Content before the scroll origin can never be scrolled to.
                let unscrollable = (underflows_x
                    && overflow_x != Overflow::Visible
                    && region.right() < container_rect.left - scroll_x)
                    || (underflows_y
                        && overflow_y != Overflow::Visible
                        && region.bottom() < container_rect.top - scroll_y);
                // Scrolling the window never moves fixed content.
                let pinned = treat_as_fixed && is_root;
                if unscrollable || pinned {
                    container_state = ClipState::Hidden;
                }
            }

            if container_state == ClipState::Hidden {
                return ClipState::Hidden;
            }
            state = state.max(container_state);
        }
        state
    }

    /// Next ancestor whose overflow can clip `node`. Fixed elements skip
    /// straight to the root; absolute ones skip static containers; inline
    /// containers never clip.
    fn overflow_parent(&self, node: NodeId, treat_as_fixed: &mut bool) -> Option<NodeId> {
        let html = self.dom.document_element()?;
        let position = self.computed_style(node, "position");
        if position == "fixed" {
            *treat_as_fixed = true;
            return (node != html).then_some(html);
        }
        let mut parent = self.dom.parent_element(node);
        while let Some(container) = parent {
            if container == html {
                return Some(container);
            }
            let display = self.computed_style(container, "display");
            let inline = display.starts_with("inline") || display == "contents";
            let skipped_static =
                position == "absolute" && self.computed_style(container, "position") == "static";
            if !inline && !skipped_static {
                return Some(container);
            }
            parent = self.dom.parent_element(container);
        }
        None
    }

    /// Overflow per axis. A visible root takes the body's overflow, and the
    /// root's `visible` means `auto`; the body is then treated as visible.
    fn overflow_styles(&self, container: NodeId) -> (Overflow, Overflow) {
        let html = self.dom.document_element();
        let body = self.dom.body();
        let html_visible = html.is_some_and(|html| {
            self.computed_style(html, "overflow-x") == "visible"
                && self.computed_style(html, "overflow-y") == "visible"
        });
        let mut source = container;
        if html_visible {
            if Some(container) == html {
                if let Some(body) = body {
                    source = body;
                }
            } else if Some(container) == body {
                return (Overflow::Visible, Overflow::Visible);
            }
        }
        let axis = |property: &str| {
            let overflow = Overflow::parse(&self.computed_style(source, property));
            if Some(container) == html && overflow == Overflow::Visible {
                Overflow::Scrollable
            } else {
                overflow
            }
        };
        (axis("overflow-x"), axis("overflow-y"))
    }

    /// Scroll offsets of a container; the root reports the window's.
    pub(crate) fn container_scroll(&self, container: NodeId) -> (f64, f64) {
        if self.dom.has_tag(container, "html") {
            return (self.viewport.scroll_x, self.viewport.scroll_y);
        }
        self.dom
            .element(container)
            .map(|element| (element.scroll_left, element.scroll_top))
            .unwrap_or((0.0, 0.0))
    }

    /// Whether `container` can be scrolled by the planner: overflow scroll or
    /// auto on some axis, or the root.
    pub(crate) fn is_scrollable_container(&self, container: NodeId) -> bool {
        let (x, y) = self.overflow_styles(container);
        x == Overflow::Scrollable || y == Overflow::Scrollable
    }

    /// Ancestors that may clip `node`, innermost first.
    pub(crate) fn overflow_ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut treat_as_fixed = false;
        let mut out = Vec::new();
        let mut cursor = self.overflow_parent(node, &mut treat_as_fixed);
        while let Some(container) = cursor {
            out.push(container);
            cursor = self.overflow_parent(container, &mut treat_as_fixed);
        }
        out
    }

    pub(crate) fn is_fixed_subtree(&self, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(self.dom.ancestors(node))
            .filter(|n| self.dom.element(*n).is_some())
            .any(|n| self.computed_style(n, "position") == "fixed")
    }
}
