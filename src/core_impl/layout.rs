use super::*;

use std::sync::LazyLock;

const CHAR_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 16.0;

static SVG_NUMBER: LazyLock<Option<fancy_regex::Regex>> =
    LazyLock::new(|| fancy_regex::Regex::new(r"-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").ok());

/// Geometry of one laid-out element, in page coordinates with no scrolling
/// applied. Boxes of `position: fixed` subtrees are in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LayoutBox {
    pub(crate) border_box: Rect,
    pub(crate) padding_box: Rect,
    pub(crate) containing_block: Option<NodeId>,
    pub(crate) fixed: bool,
    pub(crate) scroll_width: f64,
    pub(crate) scroll_height: f64,
}

/// One full layout pass over a document. Recomputed for every query.
#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    pub(crate) boxes: HashMap<NodeId, LayoutBox>,
    pub(crate) document_width: f64,
    pub(crate) document_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Display {
    None,
    Block,
    Inline,
    InlineBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
}

#[derive(Debug, Clone, Copy)]
struct Line {
    x: f64,
    y: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy)]
struct Context {
    /// Containing block for absolutely positioned descendants.
    positioned: Option<NodeId>,
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    node: NodeId,
    static_origin: Point,
    containing_block: Option<NodeId>,
    fixed: bool,
}

struct LayoutBuilder<'a> {
    doc: &'a Document,
    layout: Layout,
    deferred: Vec<Deferred>,
}

impl Layout {
    pub(crate) fn compute(doc: &Document) -> Self {
        let mut builder = LayoutBuilder {
            doc,
            layout: Layout::default(),
            deferred: Vec::new(),
        };
        if let Some(html) = doc.dom.document_element() {
            let context = Context { positioned: None };
            builder.layout_block(html, Point::new(0.0, 0.0), doc.viewport.width, None, context);
        }
        let mut index = 0;
        while index < builder.deferred.len() {
            let deferred = builder.deferred[index];
            builder.layout_out_of_flow(deferred);
            index += 1;
        }
        let mut layout = builder.layout;
        layout.compute_scroll_extents(doc);
        layout
    }

    pub(crate) fn get(&self, node: NodeId) -> Option<&LayoutBox> {
        self.boxes.get(&node)
    }

    fn compute_scroll_extents(&mut self, doc: &Document) {
        let mut extents: HashMap<NodeId, (f64, f64)> = HashMap::new();
        let (mut doc_right, mut doc_bottom) = (doc.viewport.width, doc.viewport.height);

        for (node, layout_box) in &self.boxes {
            if layout_box.fixed {
                continue;
            }
            let mut cursor = layout_box.containing_block;
            let mut reached_viewport = true;
            while let Some(ancestor) = cursor {
                let Some(ancestor_box) = self.boxes.get(&ancestor) else {
                    break;
                };
                if creates_scroll_container(doc, ancestor) {
                    let entry = extents.entry(ancestor).or_insert((0.0, 0.0));
                    let padding_box = ancestor_box.padding_box;
                    entry.0 = entry.0.max(layout_box.border_box.right() - padding_box.left);
                    entry.1 = entry.1.max(layout_box.border_box.bottom() - padding_box.top);
                    reached_viewport = false;
                    break;
                }
                if ancestor_box.fixed {
                    reached_viewport = false;
                    break;
                }
                cursor = ancestor_box.containing_block;
            }
            if reached_viewport && doc.dom.element(*node).is_some() {
                doc_right = doc_right.max(layout_box.border_box.right());
                doc_bottom = doc_bottom.max(layout_box.border_box.bottom());
            }
        }

        for (node, layout_box) in self.boxes.iter_mut() {
            let (width, height) = extents.get(node).copied().unwrap_or((0.0, 0.0));
            layout_box.scroll_width = layout_box.padding_box.width.max(width);
            layout_box.scroll_height = layout_box.padding_box.height.max(height);
        }
        self.document_width = doc_right;
        self.document_height = doc_bottom;
    }
}

/// Elements whose overflow on either axis is not `visible`.
pub(crate) fn creates_scroll_container(doc: &Document, node: NodeId) -> bool {
    if doc.dom.has_tag(node, "html") {
        return false;
    }
    ["overflow-x", "overflow-y"]
        .iter()
        .any(|axis| doc.computed_style(node, axis) != "visible")
}

fn classify_display(value: &str) -> Display {
    match value {
        "none" => Display::None,
        "inline" | "contents" => Display::Inline,
        "inline-block" | "inline-flex" | "inline-grid" | "inline-table" | "table-cell" => {
            Display::InlineBlock
        }
        _ => Display::Block,
    }
}

fn classify_position(value: &str) -> Position {
    match value {
        "relative" | "sticky" => Position::Relative,
        "absolute" => Position::Absolute,
        "fixed" => Position::Fixed,
        _ => Position::Static,
    }
}

/// Resolves a length against `base`. `auto`, unparsable values and
/// percentages of an unknown base are `None`.
fn resolve_length(raw: &str, base: Option<f64>) -> Option<f64> {
    let raw = raw.trim();
    if raw == "auto" || raw.is_empty() {
        return None;
    }
    if let Some(percent) = raw.strip_suffix('%') {
        let percent = percent.trim().parse::<f64>().ok()?;
        return base.map(|base| base * percent / 100.0);
    }
    parse_css_px(raw)
}

impl LayoutBuilder<'_> {
    fn display(&self, node: NodeId) -> Display {
        classify_display(&self.doc.computed_style(node, "display"))
    }

    fn position(&self, node: NodeId) -> Position {
        classify_position(&self.doc.computed_style(node, "position"))
    }

    fn length(&self, node: NodeId, property: &str, base: f64) -> Option<f64> {
        resolve_length(&self.doc.computed_style(node, property), Some(base))
    }

    fn is_border_box(&self, node: NodeId) -> bool {
        self.doc.computed_style(node, "box-sizing") == "border-box"
    }

    /// Relative offset applied to a box and its in-flow content.
    fn relative_offset(&self, node: NodeId, base_width: f64) -> Point {
        if self.position(node) != Position::Relative {
            return Point::default();
        }
        let dx = self
            .length(node, "left", base_width)
            .or_else(|| self.length(node, "right", base_width).map(|r| -r))
            .unwrap_or(0.0);
        let vertical =
            |property: &str| resolve_length(&self.doc.computed_style(node, property), None);
        let dy = vertical("top")
            .or_else(|| vertical("bottom").map(|b| -b))
            .unwrap_or(0.0);
        Point::new(dx, dy)
    }

    /// Content width from an explicit `width`, honoring `box-sizing`.
    fn explicit_content_width(&self, node: NodeId, base: f64, chrome: f64) -> Option<f64> {
        let width = self.length(node, "width", base)?;
        Some(if self.is_border_box(node) {
            (width - chrome).max(0.0)
        } else {
            width.max(0.0)
        })
    }

    fn explicit_content_height(&self, node: NodeId, base: Option<f64>, chrome: f64) -> Option<f64> {
        let height = resolve_length(&self.doc.computed_style(node, "height"), base)?;
        Some(if self.is_border_box(node) {
            (height - chrome).max(0.0)
        } else {
            height.max(0.0)
        })
    }

    fn record(
        &mut self,
        node: NodeId,
        border_box: Rect,
        border: Edges,
        containing_block: Option<NodeId>,
        fixed: bool,
    ) {
        let padding_box = Rect::new(
            border_box.left + border.left,
            border_box.top + border.top,
            (border_box.width - border.horizontal()).max(0.0),
            (border_box.height - border.vertical()).max(0.0),
        );
        self.layout.boxes.insert(
            node,
            LayoutBox {
                border_box,
                padding_box,
                containing_block,
                fixed,
                scroll_width: 0.0,
                scroll_height: 0.0,
            },
        );
    }

    /// Lays out a block-level element whose margin box starts at `origin`.
    /// Returns the outer height consumed in the flow.
    fn layout_block(
        &mut self,
        node: NodeId,
        origin: Point,
        available_width: f64,
        containing_block: Option<NodeId>,
        context: Context,
    ) -> f64 {
        let margin = self.doc.edges(node, "margin", "");
        let border = self.doc.border_widths(node);
        let padding = self.doc.edges(node, "padding", "");
        let chrome_h = border.horizontal() + padding.horizontal();
        let chrome_v = border.vertical() + padding.vertical();

        let replaced = replaced_size(&self.doc.dom, node);
        let content_width = self
            .explicit_content_width(node, available_width, chrome_h)
            .or_else(|| replaced.map(|(w, _)| (w - chrome_h).max(0.0)))
            .unwrap_or_else(|| (available_width - margin.horizontal() - chrome_h).max(0.0));

        let offset = self.relative_offset(node, available_width);
        let left = origin.x + margin.left + offset.x;
        let top = origin.y + margin.top + offset.y;
        let content_origin =
            Point::new(left + border.left + padding.left, top + border.top + padding.top);

        let child_context = self.child_context(node, context);
        let content_height =
            self.layout_contents(node, content_origin, content_width, replaced, child_context);
        let content_height = self
            .explicit_content_height(node, None, chrome_v)
            .or_else(|| replaced.map(|(_, h)| (h - chrome_v).max(0.0)))
            .unwrap_or(content_height);

        let border_box = Rect::new(left, top, content_width + chrome_h, content_height + chrome_v);
        self.record(node, border_box, border, containing_block, false);
        margin.top + border_box.height + margin.bottom
    }

    fn child_context(&self, node: NodeId, context: Context) -> Context {
        if self.position(node) == Position::Static {
            context
        } else {
            Context {
                positioned: Some(node),
            }
        }
    }

    /// Lays out the children of `node` (or its SVG shapes) and returns the
    /// content height.
    fn layout_contents(
        &mut self,
        node: NodeId,
        origin: Point,
        width: f64,
        replaced: Option<(f64, f64)>,
        context: Context,
    ) -> f64 {
        if self.doc.dom.has_tag(node, "svg") {
            self.layout_svg_shapes(node, origin);
            return 0.0;
        }
        if replaced.is_some() {
            return 0.0;
        }
        self.layout_flow(node, origin, width, context)
    }

    /// Block formatting of `parent`'s children: block boxes stack, runs of
    /// inline content form a single unwrapped line.
    fn layout_flow(&mut self, parent: NodeId, origin: Point, width: f64, context: Context) -> f64 {
        let mut cursor_y = origin.y;
        let mut line: Option<Line> = None;
        let white_space = self.doc.computed_style(parent, "white-space");

        for child in self.doc.dom.children(parent).to_vec() {
            if let Some(text) = self.doc.dom.text(child) {
                let text_width = text_width(text, &white_space);
                if text_width > 0.0 {
                    let current = line.get_or_insert(Line {
                        x: origin.x,
                        y: cursor_y,
                        height: 0.0,
                    });
                    current.x += text_width;
                    current.height = current.height.max(text_height(text, &white_space));
                }
                continue;
            }
            let display = self.display(child);
            if display == Display::None {
                continue;
            }
            let position = self.position(child);
            if matches!(position, Position::Absolute | Position::Fixed) {
                let static_origin = line
                    .map(|l| Point::new(l.x, l.y))
                    .unwrap_or(Point::new(origin.x, cursor_y));
                self.defer(child, static_origin, position, context);
                continue;
            }

            let block_level = display == Display::Block
                || (display == Display::Inline && self.has_block_child(child));
            if block_level {
                if let Some(done) = line.take() {
                    cursor_y = done.y + done.height;
                }
                cursor_y += self.layout_block(
                    child,
                    Point::new(origin.x, cursor_y),
                    width,
                    Some(parent),
                    context,
                );
                continue;
            }

            let current = line.get_or_insert(Line {
                x: origin.x,
                y: cursor_y,
                height: 0.0,
            });
            if display == Display::InlineBlock {
                let at = Point::new(current.x, current.y);
                let (outer_width, outer_height) =
                    self.layout_atomic(child, at, width, Some(parent), context);
                current.x += outer_width;
                current.height = current.height.max(outer_height);
            } else {
                self.layout_inline(child, current, width, Some(parent), context);
            }
        }

        if let Some(done) = line {
            cursor_y = done.y + done.height;
        }
        cursor_y - origin.y
    }

    fn has_block_child(&self, node: NodeId) -> bool {
        self.doc
            .dom
            .element_children(node)
            .into_iter()
            .any(|child| {
                self.display(child) == Display::Block && self.position(child) == Position::Static
            })
    }

    fn defer(&mut self, node: NodeId, static_origin: Point, position: Position, context: Context) {
        let fixed = position == Position::Fixed;
        self.deferred.push(Deferred {
            node,
            static_origin,
            containing_block: if fixed { None } else { context.positioned },
            fixed,
        });
    }

    /// A non-atomic inline box: spans its content on the current line.
    fn layout_inline(
        &mut self,
        node: NodeId,
        line: &mut Line,
        available_width: f64,
        containing_block: Option<NodeId>,
        context: Context,
    ) {
        let margin = self.doc.edges(node, "margin", "");
        let border = self.doc.border_widths(node);
        let padding = self.doc.edges(node, "padding", "");
        let start_x = line.x + margin.left;
        line.x = start_x + border.left + padding.left;
        let white_space = self.doc.computed_style(node, "white-space");
        let child_context = self.child_context(node, context);
        let mut height = LINE_HEIGHT;

        for child in self.doc.dom.children(node).to_vec() {
            if let Some(text) = self.doc.dom.text(child) {
                line.x += text_width(text, &white_space);
                height = height.max(text_height(text, &white_space));
                continue;
            }
            let display = self.display(child);
            if display == Display::None {
                continue;
            }
            let position = self.position(child);
            if matches!(position, Position::Absolute | Position::Fixed) {
                self.defer(child, Point::new(line.x, line.y), position, child_context);
                continue;
            }
            if display == Display::Inline {
                self.layout_inline(child, line, available_width, Some(node), child_context);
            } else {
                let (outer_width, outer_height) = self.layout_atomic(
                    child,
                    Point::new(line.x, line.y),
                    available_width,
                    Some(node),
                    child_context,
                );
                line.x += outer_width;
                height = height.max(outer_height);
            }
        }

        line.x += padding.right + border.right;
        let offset = self.relative_offset(node, available_width);
        let border_box = Rect::new(
            start_x + offset.x,
            line.y + offset.y,
            line.x - start_x,
            height + padding.vertical() + border.vertical(),
        );
        line.x += margin.right;
        line.height = line.height.max(border_box.height + margin.vertical());
        self.record(node, border_box, border, containing_block, false);
    }

    /// An inline-level box with its own size (controls, inline-block).
    /// Returns its outer width and height.
    fn layout_atomic(
        &mut self,
        node: NodeId,
        origin: Point,
        available_width: f64,
        containing_block: Option<NodeId>,
        context: Context,
    ) -> (f64, f64) {
        let margin = self.doc.edges(node, "margin", "");
        let border = self.doc.border_widths(node);
        let padding = self.doc.edges(node, "padding", "");
        let chrome_h = border.horizontal() + padding.horizontal();
        let chrome_v = border.vertical() + padding.vertical();
        let replaced = replaced_size(&self.doc.dom, node);

        let content_width = self
            .explicit_content_width(node, available_width, chrome_h)
            .or_else(|| replaced.map(|(w, _)| (w - chrome_h).max(0.0)))
            .unwrap_or_else(|| self.intrinsic_content_width(node));

        let offset = self.relative_offset(node, available_width);
        let left = origin.x + margin.left + offset.x;
        let top = origin.y + margin.top + offset.y;
        let content_origin =
            Point::new(left + border.left + padding.left, top + border.top + padding.top);
        let child_context = self.child_context(node, context);
        let content_height =
            self.layout_contents(node, content_origin, content_width, replaced, child_context);
        let content_height = self
            .explicit_content_height(node, None, chrome_v)
            .or_else(|| replaced.map(|(_, h)| (h - chrome_v).max(0.0)))
            .unwrap_or(content_height);

        let border_box = Rect::new(left, top, content_width + chrome_h, content_height + chrome_v);
        self.record(node, border_box, border, containing_block, false);
        (
            border_box.width + margin.horizontal(),
            border_box.height + margin.vertical(),
        )
    }

    fn layout_out_of_flow(&mut self, deferred: Deferred) {
        let node = deferred.node;
        let viewport = Rect::new(0.0, 0.0, self.doc.viewport.width, self.doc.viewport.height);
        let cb_rect = deferred
            .containing_block
            .and_then(|cb| self.layout.get(cb))
            .map(|b| b.padding_box)
            .unwrap_or(viewport);
        let static_origin = if deferred.fixed {
            Point::new(
                deferred.static_origin.x - self.doc.viewport.scroll_x,
                deferred.static_origin.y - self.doc.viewport.scroll_y,
            )
        } else {
            deferred.static_origin
        };

        let margin = self.doc.edges(node, "margin", "");
        let border = self.doc.border_widths(node);
        let padding = self.doc.edges(node, "padding", "");
        let chrome_h = border.horizontal() + padding.horizontal();
        let chrome_v = border.vertical() + padding.vertical();
        let inset_left = self.length(node, "left", cb_rect.width);
        let inset_right = self.length(node, "right", cb_rect.width);
        let inset_top = self.length(node, "top", cb_rect.height);
        let inset_bottom = self.length(node, "bottom", cb_rect.height);
        let replaced = replaced_size(&self.doc.dom, node);

        let content_width = self
            .explicit_content_width(node, cb_rect.width, chrome_h)
            .or_else(|| replaced.map(|(w, _)| (w - chrome_h).max(0.0)))
            .or_else(|| match (inset_left, inset_right) {
                (Some(l), Some(r)) => {
                    Some((cb_rect.width - l - r - margin.horizontal() - chrome_h).max(0.0))
                }
                _ => None,
            })
            .unwrap_or_else(|| self.intrinsic_content_width(node));
        let border_width = content_width + chrome_h;

        let left = match (inset_left, inset_right) {
            (Some(l), _) => cb_rect.left + l + margin.left,
            (None, Some(r)) => cb_rect.right() - r - margin.right - border_width,
            (None, None) => static_origin.x + margin.left,
        };
        let provisional_top = inset_top
            .map(|t| cb_rect.top + t + margin.top)
            .unwrap_or(static_origin.y + margin.top);

        let content_origin = Point::new(
            left + border.left + padding.left,
            provisional_top + border.top + padding.top,
        );
        let child_context = Context {
            positioned: Some(node),
        };
        let content_height =
            self.layout_contents(node, content_origin, content_width, replaced, child_context);
        let content_height = self
            .explicit_content_height(node, Some(cb_rect.height), chrome_v)
            .or_else(|| replaced.map(|(_, h)| (h - chrome_v).max(0.0)))
            .or_else(|| match (inset_top, inset_bottom) {
                (Some(t), Some(b)) => {
                    Some((cb_rect.height - t - b - margin.vertical() - chrome_v).max(0.0))
                }
                _ => None,
            })
            .unwrap_or(content_height);
        let border_height = content_height + chrome_v;

        let top = match (inset_top, inset_bottom) {
            (None, Some(b)) => cb_rect.bottom() - b - margin.bottom - border_height,
            _ => provisional_top,
        };
        if top != provisional_top {
            self.translate_descendants(node, top - provisional_top);
        }

        let border_box = Rect::new(left, top, border_width, border_height);
        self.record(node, border_box, border, deferred.containing_block, deferred.fixed);
    }

    fn translate_descendants(&mut self, node: NodeId, dy: f64) {
        let mut descendants = Vec::new();
        self.doc.dom.collect_elements_descendants_dfs(node, &mut descendants);
        for descendant in descendants {
            if let Some(layout_box) = self.layout.boxes.get_mut(&descendant) {
                layout_box.border_box = layout_box.border_box.translate(0.0, dy);
                layout_box.padding_box = layout_box.padding_box.translate(0.0, dy);
            }
        }
    }

    /// Shrink-to-fit width of `node`'s content, excluding its own chrome.
    fn intrinsic_content_width(&self, node: NodeId) -> f64 {
        let white_space = self.doc.computed_style(node, "white-space");
        let mut widest: f64 = 0.0;
        let mut run: f64 = 0.0;
        for child in self.doc.dom.children(node) {
            if let Some(text) = self.doc.dom.text(*child) {
                run += text_width(text, &white_space);
                continue;
            }
            let display = self.display(*child);
            if display == Display::None
                || matches!(self.position(*child), Position::Absolute | Position::Fixed)
            {
                continue;
            }
            let outer = self.intrinsic_outer_width(*child);
            if display == Display::Block {
                widest = widest.max(run).max(outer);
                run = 0.0;
            } else {
                run += outer;
            }
        }
        widest.max(run)
    }

    fn intrinsic_outer_width(&self, node: NodeId) -> f64 {
        let margin = self.doc.edges(node, "margin", "");
        let border = self.doc.border_widths(node);
        let padding = self.doc.edges(node, "padding", "");
        let chrome_h = border.horizontal() + padding.horizontal();
        let border_width = self
            .explicit_content_width(node, 0.0, chrome_h)
            .map(|w| w + chrome_h)
            .or_else(|| replaced_size(&self.doc.dom, node).map(|(w, _)| w))
            .unwrap_or_else(|| self.intrinsic_content_width(node) + chrome_h);
        border_width + margin.horizontal()
    }

    /// Boxes for SVG shapes, from their geometry attributes.
    fn layout_svg_shapes(&mut self, svg: NodeId, origin: Point) {
        for child in self.doc.dom.element_children(svg) {
            if self.display(child) == Display::None {
                continue;
            }
            self.layout_svg_shapes(child, origin);
            let shape = svg_shape_rect(&self.doc.dom, child).or_else(|| {
                let rects = self
                    .doc
                    .dom
                    .element_children(child)
                    .into_iter()
                    .filter_map(|c| self.layout.get(c).map(|b| b.border_box))
                    .flat_map(|r| [Point::new(r.left, r.top), Point::new(r.right(), r.bottom())])
                    .collect::<Vec<_>>();
                Rect::bounding(&rects).map(|r| r.translate(-origin.x, -origin.y))
            });
            if let Some(rect) = shape {
                let placed = rect.translate(origin.x, origin.y);
                self.record(child, placed, Edges::default(), Some(svg), false);
            }
        }
    }
}

fn text_width(text: &str, white_space: &str) -> f64 {
    if white_space.starts_with("pre") {
        let widest = text.lines().map(char_len).max().unwrap_or(0);
        return widest as f64 * CHAR_WIDTH;
    }
    if text.trim().is_empty() {
        return 0.0;
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = char_len(&collapsed);
    if text.starts_with(char::is_whitespace) {
        chars += 1;
    }
    if text.ends_with(char::is_whitespace) {
        chars += 1;
    }
    chars as f64 * CHAR_WIDTH
}

fn text_height(text: &str, white_space: &str) -> f64 {
    if white_space.starts_with("pre") {
        return text.lines().count().max(1) as f64 * LINE_HEIGHT;
    }
    LINE_HEIGHT
}

fn attr_px(dom: &Dom, node: NodeId, name: &str) -> Option<f64> {
    dom.attr(node, name).and_then(|value| parse_css_px(&value))
}

/// Default border-box size of replaced elements and form controls.
fn replaced_size(dom: &Dom, node: NodeId) -> Option<(f64, f64)> {
    let element = dom.element(node)?;
    let tag = element.tag_name.to_ascii_lowercase();
    let sized = |w: f64, h: f64| {
        Some((
            attr_px(dom, node, "width").unwrap_or(w),
            attr_px(dom, node, "height").unwrap_or(h),
        ))
    };
    match tag.as_str() {
        "input" => match input_type(element).as_str() {
            "checkbox" | "radio" => Some((13.0, 13.0)),
            "submit" | "reset" | "button" => {
                let label = element.attrs.get("value").cloned().unwrap_or_else(|| {
                    match input_type(element).as_str() {
                        "submit" => "Submit".to_string(),
                        "reset" => "Reset".to_string(),
                        _ => String::new(),
                    }
                });
                Some((char_len(&label) as f64 * CHAR_WIDTH + 16.0, 20.0))
            }
            "image" => sized(0.0, 0.0),
            "range" => Some((130.0, 20.0)),
            "color" => Some((50.0, 20.0)),
            "file" => Some((250.0, 20.0)),
            _ => {
                let width = element
                    .attrs
                    .get("size")
                    .and_then(|size| size.parse::<f64>().ok())
                    .map(|size| size * CHAR_WIDTH + 6.0)
                    .unwrap_or(150.0);
                Some((width, 20.0))
            }
        },
        "select" => Some((120.0, 20.0)),
        "textarea" => {
            let cols = element.attrs.get("cols").and_then(|c| c.parse::<f64>().ok());
            let rows = element.attrs.get("rows").and_then(|r| r.parse::<f64>().ok());
            Some((
                cols.map(|c| c * CHAR_WIDTH).unwrap_or(160.0),
                rows.map(|r| r * LINE_HEIGHT).unwrap_or(40.0),
            ))
        }
        "img" => sized(0.0, 0.0),
        "iframe" | "svg" | "video" | "canvas" | "object" | "embed" => sized(300.0, 150.0),
        _ => None,
    }
}

fn svg_numbers(raw: &str) -> Vec<f64> {
    let Some(pattern) = SVG_NUMBER.as_ref() else {
        return Vec::new();
    };
    pattern
        .find_iter(raw)
        .filter_map(|found| found.ok())
        .filter_map(|found| found.as_str().parse::<f64>().ok())
        .collect()
}

fn svg_points(raw: &str) -> Vec<Point> {
    svg_numbers(raw)
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Rect of a basic SVG shape relative to its `svg` viewport.
fn svg_shape_rect(dom: &Dom, node: NodeId) -> Option<Rect> {
    let number = |name: &str| attr_px(dom, node, name).unwrap_or(0.0);
    let tag = dom.tag_name(node)?.to_ascii_lowercase();
    match tag.as_str() {
        "rect" | "image" | "foreignobject" => Some(Rect::new(
            number("x"),
            number("y"),
            number("width"),
            number("height"),
        )),
        "circle" => {
            let r = number("r");
            Some(Rect::new(number("cx") - r, number("cy") - r, r * 2.0, r * 2.0))
        }
        "ellipse" => {
            let (rx, ry) = (number("rx"), number("ry"));
            Some(Rect::new(number("cx") - rx, number("cy") - ry, rx * 2.0, ry * 2.0))
        }
        "line" => Rect::bounding(&[
            Point::new(number("x1"), number("y1")),
            Point::new(number("x2"), number("y2")),
        ]),
        "path" => Rect::bounding(&svg_points(&dom.attr(node, "d").unwrap_or_default())),
        "polygon" | "polyline" => {
            Rect::bounding(&svg_points(&dom.attr(node, "points").unwrap_or_default()))
        }
        _ => None,
    }
}

impl Document {
    pub(crate) fn layout(&self) -> Layout {
        Layout::compute(self)
    }

    /// Client rect of `node` under `layout`: page box minus the scroll of
    /// every containing block and, unless fixed, of the window.
    pub(crate) fn client_rect(&self, layout: &Layout, node: NodeId) -> Rect {
        if self.dom.has_tag(node, "html") {
            return Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height);
        }
        if self.dom.has_tag(node, "area") {
            return self.area_rect(layout, node).unwrap_or_default();
        }
        if self.dom.has_tag(node, "map") {
            return self
                .image_for_map(node)
                .map(|img| self.client_rect(layout, img))
                .unwrap_or_default();
        }
        if let Some(select) = self
            .dom
            .owning_select(node)
            .filter(|_| self.dom.has_tag(node, "option") || self.dom.has_tag(node, "optgroup"))
        {
            return self.client_rect(layout, select);
        }
        let Some(layout_box) = layout.get(node) else {
            return Rect::default();
        };
        let mut rect = layout_box.border_box;
        let mut fixed = layout_box.fixed;
        let mut cursor = layout_box.containing_block;
        while let Some(ancestor) = cursor {
            if let Some(element) = self.dom.element(ancestor) {
                rect = rect.translate(-element.scroll_left, -element.scroll_top);
            }
            let Some(ancestor_box) = layout.get(ancestor) else {
                break;
            };
            fixed = ancestor_box.fixed;
            cursor = ancestor_box.containing_block;
        }
        if fixed {
            rect
        } else {
            rect.translate(-self.viewport.scroll_x, -self.viewport.scroll_y)
        }
    }

    /// Client rect of the padding box, the region content scrolls within.
    pub(crate) fn client_padding_rect(&self, layout: &Layout, node: NodeId) -> Rect {
        let outer = self.client_rect(layout, node);
        if self.dom.has_tag(node, "html") {
            return outer;
        }
        let Some(layout_box) = layout.get(node) else {
            return outer;
        };
        Rect::new(
            outer.left + layout_box.padding_box.left - layout_box.border_box.left,
            outer.top + layout_box.padding_box.top - layout_box.border_box.top,
            layout_box.padding_box.width,
            layout_box.padding_box.height,
        )
    }

    fn image_for_map(&self, map: NodeId) -> Option<NodeId> {
        let name = self.dom.attr(map, "name").or_else(|| self.dom.attr(map, "id"))?;
        let target = format!("#{name}");
        self.dom
            .all_element_nodes()
            .into_iter()
            .find(|node| {
                self.dom.has_tag(*node, "img")
                    && self.dom.attr(*node, "usemap") == Some(target.clone())
            })
    }

    /// `<area>` rect from `shape`/`coords`, projected onto the image that
    /// uses its map.
    fn area_rect(&self, layout: &Layout, area: NodeId) -> Option<Rect> {
        let map = self.dom.find_ancestor_by_tag(area, "map")?;
        let image = self.image_for_map(map)?;
        let image_rect = self.client_rect(layout, image);
        let shape = self.dom.attr(area, "shape").unwrap_or_default().to_ascii_lowercase();
        let coords = svg_numbers(&self.dom.attr(area, "coords").unwrap_or_default());
        let local = match (shape.as_str(), coords.as_slice()) {
            ("default", _) => Rect::new(0.0, 0.0, image_rect.width, image_rect.height),
            ("circle" | "circ", [x, y, r, ..]) => Rect::new(x - r, y - r, r * 2.0, r * 2.0),
            ("poly" | "polygon", points) if points.len() >= 2 => Rect::bounding(
                &points
                    .chunks_exact(2)
                    .map(|pair| Point::new(pair[0], pair[1]))
                    .collect::<Vec<_>>(),
            )?,
            (_, [x1, y1, x2, y2, ..]) => Rect::new(*x1, *y1, x2 - x1, y2 - y1),
            _ => Rect::new(0.0, 0.0, 0.0, 0.0),
        };
        Some(local.translate(image_rect.left, image_rect.top))
    }

    /// Largest scroll offsets of an element, or of the window for `None`.
    pub(crate) fn max_scroll(&self, layout: &Layout, node: Option<NodeId>) -> (f64, f64) {
        match node.and_then(|n| layout.get(n)) {
            Some(layout_box) => (
                (layout_box.scroll_width - layout_box.padding_box.width).max(0.0),
                (layout_box.scroll_height - layout_box.padding_box.height).max(0.0),
            ),
            None if node.is_some() => (0.0, 0.0),
            None => (
                (layout.document_width - self.viewport.width).max(0.0),
                (layout.document_height - self.viewport.height).max(0.0),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_stack_and_inline_controls_share_a_line() -> Result<()> {
        let doc = Document::from_html(
            r#"<div id='a' style='height: 30px'></div>
               <div id='b'><input id='i'><button id='btn'>Go</button></div>"#,
        )?;
        let a = doc.select_one("#a")?;
        let b = doc.select_one("#b")?;
        let input = doc.select_one("#i")?;
        let button = doc.select_one("#btn")?;
        assert_eq!(doc.bounding_rect(a)?, Rect::new(0.0, 0.0, 800.0, 30.0));
        assert_eq!(doc.bounding_rect(b)?.top, 30.0);
        assert_eq!(doc.bounding_rect(input)?, Rect::new(0.0, 30.0, 150.0, 20.0));
        let button_rect = doc.bounding_rect(button)?;
        assert_eq!(button_rect.left, 150.0);
        assert_eq!(button_rect.width, 32.0);
        Ok(())
    }

    #[test]
    fn absolute_boxes_resolve_against_positioned_ancestor() -> Result<()> {
        let doc = Document::from_html(
            r#"<div style='position: relative; margin-top: 100px; width: 200px; height: 200px'>
                 <span id='s' style='position: absolute; right: 10px; bottom: 20px; width: 50px; height: 10px'></span>
               </div>"#,
        )?;
        let s = doc.select_one("#s")?;
        assert_eq!(doc.bounding_rect(s)?, Rect::new(140.0, 270.0, 50.0, 10.0));
        Ok(())
    }

    #[test]
    fn scrolled_container_shifts_children() -> Result<()> {
        let mut doc = Document::from_html(
            r#"<div id='box' style='overflow: auto; width: 100px; height: 100px'>
                 <div style='height: 300px'></div>
                 <div id='end' style='height: 10px'></div>
               </div>"#,
        )?;
        let container = doc.select_one("#box")?;
        let end = doc.select_one("#end")?;
        assert_eq!(doc.bounding_rect(end)?.top, 300.0);
        doc.set_scroll_offset(container, 0.0, 200.0)?;
        assert_eq!(doc.bounding_rect(end)?.top, 100.0);
        doc.set_scroll_offset(container, 0.0, 10_000.0)?;
        assert_eq!(doc.scroll_offset(container)?, (0.0, 210.0));
        Ok(())
    }

    #[test]
    fn svg_path_rect_comes_from_its_data() -> Result<()> {
        let doc = Document::from_html(
            r#"<svg width='100' height='100'><path id='p' d='M 10 20 L 60 20'/></svg>"#,
        )?;
        let path = doc.select_one("#p")?;
        assert_eq!(doc.bounding_rect(path)?, Rect::new(10.0, 20.0, 50.0, 0.0));
        Ok(())
    }

    #[test]
    fn area_rect_is_projected_onto_image() -> Result<()> {
        let doc = Document::from_html(
            r#"<div style='height: 40px'></div>
               <img usemap='#m' width='100' height='100'>
               <map name='m'><area id='r' shape='rect' coords='10,10,30,40'></map>"#,
        )?;
        let area = doc.select_one("#r")?;
        assert_eq!(doc.bounding_rect(area)?, Rect::new(10.0, 50.0, 20.0, 30.0));
        Ok(())
    }
}
