use super::*;

/// A parsed page: DOM, stylesheet, listeners, viewport and virtual clock.
///
/// Element handles are [`NodeId`]s borrowed from one document. Every
/// accessor that takes a handle checks that it still belongs to the live
/// tree and fails with [`Error::StaleElementReference`] otherwise.
#[derive(Debug)]
pub struct Document {
    pub(crate) dom: Dom,
    pub(crate) stylesheet: Stylesheet,
    pub(crate) style_source: &'static dyn StyleSource,
    pub(crate) viewport: Viewport,
    pub(crate) config: AtomConfig,
    pub(crate) listeners: ListenerStore,
    pub(crate) now_ms: i64,
    pub(crate) frames: Vec<(NodeId, Document)>,
    pub(crate) element_cache: ElementCache,
    pub(crate) xpath: Option<Box<dyn XPathEvaluator>>,
    pub(crate) resolver: Box<dyn Resolver>,
    pub(crate) alert: Option<String>,
    pub(crate) submissions: Vec<Submission>,
    pub(crate) trace_state: TraceState,
}

impl Document {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, AtomConfig::default())
    }

    /// Parses `html` and every `<iframe srcdoc>` in it; frames share the
    /// configuration.
    pub fn from_html_with_config(html: &str, config: AtomConfig) -> Result<Self> {
        let ParseOutput {
            dom,
            style_sheets,
            frames,
        } = parse_html(html)?;

        let mut doc = Self {
            dom,
            stylesheet: Stylesheet::parse(&style_sheets),
            style_source: config.style_source.source(),
            viewport: Viewport::from_config(&config),
            config,
            listeners: ListenerStore::default(),
            now_ms: 0,
            frames: Vec::new(),
            element_cache: ElementCache::default(),
            xpath: None,
            resolver: Box::new(DefaultResolver),
            alert: None,
            submissions: Vec::new(),
            trace_state: TraceState::default(),
        };
        for (iframe, srcdoc) in frames {
            let frame = Self::from_html_with_config(&srcdoc, doc.config.clone())?;
            doc.frames.push((iframe, frame));
        }
        tracing::debug!(
            nodes = doc.dom.nodes.len(),
            rules = doc.stylesheet.rules.len(),
            frames = doc.frames.len(),
            "document parsed"
        );
        Ok(doc)
    }

    pub fn config(&self) -> &AtomConfig {
        &self.config
    }

    /// The document node, the root of every locator search.
    pub fn root(&self) -> NodeId {
        self.dom.root
    }

    pub fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector_all(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::NoSuchElement(format!("no element matches selector: {selector}"))
            })
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    /// Focused element, else `<body>`.
    pub fn active_element(&self) -> NodeId {
        self.dom
            .active_element()
            .or_else(|| self.dom.body())
            .or_else(|| self.dom.document_element())
            .unwrap_or(self.dom.root)
    }

    pub fn tag_name(&self, node: NodeId) -> Result<String> {
        self.ensure_attached(node)?;
        Ok(self
            .dom
            .tag_name(node)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        self.ensure_attached(node)?;
        Ok(self.dom.attr(node, name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.ensure_attached(node)?;
        self.dom.set_attr(node, name, value)
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.ensure_attached(node)?;
        self.dom.remove_attr(node, name)
    }

    pub fn value(&self, node: NodeId) -> Result<String> {
        self.ensure_attached(node)?;
        self.dom.value(node)
    }

    /// Assigns a control's value without firing events.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.ensure_attached(node)?;
        self.dom.set_value(node, value)
    }

    pub fn checked(&self, node: NodeId) -> Result<bool> {
        self.ensure_attached(node)?;
        self.dom.checked(node)
    }

    /// Selection of a text control as character offsets.
    pub fn selection_range(&self, node: NodeId) -> Result<(usize, usize)> {
        self.ensure_attached(node)?;
        self.dom.selection_range(node)
    }

    pub fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize) -> Result<()> {
        self.ensure_attached(node)?;
        self.dom.set_selection_range(node, start, end)
    }

    pub fn text_content(&self, node: NodeId) -> Result<String> {
        self.ensure_attached(node)?;
        Ok(self.dom.text_content(node))
    }

    /// Detaches `node`; handles into the removed subtree become stale.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        self.ensure_attached(node)?;
        self.dom.remove_node(node)?;
        let mut removed = vec![node];
        self.dom.collect_elements_descendants_dfs(node, &mut removed);
        let dropped = removed
            .into_iter()
            .map(|node| self.listeners.clear_node(node))
            .sum::<usize>();
        tracing::trace!(node = %node, listeners = dropped, "node removed");
        Ok(())
    }

    /// Registers a listener. Handlers run synchronously during dispatch
    /// and may change the document; an error from a handler aborts the
    /// atom that fired the event.
    pub fn add_event_listener<F>(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        handler: F,
    ) where
        F: Fn(&mut Document, &mut Event) -> Result<()> + 'static,
    {
        self.listeners.add(
            node,
            event_type.to_string(),
            Listener {
                capture,
                handler: Rc::new(handler),
            },
        );
    }

    /// Fires a plain event at `node`.
    pub fn dispatch(&mut self, node: NodeId, event_type: &str) -> Result<Event> {
        self.ensure_attached(node)?;
        stacker::grow(32 * 1024 * 1024, || self.dispatch_event(node, event_type))
    }

    /// Bounding client rect, after scrolling.
    pub fn bounding_rect(&self, node: NodeId) -> Result<Rect> {
        self.ensure_attached(node)?;
        let layout = self.layout();
        Ok(self.client_rect(&layout, node))
    }

    pub fn clip_state(&self, node: NodeId) -> Result<ClipState> {
        self.ensure_attached(node)?;
        let layout = self.layout();
        Ok(self.clip_state_in(&layout, node, None))
    }

    pub fn interactability(&self, node: NodeId) -> Result<Verdict> {
        self.ensure_attached(node)?;
        let layout = self.layout();
        Ok(self.verdict_in(&layout, node))
    }

    /// Scrolls the element's scrollable ancestors by the least amount that
    /// brings it into view and reports what still clips it.
    pub fn scroll_into_view(&mut self, node: NodeId) -> Result<ClipState> {
        self.ensure_attached(node)?;
        self.scroll_region_into_view(node, None)
    }

    /// Like [`scroll_into_view`](Self::scroll_into_view) for the point at
    /// `offset` from the element's top-left corner.
    pub fn scroll_into_view_at(&mut self, node: NodeId, offset: Point) -> Result<ClipState> {
        self.ensure_attached(node)?;
        self.scroll_region_into_view(node, Some(offset))
    }

    pub fn scroll_offset(&self, node: NodeId) -> Result<(f64, f64)> {
        self.ensure_attached(node)?;
        Ok(self.container_scroll(node))
    }

    /// Sets an element's scroll offsets, clamped to its scroll range. The
    /// root element scrolls the window.
    pub fn set_scroll_offset(&mut self, node: NodeId, left: f64, top: f64) -> Result<()> {
        self.ensure_attached(node)?;
        let layout = self.layout();
        if self.dom.has_tag(node, "html") {
            let (max_x, max_y) = self.max_scroll(&layout, None);
            self.viewport.scroll_x = left.clamp(0.0, max_x);
            self.viewport.scroll_y = top.clamp(0.0, max_y);
            return Ok(());
        }
        let (max_x, max_y) = self.max_scroll(&layout, Some(node));
        let element = self
            .dom
            .element_mut(node)
            .ok_or_else(|| Error::InvalidElementState("scroll target is not an element".into()))?;
        element.scroll_left = left.clamp(0.0, max_x);
        element.scroll_top = top.clamp(0.0, max_y);
        Ok(())
    }

    pub fn window_scroll(&self) -> (f64, f64) {
        (self.viewport.scroll_x, self.viewport.scroll_y)
    }

    pub fn set_window_scroll(&mut self, x: f64, y: f64) {
        let layout = self.layout();
        let (max_x, max_y) = self.max_scroll(&layout, None);
        self.viewport.scroll_x = x.clamp(0.0, max_x);
        self.viewport.scroll_y = y.clamp(0.0, max_y);
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport.width, self.viewport.height)
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    /// Moves the virtual clock forward; event timestamps and the double
    /// click window read it.
    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::JavascriptError(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms;
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        self.trace_device(format!(
            "[clock] advance delta_ms={} from={} to={}",
            delta_ms, from, self.now_ms
        ));
        Ok(())
    }

    /// Form submissions that were not cancelled, oldest first.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Opens a modal alert; input atoms fail until it is dismissed.
    /// Listeners call this to emulate `window.alert`.
    pub fn open_alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "alert opened");
        self.alert = Some(message);
    }

    pub fn alert_text(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The frame document at `index` in tree order.
    pub fn select_frame_by_index(&mut self, index: usize) -> Result<&mut Document> {
        self.frames
            .get_mut(index)
            .map(|(_, frame)| frame)
            .ok_or_else(|| Error::NoSuchFrame(format!("Unable to locate frame: {index}")))
    }

    /// The frame whose `<iframe>` has the given id, or else the given name.
    pub fn select_frame_by_id_or_name(&mut self, key: &str) -> Result<&mut Document> {
        let index = self.frame_index_by_id_or_name(key)?;
        Ok(&mut self.frames[index].1)
    }

    /// Position of the frame whose `<iframe>` id, else name, equals `key`.
    pub fn frame_index_by_id_or_name(&self, key: &str) -> Result<usize> {
        let matches = |attr: &str| {
            self.frames
                .iter()
                .position(|(iframe, _)| self.dom.attr(*iframe, attr).as_deref() == Some(key))
        };
        matches("id")
            .or_else(|| matches("name"))
            .ok_or_else(|| Error::NoSuchFrame(format!("Unable to locate frame: {key}")))
    }

    /// The `<iframe>` element hosting frame `index`.
    pub fn frame_element(&self, index: usize) -> Result<NodeId> {
        self.frames
            .get(index)
            .map(|(iframe, _)| *iframe)
            .ok_or_else(|| Error::NoSuchFrame(format!("Unable to locate frame: {index}")))
    }

    pub fn set_xpath_evaluator(&mut self, evaluator: Box<dyn XPathEvaluator>) {
        self.xpath = Some(evaluator);
    }

    /// Replaces the built-in locator matching.
    pub fn set_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolver = resolver;
    }

    /// Stable `{"ELEMENT": ":wdc:N"}` handle for `node`.
    pub fn element_reference(&mut self, node: NodeId) -> Result<ElementReference> {
        self.ensure_attached(node)?;
        Ok(ElementReference {
            id: self.element_cache.store(node),
        })
    }

    pub fn resolve_reference(&self, reference: &ElementReference) -> Result<NodeId> {
        let node = self.element_cache.lookup(&reference.id).ok_or_else(|| {
            Error::StaleElementReference("Element does not exist in cache".into())
        })?;
        self.ensure_attached(node)?;
        Ok(node)
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_state.logs).into()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_devices(&mut self, enabled: bool) {
        self.trace_state.devices = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::JavascriptError(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    /// `node` is an element in this document's live tree.
    pub(crate) fn ensure_attached(&self, node: NodeId) -> Result<()> {
        if !self.dom.is_valid_node(node) {
            return Err(Error::StaleElementReference(
                "Element does not exist in cache".into(),
            ));
        }
        if !self.dom.is_connected(node) {
            return Err(Error::StaleElementReference(
                "Element is no longer attached to the DOM".into(),
            ));
        }
        if self.dom.element(node).is_none() {
            return Err(Error::InvalidElementState(format!("{node} is not an element")));
        }
        Ok(())
    }

    /// Input atoms refuse to run under an open alert or on stale handles.
    pub(crate) fn ensure_ready_for_input(&self, node: NodeId) -> Result<()> {
        if self.alert.is_some() {
            return Err(Error::UnexpectedAlertOpen("Modal dialog present".into()));
        }
        self.ensure_attached(node)
    }
}
