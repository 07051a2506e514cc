use super::*;

/// Where an event currently is on its propagation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

impl EventPhase {
    fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Capturing => "capture",
            Self::AtTarget => "target",
            Self::Bubbling => "bubble",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEventInit {
    pub client_x: f64,
    pub client_y: f64,
    pub button: MouseButton,
    /// Bit mask of the buttons held while the event fires.
    pub buttons: u16,
    /// Click count for `click`/`dblclick`, 0 otherwise.
    pub detail: u32,
    pub related_target: Option<NodeId>,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardEventInit {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    /// Character code, set on `keypress` only.
    pub char_code: u32,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventDetail {
    #[default]
    None,
    Mouse(MouseEventInit),
    Keyboard(KeyboardEventInit),
    #[serde(rename_all = "camelCase")]
    Input {
        data: Option<String>,
        input_type: String,
    },
}

/// A DOM event as seen by listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub immediate_propagation_stopped: bool,
    pub time_stamp_ms: i64,
    pub detail: EventDetail,
}

impl Event {
    pub fn new(event_type: &str, target: NodeId, time_stamp_ms: i64) -> Self {
        let (bubbles, cancelable) = event_flags(event_type);
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            phase: EventPhase::None,
            bubbles,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            time_stamp_ms,
            detail: EventDetail::None,
        }
    }

    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// No effect on events that are not cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn mouse(&self) -> Option<&MouseEventInit> {
        match &self.detail {
            EventDetail::Mouse(init) => Some(init),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&KeyboardEventInit> {
        match &self.detail {
            EventDetail::Keyboard(init) => Some(init),
            _ => None,
        }
    }
}

/// `(bubbles, cancelable)` for the event types the atoms fire.
fn event_flags(event_type: &str) -> (bool, bool) {
    match event_type {
        "focus" | "blur" | "mouseenter" | "mouseleave" | "pointerenter" | "pointerleave"
        | "toggle" | "scroll" => (false, false),
        "focusin" | "focusout" | "input" | "change" | "select" | "textInput" => {
            (true, event_type == "textInput")
        }
        _ => (true, true),
    }
}

pub type EventHandler = Rc<dyn Fn(&mut Document, &mut Event) -> Result<()>>;

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) handler: EventHandler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    pub(crate) map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default();
        if listeners.iter().any(|existing| {
            existing.capture == listener.capture && Rc::ptr_eq(&existing.handler, &listener.handler)
        }) {
            return;
        }
        listeners.push(listener);
    }

    /// Snapshot of the listeners for one phase; additions made while they run
    /// take effect on the next dispatch.
    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn clear_node(&mut self, node_id: NodeId) -> usize {
        self.map
            .remove(&node_id)
            .map(|events| events.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// A form submission that was not cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub form: NodeId,
    pub submitter: Option<NodeId>,
    pub time_ms: i64,
}

impl Document {
    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<Event> {
        let event = Event::new(event_type, target, self.now_ms);
        self.dispatch_prepared_event(event)
    }

    pub(crate) fn dispatch_mouse_event(
        &mut self,
        target: NodeId,
        event_type: &str,
        init: MouseEventInit,
    ) -> Result<Event> {
        let event =
            Event::new(event_type, target, self.now_ms).with_detail(EventDetail::Mouse(init));
        self.dispatch_prepared_event(event)
    }

    pub(crate) fn dispatch_keyboard_event(
        &mut self,
        target: NodeId,
        event_type: &str,
        init: KeyboardEventInit,
    ) -> Result<Event> {
        let event =
            Event::new(event_type, target, self.now_ms).with_detail(EventDetail::Keyboard(init));
        self.dispatch_prepared_event(event)
    }

    pub(crate) fn dispatch_input_event(
        &mut self,
        target: NodeId,
        event_type: &str,
        data: Option<&str>,
        input_type: &str,
    ) -> Result<Event> {
        let event = Event::new(event_type, target, self.now_ms).with_detail(EventDetail::Input {
            data: data.map(str::to_string),
            input_type: input_type.to_string(),
        });
        self.dispatch_prepared_event(event)
    }

    /// Runs capture, target and bubble phases over the target's ancestor
    /// path as it was when dispatch started. Listeners may mutate the
    /// document; a listener error aborts the dispatch.
    pub(crate) fn dispatch_prepared_event(&mut self, mut event: Event) -> Result<Event> {
        let target = event.target;
        let mut path = std::iter::once(target)
            .chain(self.dom.ancestors(target))
            .collect::<Vec<_>>();
        path.reverse();

        if path.len() >= 2 {
            for node in &path[..path.len() - 1] {
                event.phase = EventPhase::Capturing;
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, true)?;
                if event.propagation_stopped {
                    self.trace_event_done(&event, "propagation_stopped");
                    return Ok(event);
                }
            }
        }

        event.phase = EventPhase::AtTarget;
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if !event.propagation_stopped {
            self.invoke_listeners(target, &mut event, false)?;
        }
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }

        if event.bubbles && path.len() >= 2 {
            for node in path[..path.len() - 1].iter().rev() {
                event.phase = EventPhase::Bubbling;
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
                if event.propagation_stopped {
                    self.trace_event_done(&event, "propagation_stopped");
                    return Ok(event);
                }
            }
        }

        event.phase = EventPhase::None;
        event.current_target = target;
        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut Event,
        capture: bool,
    ) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace_state.enabled {
                let target_label = self.trace_node_label(event.target);
                let current_label = self.trace_node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type,
                    target_label,
                    current_label,
                    event.phase.label(),
                    event.default_prevented
                ));
            }
            (listener.handler)(self, event)?;
            if event.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn trace_event_done(&mut self, event: &Event, outcome: &str) {
        if !(self.trace_state.enabled && self.trace_state.events) {
            return;
        }
        let target_label = self.trace_node_label(event.target);
        self.trace_event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type, target_label, outcome, event.default_prevented
        ));
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        tracing::debug!(target: "dom_atoms::events", "{line}");
        if self.trace_state.enabled && self.trace_state.events {
            self.trace_line(line);
        }
    }

    /// Mouse, keyboard and scroll transitions.
    pub(crate) fn trace_device(&mut self, line: String) {
        tracing::trace!(target: "dom_atoms::devices", "{line}");
        if self.trace_state.enabled && self.trace_state.devices {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if self.trace_state.enabled {
            if self.trace_state.to_stderr {
                eprintln!("{line}");
            }
            if self.trace_state.logs.len() >= self.trace_state.log_limit {
                self.trace_state.logs.pop_front();
            }
            self.trace_state.logs.push_back(line);
        }
    }

    pub(crate) fn trace_node_label(&self, node: NodeId) -> String {
        if let Some(id) = self.dom.attr(node, "id").filter(|id| !id.is_empty()) {
            return format!("#{id}");
        }
        if let Some(tag) = self.dom.tag_name(node) {
            return tag.to_ascii_lowercase();
        }
        if node == self.dom.root {
            return "document".into();
        }
        node.to_string()
    }

    /// Moves focus to `node`, firing `blur`/`focusout` on the previous
    /// element first. Hidden inputs and disabled controls do not take focus.
    pub(crate) fn focus_node(&mut self, node: NodeId) -> Result<()> {
        if is_hidden_input(&self.dom, node) || is_effectively_disabled(&self.dom, node) {
            return Ok(());
        }
        if self.dom.active_element() == Some(node) {
            return Ok(());
        }
        if let Some(current) = self.dom.active_element() {
            self.blur_node(current)?;
        }
        self.dom.set_active_element(Some(node));
        self.dispatch_event(node, "focus")?;
        self.dispatch_event(node, "focusin")?;
        Ok(())
    }

    pub(crate) fn blur_node(&mut self, node: NodeId) -> Result<()> {
        if self.dom.active_element() != Some(node) {
            return Ok(());
        }
        self.dom.set_active_element(None);
        self.dispatch_event(node, "blur")?;
        self.dispatch_event(node, "focusout")?;
        Ok(())
    }

    /// Default actions of a `click` that was not cancelled.
    pub(crate) fn run_click_activation(&mut self, target: NodeId) -> Result<()> {
        if is_effectively_disabled(&self.dom, target) {
            return Ok(());
        }

        if let Some(control) = self.resolve_label_control(target) {
            if control != target {
                return self.click_node(control);
            }
        }

        if let Some(details) = self.resolve_details_for_summary_click(target) {
            if self.dom.has_attr(details, "open") {
                self.dom.remove_attr(details, "open")?;
            } else {
                self.dom.set_attr(details, "open", "")?;
            }
            self.dispatch_event(details, "toggle")?;
        }

        if is_checkbox_input(&self.dom, target) {
            let current = self.dom.checked(target)?;
            self.dom.set_checked(target, !current)?;
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "change")?;
        }

        if is_radio_input(&self.dom, target) && !self.dom.checked(target)? {
            self.dom.set_checked(target, true)?;
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "change")?;
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = form_owner(&self.dom, target) {
                self.request_form_submit(form, Some(target))?;
            }
        }
        Ok(())
    }

    /// A bare `click` plus its activation behaviour, as fired on the
    /// control a label forwards to.
    pub(crate) fn click_node(&mut self, target: NodeId) -> Result<()> {
        let click = self.dispatch_mouse_event(
            target,
            "click",
            MouseEventInit {
                client_x: 0.0,
                client_y: 0.0,
                button: MouseButton::Primary,
                buttons: 0,
                detail: 1,
                related_target: None,
                modifiers: Modifiers::default(),
            },
        )?;
        if click.default_prevented {
            return Ok(());
        }
        self.run_click_activation(target)
    }

    fn resolve_label_control(&self, target: NodeId) -> Option<NodeId> {
        let label = std::iter::once(target)
            .chain(self.dom.ancestors(target))
            .find(|node| self.dom.has_tag(*node, "label"))?;
        // Clicks on a control inside its own label stay on the control.
        if label != target && is_form_control(&self.dom, target) {
            return None;
        }
        if let Some(for_id) = self.dom.attr(label, "for") {
            return self
                .dom
                .by_id(&for_id)
                .filter(|node| is_form_control(&self.dom, *node));
        }
        let mut descendants = Vec::new();
        self.dom.collect_elements_descendants_dfs(label, &mut descendants);
        descendants
            .into_iter()
            .find(|node| is_form_control(&self.dom, *node) && !is_hidden_input(&self.dom, *node))
    }

    fn resolve_details_for_summary_click(&self, target: NodeId) -> Option<NodeId> {
        let summary = std::iter::once(target)
            .chain(self.dom.ancestors(target))
            .find(|node| self.dom.has_tag(*node, "summary"))?;
        let details = self.dom.parent_element(summary)?;
        if !self.dom.has_tag(details, "details") {
            return None;
        }
        let first_summary = self
            .dom
            .element_children(details)
            .into_iter()
            .find(|child| self.dom.has_tag(*child, "summary"));
        (first_summary == Some(summary)).then_some(details)
    }

    /// Fires `submit` on the form and records the submission unless a
    /// listener cancels it.
    pub(crate) fn request_form_submit(
        &mut self,
        form: NodeId,
        submitter: Option<NodeId>,
    ) -> Result<()> {
        let outcome = self.dispatch_event(form, "submit")?;
        if outcome.default_prevented {
            return Ok(());
        }
        tracing::debug!(form = %form, submitter = ?submitter, "form submitted");
        self.submissions.push(Submission {
            form,
            submitter,
            time_ms: self.now_ms,
        });
        Ok(())
    }

    /// Enter in a single-line field: click the default button, or submit
    /// directly when the form has no submit button and one text field.
    pub(crate) fn implicit_submit(&mut self, field: NodeId) -> Result<()> {
        let Some(form) = form_owner(&self.dom, field) else {
            return Ok(());
        };
        if let Some(button) = default_submit_button(&self.dom, form) {
            if !is_effectively_disabled(&self.dom, button) {
                self.click_node(button)?;
            }
            return Ok(());
        }
        if implicit_submission_blockers(&self.dom, form) <= 1 {
            self.request_form_submit(form, None)?;
        }
        Ok(())
    }
}
