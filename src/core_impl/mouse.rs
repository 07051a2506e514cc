use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

impl MouseButton {
    /// `MouseEvent.button`.
    pub fn index(self) -> u16 {
        match self {
            Self::Primary => 0,
            Self::Middle => 1,
            Self::Secondary => 2,
        }
    }

    /// Bit for `MouseEvent.buttons`.
    pub fn mask(self) -> u16 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Middle => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Middle => "middle",
            Self::Secondary => "secondary",
        }
    }
}

/// The virtual mouse between atom calls.
///
/// Callers create a default state per session and thread the value returned
/// by one atom into the next. Illegal transitions fail before any event is
/// dispatched and leave the state untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MouseDeviceState {
    pub pressed_button: Option<MouseButton>,
    /// Element the pointer is over.
    pub last_element: Option<NodeId>,
    pub client_xy: Point,
    /// The next primary click on the same element is a double click.
    pub double_click_armed: bool,
    pub ever_interacted: bool,
    pub press_target: Option<NodeId>,
    pub armed_at_ms: Option<i64>,
}

impl MouseDeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the pointer over `element`, at `offset` from its top-left
    /// corner or at its center. Fires `mouseout` on the element being left
    /// and `mouseover` on the new one when the element changes, then
    /// `mousemove`.
    pub fn move_to(
        &mut self,
        doc: &mut Document,
        element: NodeId,
        offset: Option<Point>,
    ) -> Result<()> {
        doc.ensure_ready_for_input(element)?;
        let verdict = doc.interactability(element)?;
        if !verdict.displayed {
            return Err(Error::ElementNotInteractable(
                "Element is not currently visible and may not be manipulated".into(),
            ));
        }
        if doc.computed_style(element, "pointer-events") == "none" {
            return Err(Error::ElementNotInteractable(
                "Element is not currently interactable and may not be manipulated".into(),
            ));
        }

        let rect = doc.bounding_rect(element)?;
        let point = match offset {
            Some(offset) => Point::new(rect.left + offset.x, rect.top + offset.y),
            None => rect.center(),
        };
        let previous = self
            .last_element
            .filter(|node| doc.dom.is_connected(*node));
        doc.trace_device(format!(
            "[mouse] move target={} x={} y={}",
            doc.trace_node_label(element),
            point.x,
            point.y
        ));

        self.client_xy = point;
        self.last_element = Some(element);
        self.ever_interacted = true;

        if previous != Some(element) {
            self.double_click_armed = false;
            self.armed_at_ms = None;
            if let Some(previous) = previous {
                self.fire(doc, previous, "mouseout", MouseButton::Primary, 0, Some(element))?;
            }
            self.fire(doc, element, "mouseover", MouseButton::Primary, 0, previous)?;
        }
        self.fire(doc, element, "mousemove", MouseButton::Primary, 0, None)?;
        Ok(())
    }

    /// Presses `button` over the current element. Focus moves on a primary
    /// press that is not cancelled; options change selection right away.
    pub fn press(&mut self, doc: &mut Document, button: MouseButton) -> Result<()> {
        if self.pressed_button.is_some() {
            return Err(Error::InvalidElementState(
                "Cannot press more than one button or an already pressed button.".into(),
            ));
        }
        let target = self.hovered(doc)?;
        doc.trace_device(format!(
            "[mouse] press button={} target={}",
            button.label(),
            doc.trace_node_label(target)
        ));

        self.pressed_button = Some(button);
        self.press_target = Some(target);
        let mousedown = self.fire(doc, target, "mousedown", button, 0, None)?;

        if button == MouseButton::Primary && !mousedown.default_prevented {
            self.move_focus(doc, target)?;
        }
        if button == MouseButton::Primary && doc.dom.has_tag(target, "option") {
            if let Err(err) = toggle_option(doc, target) {
                self.pressed_button = None;
                self.press_target = None;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Releases `button` over the current element. A primary release on the
    /// pressed element clicks it, and a second click within the configured
    /// window also fires `dblclick`. A secondary release opens the context
    /// menu.
    pub fn release(&mut self, doc: &mut Document, button: MouseButton) -> Result<()> {
        match self.pressed_button {
            None => {
                return Err(Error::InvalidElementState(
                    "Cannot release a button when no button is pressed.".into(),
                ));
            }
            Some(pressed) if pressed != button => {
                return Err(Error::InvalidElementState(format!(
                    "Cannot release the {} button while the {} button is pressed.",
                    button.label(),
                    pressed.label()
                )));
            }
            Some(_) => {}
        }
        let target = self.hovered(doc)?;
        doc.trace_device(format!(
            "[mouse] release button={} target={}",
            button.label(),
            doc.trace_node_label(target)
        ));

        let press_target = self.press_target.take();
        self.pressed_button = None;
        self.fire(doc, target, "mouseup", button, 0, None)?;

        match button {
            MouseButton::Primary if press_target == Some(target) => {
                self.click(doc, target)?;
            }
            MouseButton::Secondary => {
                self.fire(doc, target, "contextmenu", button, 0, None)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn click(&mut self, doc: &mut Document, target: NodeId) -> Result<()> {
        // Disabled controls swallow clicks.
        if is_effectively_disabled(&doc.dom, target) {
            return Ok(());
        }
        let click = self.fire(doc, target, "click", MouseButton::Primary, 1, None)?;
        if !click.default_prevented {
            doc.run_click_activation(target)?;
        }

        let window = i64::try_from(doc.config.double_click_window_ms).unwrap_or(i64::MAX);
        let within_window = self
            .armed_at_ms
            .is_some_and(|armed_at| doc.now_ms.saturating_sub(armed_at) <= window);
        if self.double_click_armed && within_window {
            self.double_click_armed = false;
            self.armed_at_ms = None;
            self.fire(doc, target, "dblclick", MouseButton::Primary, 2, None)?;
        } else {
            self.double_click_armed = true;
            self.armed_at_ms = Some(doc.now_ms);
        }
        Ok(())
    }

    fn hovered(&self, doc: &Document) -> Result<NodeId> {
        let target = self.last_element.ok_or_else(|| {
            Error::InvalidElementState("Mouse has not been moved to an element.".into())
        })?;
        doc.ensure_ready_for_input(target)?;
        Ok(target)
    }

    fn move_focus(&self, doc: &mut Document, target: NodeId) -> Result<()> {
        let focus_target = if doc.dom.has_tag(target, "option") {
            doc.dom.owning_select(target)
        } else {
            std::iter::once(target)
                .chain(doc.dom.ancestors(target))
                .find(|node| is_focusable(&doc.dom, *node))
        };
        match focus_target {
            Some(node) => doc.focus_node(node),
            None => match doc.dom.active_element() {
                Some(current) => doc.blur_node(current),
                None => Ok(()),
            },
        }
    }

    /// Fires the pointer counterpart first when emulation is on.
    fn fire(
        &self,
        doc: &mut Document,
        target: NodeId,
        event_type: &str,
        button: MouseButton,
        detail: u32,
        related_target: Option<NodeId>,
    ) -> Result<Event> {
        let init = MouseEventInit {
            client_x: self.client_xy.x,
            client_y: self.client_xy.y,
            button,
            buttons: self.pressed_button.map(MouseButton::mask).unwrap_or(0),
            detail,
            related_target,
            modifiers: Modifiers::default(),
        };
        if doc.config.emulate_pointer_events {
            if let Some(pointer_type) = pointer_counterpart(event_type) {
                doc.dispatch_mouse_event(target, pointer_type, init.clone())?;
            }
        }
        doc.dispatch_mouse_event(target, event_type, init)
    }
}

fn pointer_counterpart(event_type: &str) -> Option<&'static str> {
    match event_type {
        "mouseover" => Some("pointerover"),
        "mouseout" => Some("pointerout"),
        "mousemove" => Some("pointermove"),
        "mousedown" => Some("pointerdown"),
        "mouseup" => Some("pointerup"),
        _ => None,
    }
}

/// Selects the option (toggles it in a multiple select) and reports the
/// change on the select.
fn toggle_option(doc: &mut Document, option: NodeId) -> Result<()> {
    let select = doc.dom.owning_select(option).ok_or_else(|| {
        Error::ElementNotSelectable("Option is not inside a select element".into())
    })?;
    if is_effectively_disabled(&doc.dom, option) {
        return Err(Error::ElementNotSelectable(
            "You may not select a disabled option".into(),
        ));
    }
    let selected = doc.dom.option_selected(option);
    let next = if doc.dom.is_multiple_select(select) {
        !selected
    } else {
        true
    };
    if next == selected {
        return Ok(());
    }
    doc.dom.set_option_selected(option, next)?;
    doc.dispatch_event(select, "input")?;
    doc.dispatch_event(select, "change")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn event_log(doc: &mut Document, types: &[&str]) -> Result<Rc<RefCell<Vec<String>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let root = doc.select_one("html")?;
        for event_type in types {
            let log = Rc::clone(&log);
            doc.add_event_listener(root, event_type, true, move |doc, event| {
                log.borrow_mut().push(format!(
                    "{} {}",
                    event.event_type,
                    doc.trace_node_label(event.target)
                ));
                Ok(())
            });
        }
        Ok(log)
    }

    #[test]
    fn simple_click_fires_in_order() -> Result<()> {
        let mut doc = Document::from_html("<button id='a'>a</button><button id='b'>b</button>")?;
        let a = doc.select_one("#a")?;
        let b = doc.select_one("#b")?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, a, None)?;
        let log = event_log(
            &mut doc,
            &["mouseout", "mouseover", "mousemove", "mousedown", "focus", "mouseup", "click"],
        )?;
        mouse.move_to(&mut doc, b, None)?;
        mouse.press(&mut doc, MouseButton::Primary)?;
        mouse.release(&mut doc, MouseButton::Primary)?;
        assert_eq!(
            log.borrow().as_slice(),
            [
                "mouseout #a",
                "mouseover #b",
                "mousemove #b",
                "mousedown #b",
                "focus #b",
                "mouseup #b",
                "click #b"
            ]
        );
        Ok(())
    }

    #[test]
    fn pressing_twice_fails_without_events() -> Result<()> {
        let mut doc = Document::from_html("<button id='a'>a</button>")?;
        let a = doc.select_one("#a")?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, a, None)?;
        mouse.press(&mut doc, MouseButton::Primary)?;
        let log = event_log(&mut doc, &["mousedown", "pointerdown"])?;
        let before = mouse.clone();
        assert!(matches!(
            mouse.press(&mut doc, MouseButton::Secondary),
            Err(Error::InvalidElementState(_))
        ));
        assert!(log.borrow().is_empty());
        assert_eq!(mouse, before);
        Ok(())
    }

    #[test]
    fn releasing_without_press_fails() -> Result<()> {
        let mut doc = Document::from_html("<button id='a'>a</button>")?;
        let a = doc.select_one("#a")?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, a, None)?;
        let err = mouse.release(&mut doc, MouseButton::Primary).err();
        assert_eq!(
            err,
            Some(Error::InvalidElementState(
                "Cannot release a button when no button is pressed.".into()
            ))
        );
        Ok(())
    }

    #[test]
    fn double_click_needs_the_window() -> Result<()> {
        let mut doc = Document::from_html_with_config(
            "<button id='a'>a</button>",
            AtomConfig::default().with_double_click_window_ms(300),
        )?;
        let a = doc.select_one("#a")?;
        let log = event_log(&mut doc, &["click", "dblclick"])?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, a, None)?;
        for _ in 0..2 {
            mouse.press(&mut doc, MouseButton::Primary)?;
            mouse.release(&mut doc, MouseButton::Primary)?;
            doc.advance_time(400)?;
        }
        assert_eq!(log.borrow().as_slice(), ["click #a", "click #a"]);
        Ok(())
    }

    #[test]
    fn secondary_release_fires_contextmenu() -> Result<()> {
        let mut doc = Document::from_html("<div id='d' style='height: 20px'>d</div>")?;
        let d = doc.select_one("#d")?;
        let log = event_log(&mut doc, &["click", "contextmenu"])?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, d, None)?;
        mouse.press(&mut doc, MouseButton::Secondary)?;
        mouse.release(&mut doc, MouseButton::Secondary)?;
        assert_eq!(log.borrow().as_slice(), ["contextmenu #d"]);
        Ok(())
    }

    #[test]
    fn pointer_events_none_blocks_the_move() -> Result<()> {
        let mut doc =
            Document::from_html("<button id='a' style='pointer-events: none'>a</button>")?;
        let a = doc.select_one("#a")?;
        let mut mouse = MouseDeviceState::new();
        assert!(matches!(
            mouse.move_to(&mut doc, a, None),
            Err(Error::ElementNotInteractable(_))
        ));
        assert_eq!(mouse, MouseDeviceState::new());
        Ok(())
    }

    #[test]
    fn pointer_emulation_precedes_mouse_events() -> Result<()> {
        let mut doc = Document::from_html_with_config(
            "<button id='a'>a</button>",
            AtomConfig::default().with_pointer_event_emulation(true),
        )?;
        let a = doc.select_one("#a")?;
        let log = event_log(&mut doc, &["pointerdown", "mousedown", "pointerup", "mouseup"])?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, a, None)?;
        mouse.press(&mut doc, MouseButton::Primary)?;
        mouse.release(&mut doc, MouseButton::Primary)?;
        assert_eq!(
            log.borrow().as_slice(),
            ["pointerdown #a", "mousedown #a", "pointerup #a", "mouseup #a"]
        );
        Ok(())
    }

    #[test]
    fn pressing_an_option_selects_it() -> Result<()> {
        let mut doc = Document::from_html(
            "<select id='s'><option>a</option><option id='o'>b</option></select>",
        )?;
        let select = doc.select_one("#s")?;
        let option = doc.select_one("#o")?;
        let mut mouse = MouseDeviceState::new();
        mouse.move_to(&mut doc, option, None)?;
        mouse.press(&mut doc, MouseButton::Primary)?;
        assert_eq!(doc.value(select)?, "b");
        assert_eq!(doc.active_element(), select);
        mouse.release(&mut doc, MouseButton::Primary)?;
        Ok(())
    }
}
