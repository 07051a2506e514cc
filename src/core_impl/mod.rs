use super::*;

mod clip;
mod dom;
mod element_kind;
mod events;
mod form_controls;
mod geometry;
mod html;
mod interactable;
mod keyboard;
mod layout;
mod locator;
mod mouse;
mod scroll;
mod style;
mod visible_text;

pub use clip::ClipState;
pub use element_kind::ElementKind;
pub use events::{
    Event, EventDetail, EventHandler, EventPhase, KeyboardEventInit, Modifiers, MouseEventInit,
    Submission,
};
pub use geometry::{Point, Rect};
pub use interactable::{Reason, Verdict};
pub use keyboard::KeyboardDeviceState;
pub use locator::{Locator, Resolver, Strategy, XPathEvaluator};
pub use mouse::{MouseButton, MouseDeviceState};
pub use style::{LegacyCascade, PlatformStyle, StyleSource};

pub(crate) use dom::{Dom, Element};
pub(crate) use events::{Listener, ListenerStore};
pub(crate) use form_controls::*;
pub(crate) use geometry::Edges;
pub(crate) use html::{ParseOutput, parse_html};
pub(crate) use layout::Layout;
pub(crate) use locator::DefaultResolver;
pub(crate) use style::Stylesheet;
