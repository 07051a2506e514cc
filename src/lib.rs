//! In-page automation atoms over a hosted DOM.
//!
//! A [`Document`] is parsed from HTML and carries its own stylesheet, layout,
//! listeners and virtual clock. The atoms in [`atoms`] resolve locators, judge
//! interactability and synthesize mouse and keyboard input at the DOM level,
//! with the device state threaded explicitly through [`MouseDeviceState`] and
//! [`KeyboardDeviceState`].
//!
//! ```
//! use dom_atoms::{atoms, Document, Result};
//!
//! fn main() -> Result<()> {
//!     let mut doc = Document::from_html("<input id='name'>")?;
//!     let input = doc.select_one("#name")?;
//!     let state = atoms::send_keys(&mut doc, input, "ab", None, false)?;
//!     assert_eq!(doc.value(input)?, "ab");
//!     assert_eq!(state.caret, 2);
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

mod core_dom_utils;
mod core_impl;
mod document;
mod runtime_state;
mod selector;

pub mod atoms;
pub mod evaluation;
pub mod keys;

use core_dom_utils::*;
use core_impl::*;
use keys::{KeyToken, parse_key_sequence};
use runtime_state::*;
use selector::*;

pub use core_impl::{
    ClipState, ElementKind, Event, EventDetail, EventHandler, EventPhase, KeyboardDeviceState,
    KeyboardEventInit, LegacyCascade, Locator, Modifiers, MouseButton, MouseDeviceState,
    MouseEventInit, PlatformStyle, Point, Reason, Rect, Resolver, Strategy, StyleSource,
    Submission, Verdict, XPathEvaluator,
};
pub use document::Document;
pub use evaluation::{AtomRequest, ElementReference, Evaluation};
pub use keys::{KeyDescriptor, KeyId, Modifier};
pub use runtime_state::{AtomConfig, StyleSourceKind};

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the atoms.
///
/// Messages are carried verbatim; clients historically match on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    ElementNotInteractable(String),
    #[error("{0}")]
    ElementNotSelectable(String),
    #[error("{0}")]
    StaleElementReference(String),
    #[error("{0}")]
    InvalidElementState(String),
    #[error("{0}")]
    NoSuchElement(String),
    #[error("{0}")]
    NoSuchFrame(String),
    #[error("{0}")]
    UnexpectedAlertOpen(String),
    #[error("{0}")]
    JavascriptError(String),
    #[error("{0}")]
    InvalidSelector(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    UnsupportedOperation(String),
    #[error("html parse error: {0}")]
    HtmlParse(String),
}

impl Error {
    /// WebDriver JSON wire protocol status code for this failure.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NoSuchElement(_) => 7,
            Self::NoSuchFrame(_) => 8,
            Self::UnsupportedOperation(_) => 9,
            Self::StaleElementReference(_) => 10,
            Self::ElementNotInteractable(_) => 11,
            Self::InvalidElementState(_) => 12,
            Self::HtmlParse(_) => 13,
            Self::ElementNotSelectable(_) => 15,
            Self::JavascriptError(_) => 17,
            Self::Timeout(_) => 21,
            Self::UnexpectedAlertOpen(_) => 26,
            Self::InvalidSelector(_) => 32,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ElementNotInteractable(msg)
            | Self::ElementNotSelectable(msg)
            | Self::StaleElementReference(msg)
            | Self::InvalidElementState(msg)
            | Self::NoSuchElement(msg)
            | Self::NoSuchFrame(msg)
            | Self::UnexpectedAlertOpen(msg)
            | Self::JavascriptError(msg)
            | Self::InvalidSelector(msg)
            | Self::Timeout(msg)
            | Self::UnsupportedOperation(msg)
            | Self::HtmlParse(msg) => msg,
        }
    }

    /// Rebuilds an error from a wire status code, e.g. when decoding an
    /// [`Evaluation`]. Unknown codes become `JavascriptError`.
    pub fn from_status(status: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            7 => Self::NoSuchElement(message),
            8 => Self::NoSuchFrame(message),
            9 => Self::UnsupportedOperation(message),
            10 => Self::StaleElementReference(message),
            11 => Self::ElementNotInteractable(message),
            12 => Self::InvalidElementState(message),
            15 => Self::ElementNotSelectable(message),
            21 => Self::Timeout(message),
            26 => Self::UnexpectedAlertOpen(message),
            32 => Self::InvalidSelector(message),
            _ => Self::JavascriptError(message),
        }
    }
}

/// Borrowed handle to a node of one [`Document`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}
