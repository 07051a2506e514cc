//! The JSON execution envelope: a tagged [`AtomRequest`] in, an
//! [`Evaluation`] out.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Document, Error, KeyboardDeviceState, Locator, MouseDeviceState, NodeId, Result, atoms,
};

/// `{"ELEMENT": ":wdc:N"}`, the wire form of an element handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementReference {
    #[serde(rename = "ELEMENT")]
    pub id: String,
}

/// Result envelope. Status 0 carries the atom's value; any other status is
/// a failure whose value is `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub status: i32,
    pub value: Value,
}

impl Evaluation {
    pub fn success(value: Value) -> Self {
        Self { status: 0, value }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            status: error.status_code(),
            value: json!({ "message": error.message() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// The value on success, else the error the status code names.
    pub fn into_result(self) -> Result<Value> {
        if self.status == 0 {
            return Ok(self.value);
        }
        let message = self
            .value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Err(Error::from_status(self.status, message))
    }
}

/// One atom call, tagged by `"atom"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "atom", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AtomRequest {
    Click {
        element: ElementReference,
        #[serde(default)]
        state: Option<MouseDeviceState>,
    },
    SendKeys {
        element: ElementReference,
        keys: String,
        #[serde(default)]
        persist_modifiers: bool,
        #[serde(default)]
        state: Option<KeyboardDeviceState>,
    },
    Clear {
        element: ElementReference,
    },
    ScrollIntoView {
        element: ElementReference,
    },
    IsInteractable {
        element: ElementReference,
    },
    GetVisibleText {
        element: ElementReference,
    },
    FindElement {
        locator: Locator,
        #[serde(default)]
        root: Option<ElementReference>,
    },
    FindElements {
        locator: Locator,
        #[serde(default)]
        root: Option<ElementReference>,
    },
    ActiveElement,
    /// Answers with a reference to the hosting `<iframe>`; the caller
    /// switches to the frame document through [`Document::select_frame_by_index`].
    SelectFrameByIndex {
        index: usize,
    },
    SelectFrameByIdOrName {
        key: String,
    },
}

impl AtomRequest {
    fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::SendKeys { .. } => "sendKeys",
            Self::Clear { .. } => "clear",
            Self::ScrollIntoView { .. } => "scrollIntoView",
            Self::IsInteractable { .. } => "isInteractable",
            Self::GetVisibleText { .. } => "getVisibleText",
            Self::FindElement { .. } => "findElement",
            Self::FindElements { .. } => "findElements",
            Self::ActiveElement => "activeElement",
            Self::SelectFrameByIndex { .. } => "selectFrameByIndex",
            Self::SelectFrameByIdOrName { .. } => "selectFrameByIdOrName",
        }
    }
}

/// Runs `request` against `doc`. Failures are folded into the envelope.
pub fn execute(doc: &mut Document, request: AtomRequest) -> Evaluation {
    let atom = request.name();
    match run(doc, request) {
        Ok(value) => Evaluation::success(value),
        Err(err) => {
            tracing::debug!(atom, status = err.status_code(), error = %err, "atom failed");
            Evaluation::failure(&err)
        }
    }
}

/// Parses a request from JSON and runs it. Malformed requests fail with
/// status 17.
pub fn execute_json(doc: &mut Document, request: &str) -> Evaluation {
    match serde_json::from_str::<AtomRequest>(request) {
        Ok(request) => execute(doc, request),
        Err(err) => Evaluation::failure(&Error::JavascriptError(format!(
            "malformed atom request: {err}"
        ))),
    }
}

fn run(doc: &mut Document, request: AtomRequest) -> Result<Value> {
    match request {
        AtomRequest::Click { element, state } => {
            let element = doc.resolve_reference(&element)?;
            let state = atoms::click(doc, element, state)?;
            to_value(&state)
        }
        AtomRequest::SendKeys {
            element,
            keys,
            persist_modifiers,
            state,
        } => {
            let element = doc.resolve_reference(&element)?;
            let state = atoms::send_keys(doc, element, &keys, state, persist_modifiers)?;
            to_value(&state)
        }
        AtomRequest::Clear { element } => {
            let element = doc.resolve_reference(&element)?;
            atoms::clear(doc, element)?;
            Ok(Value::Null)
        }
        AtomRequest::ScrollIntoView { element } => {
            let element = doc.resolve_reference(&element)?;
            atoms::scroll_into_view(doc, element)?;
            Ok(Value::Null)
        }
        AtomRequest::IsInteractable { element } => {
            let element = doc.resolve_reference(&element)?;
            Ok(Value::Bool(atoms::is_interactable(doc, element)?))
        }
        AtomRequest::GetVisibleText { element } => {
            let element = doc.resolve_reference(&element)?;
            Ok(Value::String(atoms::get_visible_text(doc, element)?))
        }
        AtomRequest::FindElement { locator, root } => {
            let root = resolve_root(doc, root.as_ref())?;
            let found = atoms::find_element(doc, &locator, root)?;
            reference_value(doc, found)
        }
        AtomRequest::FindElements { locator, root } => {
            let root = resolve_root(doc, root.as_ref())?;
            let found = atoms::find_elements(doc, &locator, root)?;
            let references = found
                .into_iter()
                .map(|node| doc.element_reference(node))
                .collect::<Result<Vec<_>>>()?;
            to_value(&references)
        }
        AtomRequest::ActiveElement => {
            let active = atoms::active_element(doc);
            reference_value(doc, active)
        }
        AtomRequest::SelectFrameByIndex { index } => {
            let iframe = doc.frame_element(index)?;
            reference_value(doc, iframe)
        }
        AtomRequest::SelectFrameByIdOrName { key } => {
            let index = doc.frame_index_by_id_or_name(&key)?;
            let iframe = doc.frame_element(index)?;
            reference_value(doc, iframe)
        }
    }
}

fn resolve_root(doc: &Document, root: Option<&ElementReference>) -> Result<Option<NodeId>> {
    root.map(|reference| doc.resolve_reference(reference))
        .transpose()
}

fn reference_value(doc: &mut Document, node: NodeId) -> Result<Value> {
    let reference = doc.element_reference(node)?;
    to_value(&reference)
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|err| Error::JavascriptError(err.to_string()))
}
