use super::*;

/// What an element is, for the purposes of the atoms. Computed once per
/// query from tag, type and attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Html,
    Body,
    /// Text inputs, textareas and `contenteditable` hosts.
    TextEditable,
    /// Date, time, color and range inputs, whose value is assigned whole.
    DirectAssign,
    Checkable,
    Button,
    Select,
    /// `option` or `optgroup`; judged through the owning select.
    SelectOption,
    HiddenInput,
    /// Any other form control (file inputs, etc.).
    FormControl,
    MapArea,
    ImageMap,
    SvgPath,
    NoScript,
    Frame,
    Other,
}

impl ElementKind {
    pub(crate) fn of(dom: &Dom, node: NodeId) -> Self {
        let Some(element) = dom.element(node) else {
            return Self::Other;
        };
        match element.tag_name.to_ascii_lowercase().as_str() {
            "html" => Self::Html,
            "body" => Self::Body,
            "textarea" => Self::TextEditable,
            "select" => Self::Select,
            "option" | "optgroup" => Self::SelectOption,
            "button" => Self::Button,
            "area" => Self::MapArea,
            "map" => Self::ImageMap,
            "path" => Self::SvgPath,
            "noscript" => Self::NoScript,
            "iframe" | "frame" => Self::Frame,
            "input" => match input_type(element).as_str() {
                "hidden" => Self::HiddenInput,
                "checkbox" | "radio" => Self::Checkable,
                "submit" | "reset" | "button" | "image" => Self::Button,
                _ if is_text_entry(dom, node) => Self::TextEditable,
                _ if is_direct_assign_input(dom, node) => Self::DirectAssign,
                _ => Self::FormControl,
            },
            _ if is_content_editable(dom, node) => Self::TextEditable,
            _ => Self::Other,
        }
    }

    /// Kinds that can carry the `disabled` state.
    pub fn is_form_control(self) -> bool {
        matches!(
            self,
            Self::TextEditable
                | Self::DirectAssign
                | Self::Checkable
                | Self::Button
                | Self::Select
                | Self::SelectOption
                | Self::HiddenInput
                | Self::FormControl
        )
    }

    pub fn accepts_keys(self) -> bool {
        matches!(self, Self::TextEditable | Self::DirectAssign)
    }
}
