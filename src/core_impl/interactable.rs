use super::*;

/// Why an element cannot be interacted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    DisplayNone,
    ZeroSize,
    Transparent,
    HiddenInput,
    Noscript,
    VisibilityHidden,
    ClippedHidden,
    ClippedScrollable,
    /// Rendered, but a disabled form control.
    Disabled,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DisplayNone => "display-none",
            Self::ZeroSize => "zero-size",
            Self::Transparent => "transparent",
            Self::HiddenInput => "hidden-input",
            Self::Noscript => "noscript",
            Self::VisibilityHidden => "visibility-hidden",
            Self::ClippedHidden => "clipped-hidden",
            Self::ClippedScrollable => "clipped-scrollable",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the interactability rules for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub displayed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl Verdict {
    pub fn shown() -> Self {
        Self {
            displayed: true,
            reason: None,
        }
    }

    pub fn hidden(reason: Reason) -> Self {
        Self {
            displayed: false,
            reason: Some(reason),
        }
    }

    /// Displayed and with nothing in the way.
    pub fn is_interactable(&self) -> bool {
        self.displayed && self.reason.is_none()
    }
}

impl Document {
    /// First matching rule wins: display, size, opacity and element kind,
    /// visibility, clipping, then the disabled state.
    pub(crate) fn verdict_in(&self, layout: &Layout, node: NodeId) -> Verdict {
        let kind = ElementKind::of(&self.dom, node);
        match kind {
            ElementKind::Body => return Verdict::shown(),
            ElementKind::SelectOption => {
                if let Some(select) = self.dom.owning_select(node) {
                    let verdict = self.verdict_in(layout, select);
                    if verdict.displayed && is_effectively_disabled(&self.dom, node) {
                        return Verdict {
                            displayed: true,
                            reason: Some(Reason::Disabled),
                        };
                    }
                    return verdict;
                }
            }
            _ => {}
        }

        if self.has_display_none(node) {
            return Verdict::hidden(Reason::DisplayNone);
        }
        if !self.has_positive_size(layout, node) {
            return Verdict::hidden(Reason::ZeroSize);
        }
        if self.effective_opacity(node) <= 0.0 {
            return Verdict::hidden(Reason::Transparent);
        }
        match kind {
            ElementKind::HiddenInput => return Verdict::hidden(Reason::HiddenInput),
            ElementKind::NoScript => return Verdict::hidden(Reason::Noscript),
            _ => {}
        }
        if matches!(
            self.computed_style(node, "visibility").as_str(),
            "hidden" | "collapse"
        ) {
            return Verdict::hidden(Reason::VisibilityHidden);
        }
        match self.clip_state_in(layout, node, None) {
            ClipState::Hidden => return Verdict::hidden(Reason::ClippedHidden),
            ClipState::Scroll => return Verdict::hidden(Reason::ClippedScrollable),
            ClipState::None => {}
        }
        if kind.is_form_control() && is_effectively_disabled(&self.dom, node) {
            return Verdict {
                displayed: true,
                reason: Some(Reason::Disabled),
            };
        }
        Verdict::shown()
    }

    pub(crate) fn has_display_none(&self, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(self.dom.ancestors(node))
            .filter(|n| self.dom.element(*n).is_some())
            .any(|n| self.computed_style(n, "display") == "none")
    }

    fn effective_opacity(&self, node: NodeId) -> f64 {
        std::iter::once(node)
            .chain(self.dom.ancestors(node))
            .filter(|n| self.dom.element(*n).is_some())
            .map(|n| parse_css_number(&self.computed_style(n, "opacity")).unwrap_or(1.0))
            .product()
    }

    /// Nonzero area, or a stroked path, or content of positive size that
    /// `overflow: hidden` does not cut away.
    fn has_positive_size(&self, layout: &Layout, node: NodeId) -> bool {
        let rect = self.client_rect(layout, node);
        if rect.has_area() {
            return true;
        }
        if self.dom.has_tag(node, "path") && (rect.width > 0.0 || rect.height > 0.0) {
            let stroke = self.style_px(node, "stroke-width").unwrap_or(1.0);
            return stroke > 0.0;
        }
        let clips = ["overflow-x", "overflow-y"]
            .iter()
            .any(|axis| self.computed_style(node, axis) == "hidden");
        if clips || self.dom.has_tag(node, "area") {
            return false;
        }
        self.dom.children(node).iter().any(|child| {
            match self.dom.text(*child) {
                Some(text) => !text.trim().is_empty(),
                None => {
                    self.computed_style(*child, "display") != "none"
                        && self.has_positive_size(layout, *child)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(html: &str) -> Result<Verdict> {
        let doc = Document::from_html(html)?;
        let target = doc.select_one("#t")?;
        doc.interactability(target)
    }

    #[test]
    fn body_is_always_displayed() -> Result<()> {
        let doc = Document::from_html("<body style='display: none'></body>")?;
        let body = doc.select_one("body")?;
        assert_eq!(doc.interactability(body)?, Verdict::shown());
        Ok(())
    }

    #[test]
    fn display_none_ancestor_hides_descendants() -> Result<()> {
        assert_eq!(
            verdict("<div style='display:none'><p><button id='t' style='display:block'>x</button></p></div>")?,
            Verdict::hidden(Reason::DisplayNone)
        );
        Ok(())
    }

    #[test]
    fn zero_size_and_its_exceptions() -> Result<()> {
        assert_eq!(
            verdict("<div id='t' style='width: 0; height: 0'></div>")?,
            Verdict::hidden(Reason::ZeroSize)
        );
        assert_eq!(
            verdict("<div id='t' style='height: 0'><button>ok</button></div>")?,
            Verdict::shown()
        );
        assert_eq!(
            verdict("<svg width='50' height='50'><path id='t' d='M0 10 L40 10'/></svg>")?,
            Verdict::shown()
        );
        Ok(())
    }

    #[test]
    fn transparency_accumulates_over_ancestors() -> Result<()> {
        assert_eq!(
            verdict("<div style='opacity: 0'><button id='t'>x</button></div>")?,
            Verdict::hidden(Reason::Transparent)
        );
        Ok(())
    }

    #[test]
    fn visibility_hidden_is_inherited() -> Result<()> {
        assert_eq!(
            verdict("<div style='visibility: hidden'><button id='t'>x</button></div>")?,
            Verdict::hidden(Reason::VisibilityHidden)
        );
        assert_eq!(
            verdict("<div style='visibility: hidden'><button id='t' style='visibility: visible'>x</button></div>")?,
            Verdict::shown()
        );
        Ok(())
    }

    #[test]
    fn fieldset_disables_all_but_first_legend() -> Result<()> {
        let html = r#"<fieldset disabled>
              <legend><input id='in-legend'></legend>
              <input id='inside'>
            </fieldset>"#;
        let doc = Document::from_html(html)?;
        let in_legend = doc.select_one("#in-legend")?;
        let inside = doc.select_one("#inside")?;
        assert_eq!(doc.interactability(in_legend)?, Verdict::shown());
        assert_eq!(
            doc.interactability(inside)?,
            Verdict {
                displayed: true,
                reason: Some(Reason::Disabled)
            }
        );
        Ok(())
    }

    #[test]
    fn options_are_judged_through_their_select() -> Result<()> {
        let html = r#"<select style='display: none'><option id='t'>a</option></select>"#;
        assert_eq!(verdict(html)?, Verdict::hidden(Reason::DisplayNone));
        let html = r#"<select><option>a</option><option id='t' disabled>b</option></select>"#;
        assert_eq!(verdict(html)?.reason, Some(Reason::Disabled));
        Ok(())
    }

    #[test]
    fn reasons_serialize_kebab_case() -> Result<()> {
        let json = serde_json::to_string(&Verdict::hidden(Reason::ClippedScrollable))
            .map_err(|err| Error::JavascriptError(err.to_string()))?;
        assert_eq!(json, r#"{"displayed":false,"reason":"clipped-scrollable"}"#);
        Ok(())
    }
}
