use super::*;

impl Dom {
    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::InvalidElementState("value target is not an element".into()))?;
        if is_checkbox_or_radio_input_element(element) && !element.attrs.contains_key("value") {
            return Ok("on".to_string());
        }
        if element.is_tag("option") {
            return Ok(self.option_effective_value(node_id));
        }
        Ok(element.value.clone())
    }

    /// Assigns the value and collapses the selection to its end.
    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.has_tag(node_id, "select") {
            return self.set_select_value(node_id, value);
        }
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::InvalidElementState("value target is not an element".into()))?;
        element.value = value.to_string();
        let len = char_len(value);
        element.selection_start = len;
        element.selection_end = len;
        Ok(())
    }

    pub(crate) fn selection_range(&self, node_id: NodeId) -> Result<(usize, usize)> {
        let element = self.element(node_id).ok_or_else(|| {
            Error::InvalidElementState("selection target is not an element".into())
        })?;
        Ok((element.selection_start, element.selection_end))
    }

    /// Clamps both ends into the value and orders them.
    pub(crate) fn set_selection_range(
        &mut self,
        node_id: NodeId,
        start: usize,
        end: usize,
    ) -> Result<()> {
        let element = self.element_mut(node_id).ok_or_else(|| {
            Error::InvalidElementState("selection target is not an element".into())
        })?;
        let len = char_len(&element.value);
        let start = start.min(len);
        let end = end.min(len).max(start);
        element.selection_start = start;
        element.selection_end = end;
        Ok(())
    }

    /// Replaces the current selection with `text`; the caret lands after it.
    pub(crate) fn replace_selection(&mut self, node_id: NodeId, text: &str) -> Result<usize> {
        let element = self.element_mut(node_id).ok_or_else(|| {
            Error::InvalidElementState("selection target is not an element".into())
        })?;
        let len = char_len(&element.value);
        let start = element.selection_start.min(len);
        let end = element.selection_end.min(len).max(start);
        let start_byte = byte_offset(&element.value, start);
        let end_byte = byte_offset(&element.value, end);
        element.value.replace_range(start_byte..end_byte, text);
        let caret = start + char_len(text);
        element.selection_start = caret;
        element.selection_end = caret;
        Ok(caret)
    }

    /// Deletes the selection, or one character before (`backward`) or after
    /// the caret. Returns whether the value changed.
    pub(crate) fn delete_at_caret(&mut self, node_id: NodeId, backward: bool) -> Result<bool> {
        let (start, end, len) = {
            let element = self.element(node_id).ok_or_else(|| {
                Error::InvalidElementState("selection target is not an element".into())
            })?;
            let len = char_len(&element.value);
            let start = element.selection_start.min(len);
            (start, element.selection_end.min(len).max(start), len)
        };
        let (start, end) = if start != end {
            (start, end)
        } else if backward && start > 0 {
            (start - 1, start)
        } else if !backward && end < len {
            (end, end + 1)
        } else {
            return Ok(false);
        };
        self.set_selection_range(node_id, start, end)?;
        self.replace_selection(node_id, "")?;
        Ok(true)
    }

    /// Text nodes under `node` in tree order as `(node, start, len)`, with
    /// `start` counted in characters of the flattened text.
    pub(crate) fn text_runs(&self, node_id: NodeId) -> Vec<(NodeId, usize, usize)> {
        let mut runs = Vec::new();
        let mut offset = 0;
        self.collect_text_runs(node_id, &mut offset, &mut runs);
        runs
    }

    fn collect_text_runs(
        &self,
        node_id: NodeId,
        offset: &mut usize,
        runs: &mut Vec<(NodeId, usize, usize)>,
    ) {
        for child in self.children(node_id) {
            match self.text(*child) {
                Some(text) => {
                    let len = char_len(text);
                    runs.push((*child, *offset, len));
                    *offset += len;
                }
                None => self.collect_text_runs(*child, offset, runs),
            }
        }
    }

    /// Characters of `host`'s flattened text up to the end of `inner`.
    pub(crate) fn text_offset_after(&self, host: NodeId, inner: NodeId) -> usize {
        let mut offset = 0;
        if inner == host || !self.advance_past(host, inner, &mut offset) {
            return char_len(&self.text_content(host));
        }
        offset
    }

    fn advance_past(&self, node_id: NodeId, inner: NodeId, offset: &mut usize) -> bool {
        for child in self.children(node_id) {
            match self.text(*child) {
                Some(text) => *offset += char_len(text),
                None => {
                    if self.advance_past(*child, inner, offset) || *child == inner {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Replaces characters `start..end` of `host`'s flattened text with
    /// `text`. Text nodes are edited in place; element children are never
    /// moved or detached.
    ///
    /// Inserted text goes to a text node of `within` touching `start`, else
    /// a new text node in an empty `within` sitting at `start`, else the text
    /// node ending at `start`, else the one beginning there.
    pub(crate) fn splice_text(
        &mut self,
        host: NodeId,
        within: NodeId,
        start: usize,
        end: usize,
        text: &str,
    ) {
        for (node, run_start, len) in self.text_runs(host) {
            let from = start.max(run_start);
            let to = end.min(run_start + len);
            if from >= to {
                continue;
            }
            if let NodeType::Text(content) = &mut self.nodes[node.0].node_type {
                let from_byte = byte_offset(content, from - run_start);
                let to_byte = byte_offset(content, to - run_start);
                content.replace_range(from_byte..to_byte, "");
            }
        }
        if text.is_empty() {
            return;
        }

        let runs = self.text_runs(host);
        let touches = |run_start: usize, len: usize| run_start <= start && start <= run_start + len;
        let inside = runs
            .iter()
            .copied()
            .find(|(node, run_start, len)| {
                touches(*run_start, *len) && self.is_descendant_of(*node, within)
            });
        let within_is_empty = within != host
            && !runs
                .iter()
                .any(|(node, _, _)| self.is_descendant_of(*node, within))
            && self.text_offset_after(host, within) == start;
        let chosen = inside.or_else(|| {
            if within_is_empty {
                return None;
            }
            runs.iter()
                .copied()
                .find(|(_, run_start, len)| *run_start < start && start <= run_start + len)
                .or_else(|| {
                    runs.iter()
                        .copied()
                        .find(|(_, run_start, len)| touches(*run_start, *len))
                })
        });

        match chosen {
            Some((node, run_start, _)) => {
                if let NodeType::Text(content) = &mut self.nodes[node.0].node_type {
                    let at = byte_offset(content, start - run_start);
                    content.insert_str(at, text);
                }
            }
            None => {
                self.create_text(within, text.to_string());
            }
        }
    }
}
