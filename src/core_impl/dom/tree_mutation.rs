use super::*;

impl Dom {
    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub(crate) fn has_attr(&self, node_id: NodeId, name: &str) -> bool {
        self.element(node_id)
            .is_some_and(|e| e.attrs.contains_key(&name.to_ascii_lowercase()))
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let is_option = {
            let element = self.element_mut(node_id).ok_or_else(|| {
                Error::InvalidElementState("setAttribute target is not an element".into())
            })?;
            element.attrs.insert(lowered.clone(), value.to_string());
            match lowered.as_str() {
                "value" if !element.is_tag("option") && !element.is_tag("select") => {
                    element.value = value.to_string();
                    let len = char_len(value);
                    element.selection_start = len;
                    element.selection_end = len;
                }
                "checked" => element.checked = true,
                _ => {}
            }
            element.is_tag("option")
        };

        if lowered == "id" {
            self.rebuild_id_index();
        }
        if lowered == "checked" && is_radio_input(self, node_id) {
            self.uncheck_other_radios_in_group(node_id);
        }
        if is_option && lowered == "selected" {
            self.sync_select_value_for_option(node_id)?;
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let is_option = {
            let element = self.element_mut(node_id).ok_or_else(|| {
                Error::InvalidElementState("removeAttribute target is not an element".into())
            })?;
            element.attrs.remove(&lowered);
            if lowered == "checked" {
                element.checked = false;
            }
            element.is_tag("option")
        };
        if lowered == "id" {
            self.rebuild_id_index();
        }
        if is_option && lowered == "selected" {
            self.sync_select_value_for_option(node_id)?;
        }
        Ok(())
    }

    pub(crate) fn checked(&self, node_id: NodeId) -> Result<bool> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::InvalidElementState("checked target is not an element".into()))?;
        Ok(element.checked)
    }

    pub(crate) fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<()> {
        if checked && is_radio_input(self, node_id) {
            self.uncheck_other_radios_in_group(node_id);
        }
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::InvalidElementState("checked target is not an element".into()))?;
        element.checked = checked;
        Ok(())
    }

    pub(crate) fn uncheck_other_radios_in_group(&mut self, target: NodeId) {
        let target_name = self.attr(target, "name").unwrap_or_default();
        if target_name.is_empty() {
            return;
        }
        let target_form = self.find_ancestor_by_tag(target, "form");

        for node in self.all_element_nodes() {
            if node == target
                || !is_radio_input(self, node)
                || self.attr(node, "name").unwrap_or_default() != target_name
                || self.find_ancestor_by_tag(node, "form") != target_form
            {
                continue;
            }
            if let Some(element) = self.element_mut(node) {
                element.checked = false;
            }
        }
    }

    pub(crate) fn normalize_radio_groups(&mut self) -> Result<()> {
        for node in self.all_element_nodes() {
            if is_radio_input(self, node) && self.has_attr(node, "checked") {
                self.set_checked(node, true)?;
            }
        }
        Ok(())
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root || child == parent || !self.is_valid_node(child) {
            return Err(Error::InvalidElementState("invalid appendChild node".into()));
        }
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(Error::InvalidElementState(
                "appendChild would create a cycle".into(),
            ));
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::InvalidElementState(
                "cannot remove document root".into(),
            ));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|id| *id != node);
        self.nodes[node.0].parent = None;
        if self
            .active_element
            .is_some_and(|active| active == node || self.is_descendant_of(active, node))
        {
            self.active_element = None;
        }
        self.rebuild_id_index();
        Ok(())
    }

    /// Replaces all children of `node` with a single text node.
    pub(crate) fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        if self.element(node).is_none() {
            return Err(Error::InvalidElementState(
                "textContent target is not an element".into(),
            ));
        }
        for child in self.children(node).to_vec() {
            self.nodes[child.0].parent = None;
        }
        self.nodes[node.0].children.clear();
        if !text.is_empty() {
            self.create_text(node, text.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }
}
