use super::*;

impl Dom {
    pub(crate) fn sync_select_value_for_option(&mut self, option_node: NodeId) -> Result<()> {
        match self.owning_select(option_node) {
            Some(select_node) => self.sync_select_value(select_node),
            None => Ok(()),
        }
    }

    /// The `select` an option (or optgroup) belongs to, if any.
    pub(crate) fn owning_select(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .take_while(|ancestor| self.element(*ancestor).is_some())
            .find(|ancestor| self.has_tag(*ancestor, "select"))
    }

    pub(crate) fn is_multiple_select(&self, select_node: NodeId) -> bool {
        self.has_tag(select_node, "select") && self.has_attr(select_node, "multiple")
    }

    pub(crate) fn option_selected(&self, option_node: NodeId) -> bool {
        self.has_attr(option_node, "selected")
    }

    /// Marks `option_node` selected. Single selects drop every other selection.
    pub(crate) fn set_option_selected(
        &mut self,
        option_node: NodeId,
        selected: bool,
    ) -> Result<()> {
        let select_node = self.owning_select(option_node);
        if selected {
            if let Some(select_node) = select_node.filter(|s| !self.is_multiple_select(*s)) {
                for option in self.select_options(select_node) {
                    if let Some(element) = self.element_mut(option) {
                        element.attrs.remove("selected");
                    }
                }
            }
        }
        let element = self.element_mut(option_node).ok_or_else(|| {
            Error::InvalidElementState("option target is not an element".into())
        })?;
        if selected {
            element.attrs.insert("selected".to_string(), String::new());
        } else {
            element.attrs.remove("selected");
        }
        match select_node {
            Some(select_node) => self.sync_select_value(select_node),
            None => Ok(()),
        }
    }

    pub(crate) fn set_select_value(&mut self, select_node: NodeId, requested: &str) -> Result<()> {
        let matched = self
            .select_options(select_node)
            .into_iter()
            .find(|option| self.option_effective_value(*option) == requested);
        for option in self.select_options(select_node) {
            let element = self.element_mut(option).ok_or_else(|| {
                Error::InvalidElementState("option target is not an element".into())
            })?;
            if Some(option) == matched {
                element.attrs.insert("selected".to_string(), String::new());
            } else {
                element.attrs.remove("selected");
            }
        }
        self.sync_select_value(select_node)
    }

    pub(crate) fn sync_select_value(&mut self, select_node: NodeId) -> Result<()> {
        let value = self.select_value_from_options(select_node);
        let element = self.element_mut(select_node).ok_or_else(|| {
            Error::InvalidElementState("select target is not an element".into())
        })?;
        element.value = value;
        Ok(())
    }

    pub(crate) fn select_value_from_options(&self, select_node: NodeId) -> String {
        let options = self.select_options(select_node);
        let selected = options
            .iter()
            .copied()
            .find(|option| self.option_selected(*option));
        let selected = match selected {
            Some(option) => Some(option),
            None if !self.is_multiple_select(select_node) => options.first().copied(),
            None => None,
        };
        selected
            .map(|option| self.option_effective_value(option))
            .unwrap_or_default()
    }

    pub(crate) fn select_options(&self, select_node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_descendants_dfs(select_node, &mut out);
        out.retain(|node| self.has_tag(*node, "option"));
        out
    }

    pub(crate) fn option_effective_value(&self, option_node: NodeId) -> String {
        self.attr(option_node, "value")
            .unwrap_or_else(|| self.text_content(option_node).trim().to_string())
    }
}
