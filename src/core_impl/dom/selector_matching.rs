use super::*;

impl Dom {
    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root, selector)
    }

    /// Descendants of `root` matching `selector`, in tree order.
    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut candidates = Vec::new();
        self.collect_elements_descendants_dfs(root, &mut candidates);
        Ok(candidates
            .into_iter()
            .filter(|node| {
                groups
                    .iter()
                    .any(|chain| self.matches_selector_chain(*node, chain))
            })
            .collect())
    }

    pub(crate) fn matches_selector_chain(&self, node_id: NodeId, steps: &[SelectorPart]) -> bool {
        let Some((last, rest)) = steps.split_last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }

        // Backtracks over every candidate the combinator admits, not just the
        // nearest one.
        match last.combinator.unwrap_or(SelectorCombinator::Descendant) {
            SelectorCombinator::Child => self
                .parent_element(node_id)
                .is_some_and(|parent| self.matches_selector_chain(parent, rest)),
            SelectorCombinator::Descendant => self
                .ancestors(node_id)
                .filter(|node| self.element(*node).is_some())
                .any(|ancestor| self.matches_selector_chain(ancestor, rest)),
            SelectorCombinator::AdjacentSibling => self
                .previous_element_sibling(node_id)
                .is_some_and(|sibling| self.matches_selector_chain(sibling, rest)),
            SelectorCombinator::GeneralSibling => {
                let mut cursor = self.previous_element_sibling(node_id);
                while let Some(sibling) = cursor {
                    if self.matches_selector_chain(sibling, rest) {
                        return true;
                    }
                    cursor = self.previous_element_sibling(sibling);
                }
                false
            }
        }
    }

    pub(crate) fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.is_tag(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if step
            .classes
            .iter()
            .any(|class_name| !has_class(element, class_name))
        {
            return false;
        }

        let attrs_match = step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
            SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            SelectorAttrCondition::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.starts_with(value.as_str())),
            SelectorAttrCondition::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.ends_with(value.as_str())),
            SelectorAttrCondition::Contains { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.contains(value.as_str())),
            SelectorAttrCondition::Includes { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
            SelectorAttrCondition::DashMatch { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr == value || attr.starts_with(&format!("{value}-"))),
        });
        if !attrs_match {
            return false;
        }

        step.pseudo_classes.iter().all(|pseudo| match pseudo {
            SelectorPseudoClass::FirstChild => self.element_position(node_id) == Some((1, false)),
            SelectorPseudoClass::LastChild => self
                .element_position(node_id)
                .is_some_and(|(_, is_last)| is_last),
            SelectorPseudoClass::OnlyChild => self.element_position(node_id) == Some((1, true)),
            SelectorPseudoClass::Checked => {
                element.checked
                    || (element.is_tag("option") && element.attrs.contains_key("selected"))
            }
            SelectorPseudoClass::Disabled => is_effectively_disabled(self, node_id),
            SelectorPseudoClass::Enabled => {
                is_form_control(self, node_id) && !is_effectively_disabled(self, node_id)
            }
            SelectorPseudoClass::Focus => self.active_element() == Some(node_id),
            SelectorPseudoClass::Empty => self.children(node_id).is_empty(),
            SelectorPseudoClass::NthChild(selector) => self
                .element_position(node_id)
                .is_some_and(|(position, _)| selector.matches(position)),
            SelectorPseudoClass::Not(inners) => !inners
                .iter()
                .any(|inner| self.matches_selector_chain(node_id, inner)),
            SelectorPseudoClass::Is(inners) => inners
                .iter()
                .any(|inner| self.matches_selector_chain(node_id, inner)),
        })
    }

    /// 1-based position among element siblings, and whether it is the last.
    fn element_position(&self, node_id: NodeId) -> Option<(usize, bool)> {
        let parent = self.parent(node_id)?;
        let siblings = self.element_children(parent);
        let index = siblings.iter().position(|id| *id == node_id)?;
        Some((index + 1, index + 1 == siblings.len()))
    }
}
