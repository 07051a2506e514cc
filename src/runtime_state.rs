use super::*;

/// Which [`StyleSource`] a document reads computed styles through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleSourceKind {
    /// Stylesheet rules, inline style and user-agent defaults.
    #[default]
    Platform,
    /// Inline style and user-agent defaults only, for engines without a
    /// computed-style API.
    LegacyCascade,
}

impl StyleSourceKind {
    pub(crate) fn source(self) -> &'static dyn StyleSource {
        static PLATFORM: PlatformStyle = PlatformStyle;
        static LEGACY: LegacyCascade = LegacyCascade;
        match self {
            Self::Platform => &PLATFORM,
            Self::LegacyCascade => &LEGACY,
        }
    }
}

/// Per-document knobs, fixed when the document is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtomConfig {
    pub double_click_window_ms: u64,
    /// Fire `pointer*` events ahead of the matching mouse events.
    pub emulate_pointer_events: bool,
    pub style_source: StyleSourceKind,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Drop locator matches that are not interactable.
    pub require_displayed_matches: bool,
    pub implicit_wait_ms: u64,
}

impl Default for AtomConfig {
    fn default() -> Self {
        Self {
            double_click_window_ms: 500,
            emulate_pointer_events: false,
            style_source: StyleSourceKind::Platform,
            viewport_width: 800.0,
            viewport_height: 600.0,
            require_displayed_matches: false,
            implicit_wait_ms: 0,
        }
    }
}

impl AtomConfig {
    pub fn with_double_click_window_ms(mut self, window_ms: u64) -> Self {
        self.double_click_window_ms = window_ms;
        self
    }

    pub fn with_pointer_event_emulation(mut self, enabled: bool) -> Self {
        self.emulate_pointer_events = enabled;
        self
    }

    pub fn with_style_source(mut self, kind: StyleSourceKind) -> Self {
        self.style_source = kind;
        self
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_required_displayed_matches(mut self, required: bool) -> Self {
        self.require_displayed_matches = required;
        self
    }

    pub fn with_implicit_wait_ms(mut self, wait_ms: u64) -> Self {
        self.implicit_wait_ms = wait_ms;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| Error::JavascriptError(format!("invalid atom config: {err}")))
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) devices: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            devices: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) scroll_x: f64,
    pub(crate) scroll_y: f64,
}

impl Viewport {
    pub(crate) fn from_config(config: &AtomConfig) -> Self {
        Self {
            width: config.viewport_width,
            height: config.viewport_height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// `:wdc:N` handles handed out to JSON callers.
#[derive(Debug, Default)]
pub(crate) struct ElementCache {
    pub(crate) next_id: usize,
    pub(crate) by_key: HashMap<String, NodeId>,
    pub(crate) by_node: HashMap<NodeId, String>,
}

impl ElementCache {
    pub(crate) fn store(&mut self, node: NodeId) -> String {
        if let Some(key) = self.by_node.get(&node) {
            return key.clone();
        }
        self.next_id += 1;
        let key = format!(":wdc:{}", self.next_id);
        self.by_key.insert(key.clone(), node);
        self.by_node.insert(node, key.clone());
        key
    }

    pub(crate) fn lookup(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }
}
