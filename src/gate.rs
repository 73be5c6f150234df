use fancy_regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::dom::NodeId;
use crate::{Error, EventState, Harness, Listener, Result, TaskKind};

/// Canonical identity of a required gift field. Ordering of the variants is
/// the declaration order missing fields are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    SenderName,
    RecipientName,
    RecipientEmail,
}

/// A required field: its identity, the localized label used in the error
/// panel, and its locator selectors tried in order (first match wins).
#[derive(Debug, Clone)]
pub struct RequiredField {
    pub key: FieldKey,
    pub label: String,
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub missing: Vec<FieldKey>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            missing: Vec::new(),
        }
    }
}

/// Every selector, pattern, label, and delay the gate uses. The defaults
/// mirror the hosted storefront; overrides exist for themes with different
/// markup.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub checkbox_selector: String,
    pub checkbox_name_pattern: String,
    pub fields: Vec<RequiredField>,
    pub reservation_button_selector: String,
    pub product_form_selector: String,
    pub submit_button_selector: String,
    pub error_class: String,
    pub error_heading: String,
    pub error_slot_selector: String,
    pub buttons_wrapper_selector: String,
    pub recipient_fields_selector: String,
    pub disabled_class: String,
    pub poll_interval_ms: i64,
    pub dismiss_delay_ms: i64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            checkbox_selector:
                "input[name=\"properties[__shopify_send_gift_card_to_recipient]\"]".into(),
            checkbox_name_pattern: "send_gift_card_to_recipient".into(),
            fields: vec![
                RequiredField {
                    key: FieldKey::SenderName,
                    label: "el nombre del remitente".into(),
                    selectors: vec![
                        "input[name=\"properties[Sender name]\"]".into(),
                        "#gift-sender-name".into(),
                    ],
                },
                RequiredField {
                    key: FieldKey::RecipientName,
                    label: "el nombre del destinatario".into(),
                    selectors: vec![
                        "input[name=\"properties[Recipient name]\"]".into(),
                        "#gift-recipient-name".into(),
                    ],
                },
                RequiredField {
                    key: FieldKey::RecipientEmail,
                    label: "el email del destinatario".into(),
                    selectors: vec![
                        "input[name=\"properties[Recipient email]\"]".into(),
                        "#gift-recipient-email".into(),
                    ],
                },
            ],
            reservation_button_selector: ".cowlendar-btn".into(),
            product_form_selector: "form[data-type=\"add-to-cart-form\"]".into(),
            submit_button_selector:
                "button[type=\"submit\"], input[type=\"submit\"], button:not([type])".into(),
            error_class: "gift-recipient-validation-error".into(),
            error_heading: "Por favor completa los datos del regalo antes de continuar.".into(),
            error_slot_selector: "[data-form-error]".into(),
            buttons_wrapper_selector: ".product-form__buttons".into(),
            recipient_fields_selector: ".recipient-fields".into(),
            disabled_class: "gift-gate-disabled".into(),
            poll_interval_ms: 1000,
            dismiss_delay_ms: 5000,
        }
    }
}

/// Identity of a gate handler. Binding is keyed on this, which is what makes
/// remove-then-add de-duplication work across repeated discovery passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateHandler {
    ReservationClick,
    FormSubmit,
    SubmitPreview,
    GiftControlsChanged,
}

#[derive(Debug)]
pub(crate) struct GateState {
    pub(crate) config: GateConfig,
    checkbox_pattern: Regex,
    error_generation: u64,
    poll_timer: Option<i64>,
}

impl GateState {
    pub(crate) fn new(config: GateConfig) -> Result<Self> {
        let checkbox_pattern = Regex::new(&config.checkbox_name_pattern)
            .map_err(|err| Error::InvalidPattern(err.to_string()))?;
        Ok(Self {
            config,
            checkbox_pattern,
            error_generation: 0,
            poll_timer: None,
        })
    }
}

impl Harness {
    /// Attaches the gate to the current document: binds all handlers, brings
    /// gate targets in line with the current validity, and arms the discovery
    /// poll when the reservation embed has not been injected yet.
    pub(crate) fn install_gate(&mut self) -> Result<()> {
        let reservation_found = self.bind_gate_listeners()?;
        let result = self.evaluate()?;
        self.sync_gate_targets(&result)?;

        if !reservation_found {
            let interval = self.gate.config.poll_interval_ms;
            let id = self.set_interval(TaskKind::DiscoveryPoll, interval);
            self.gate.poll_timer = Some(id);
            self.trace_line(format!(
                "[gate] install no reservation button, polling every {interval}ms"
            ));
        } else {
            self.trace_line("[gate] install bound reservation button".to_string());
        }

        Ok(())
    }

    /// One discovery pass. Every listener is removed by identity before it is
    /// added back, so running this any number of times leaves exactly one
    /// listener per (node, event, handler). Returns whether a reservation
    /// button was found.
    pub(crate) fn bind_gate_listeners(&mut self) -> Result<bool> {
        let reservation_selector = self.gate.config.reservation_button_selector.clone();
        let form_selector = self.gate.config.product_form_selector.clone();
        let submit_selector = self.gate.config.submit_button_selector.clone();
        let fields = self.gate.config.fields.clone();

        let reservation_buttons = self.dom.query_selector_all(&reservation_selector)?;
        for node in reservation_buttons.iter().copied() {
            self.rebind(node, "click", GateHandler::ReservationClick);
        }

        let forms = self.dom.query_selector_all(&form_selector)?;
        for form in forms.iter().copied() {
            self.rebind(form, "submit", GateHandler::FormSubmit);
            for button in self.dom.query_selector_all_from(form, &submit_selector)? {
                self.rebind(button, "click", GateHandler::SubmitPreview);
            }
        }

        if let Some(checkbox) = self.locate_gift_checkbox()? {
            self.rebind(checkbox, "change", GateHandler::GiftControlsChanged);
        }

        for field in &fields {
            if let Some(control) = self.resolve_field_control(field)? {
                self.rebind(control, "input", GateHandler::GiftControlsChanged);
                self.rebind(control, "change", GateHandler::GiftControlsChanged);
            }
        }

        Ok(!reservation_buttons.is_empty())
    }

    fn rebind(&mut self, node: NodeId, event: &str, handler: GateHandler) {
        self.listeners.remove(node, event, false, handler);
        self.listeners.add(
            node,
            event.to_string(),
            Listener {
                handler,
                capture: false,
            },
        );
    }

    pub(crate) fn run_gate_handler(
        &mut self,
        handler: GateHandler,
        event: &mut EventState,
    ) -> Result<()> {
        match handler {
            GateHandler::ReservationClick | GateHandler::FormSubmit => {
                let result = self.evaluate()?;
                self.sync_gate_targets(&result)?;
                self.trace_line(format!(
                    "[gate] {handler:?} valid={} missing={:?}",
                    result.is_valid, result.missing
                ));
                if !result.is_valid {
                    event.prevent_default();
                    event.stop_propagation();
                    self.show_error(&result.missing)?;
                    self.focus_first_missing(&result.missing)?;
                }
            }
            GateHandler::SubmitPreview => {
                // Early feedback only; cancellation is the form handler's job.
                let result = self.evaluate()?;
                self.sync_gate_targets(&result)?;
                self.trace_line(format!(
                    "[gate] SubmitPreview valid={} missing={:?}",
                    result.is_valid, result.missing
                ));
                if result.is_valid {
                    self.clear_error()?;
                } else {
                    self.show_error(&result.missing)?;
                }
            }
            GateHandler::GiftControlsChanged => {
                let result = self.evaluate()?;
                self.sync_gate_targets(&result)?;
                self.trace_line(format!(
                    "[gate] GiftControlsChanged valid={} missing={:?}",
                    result.is_valid, result.missing
                ));
                if result.is_valid {
                    self.clear_error()?;
                }
            }
        }
        Ok(())
    }

    /// Pure validity check against the current document. Valid whenever the
    /// gift checkbox is absent or unchecked; otherwise every required field
    /// whose control is missing or trimmed-empty is reported, in declaration
    /// order.
    pub fn evaluate(&self) -> Result<ValidationResult> {
        let Some(checkbox) = self.locate_gift_checkbox()? else {
            return Ok(ValidationResult::valid());
        };
        if !self.dom.checked(checkbox)? {
            return Ok(ValidationResult::valid());
        }

        let mut missing = Vec::new();
        for field in &self.gate.config.fields {
            match self.resolve_field_control(field)? {
                None => missing.push(field.key),
                Some(control) => {
                    if is_blank(&self.dom.value(control)?) {
                        missing.push(field.key);
                    }
                }
            }
        }

        Ok(ValidationResult {
            is_valid: missing.is_empty(),
            missing,
        })
    }

    /// Builds and places the validation error panel. Any previous panel is
    /// removed first, so the document never holds more than one. Arms a fresh
    /// dismiss timer; timers armed for earlier panels become no-ops.
    pub fn show_error(&mut self, missing: &[FieldKey]) -> Result<()> {
        self.gate.error_generation += 1;
        let generation = self.gate.error_generation;
        self.remove_error_nodes()?;

        let error_class = self.gate.config.error_class.clone();
        let heading_text = self.gate.config.error_heading.clone();
        let labels = missing
            .iter()
            .filter_map(|key| self.field_label(*key))
            .collect::<Vec<_>>();

        let panel = self.dom.create_detached_element("div");
        self.dom.set_attr(panel, "class", &error_class)?;
        self.dom.set_attr(panel, "role", "alert")?;
        for (property, value) in [
            ("color", "#e11d48"),
            ("background", "#fff1f2"),
            ("border", "1px solid #e11d48"),
            ("border-radius", "6px"),
            ("padding", "10px"),
            ("margin-top", "10px"),
            ("font-size", "14px"),
        ] {
            self.dom.style_set(panel, property, value)?;
        }

        let heading = self.dom.create_detached_element("p");
        self.dom.style_set(heading, "margin", "0 0 6px")?;
        self.dom.style_set(heading, "font-weight", "600")?;
        self.dom.set_text_content(heading, &heading_text)?;
        self.dom.append_child(panel, heading)?;

        let list = self.dom.create_detached_element("ul");
        self.dom.style_set(list, "margin", "0")?;
        self.dom.style_set(list, "padding-left", "18px")?;
        for label in &labels {
            let item = self.dom.create_detached_element("li");
            self.dom.set_text_content(item, label)?;
            self.dom.append_child(list, item)?;
        }
        self.dom.append_child(panel, list)?;

        self.place_error_panel(panel)?;
        self.scroll_into_view_node(panel);

        let result = self.evaluate()?;
        self.sync_gate_targets(&result)?;

        let delay = self.gate.config.dismiss_delay_ms;
        self.set_timeout(TaskKind::DismissError { generation }, delay);
        self.trace_line(format!(
            "[gate] show_error generation={generation} missing={missing:?}"
        ));
        Ok(())
    }

    fn place_error_panel(&mut self, panel: NodeId) -> Result<()> {
        let slot_selector = self.gate.config.error_slot_selector.clone();
        let wrapper_selector = self.gate.config.buttons_wrapper_selector.clone();
        let reservation_selector = self.gate.config.reservation_button_selector.clone();
        let fields_selector = self.gate.config.recipient_fields_selector.clone();

        if let Some(slot) = self.dom.query_selector(&slot_selector)? {
            self.dom.set_text_content(slot, "")?;
            return self.dom.append_child(slot, panel);
        }

        if let Some(wrapper) = self.dom.query_selector(&wrapper_selector)? {
            if let Some(parent) = self.dom.parent(wrapper) {
                return self.dom.insert_before(parent, panel, wrapper);
            }
        }

        if let Some(button) = self.dom.query_selector(&reservation_selector)? {
            if let Some(parent) = self.dom.parent(button) {
                return self.dom.insert_before(parent, panel, button);
            }
        }

        if let Some(fields) = self.dom.query_selector(&fields_selector)? {
            if self.dom.parent(fields).is_some() {
                return self.dom.insert_after(fields, panel);
            }
        }

        let root = self.dom.root;
        self.dom.append_child(root, panel)
    }

    /// Removes every error panel from the document.
    pub fn clear_error(&mut self) -> Result<()> {
        let removed = self.remove_error_nodes()?;
        if removed > 0 {
            self.trace_line(format!("[gate] clear_error removed={removed}"));
        }
        Ok(())
    }

    fn remove_error_nodes(&mut self) -> Result<usize> {
        let selector = format!(".{}", self.gate.config.error_class);
        let panels = self.dom.query_selector_all(&selector)?;
        let removed = panels.len();
        for panel in panels {
            self.dom.remove_node(panel)?;
        }
        Ok(removed)
    }

    /// Dismiss-timer body. Only the timer armed for the latest panel may
    /// remove it; timers for superseded panels do nothing.
    pub(crate) fn dismiss_expired_error(&mut self, generation: u64) -> Result<()> {
        if generation != self.gate.error_generation {
            self.trace_line(format!(
                "[gate] dismiss generation={generation} superseded"
            ));
            return Ok(());
        }
        let removed = self.remove_error_nodes()?;
        self.trace_line(format!(
            "[gate] dismiss generation={generation} removed={removed}"
        ));
        Ok(())
    }

    /// Derives every gate target's disabled flag, marker class, and
    /// opacity/cursor styling from `result`. Fully stateless per target: the
    /// enabled preset undoes everything the disabled preset applies.
    pub fn sync_gate_targets(&mut self, result: &ValidationResult) -> Result<()> {
        let disabled_class = self.gate.config.disabled_class.clone();
        for target in self.gate_targets()? {
            if result.is_valid {
                self.dom.set_disabled(target, false)?;
                self.dom.remove_class(target, &disabled_class)?;
                self.dom.style_set(target, "opacity", "")?;
                self.dom.style_set(target, "cursor", "")?;
            } else {
                self.dom.set_disabled(target, true)?;
                self.dom.add_class(target, &disabled_class)?;
                self.dom.style_set(target, "opacity", "0.5")?;
                self.dom.style_set(target, "cursor", "not-allowed")?;
            }
        }
        Ok(())
    }

    fn gate_targets(&self) -> Result<Vec<NodeId>> {
        let mut targets = self
            .dom
            .query_selector_all(&self.gate.config.reservation_button_selector)?;
        let forms = self
            .dom
            .query_selector_all(&self.gate.config.product_form_selector)?;
        for form in forms {
            for button in self
                .dom
                .query_selector_all_from(form, &self.gate.config.submit_button_selector)?
            {
                if !targets.contains(&button) {
                    targets.push(button);
                }
            }
        }
        Ok(targets)
    }

    fn locate_gift_checkbox(&self) -> Result<Option<NodeId>> {
        if let Some(node) = self.dom.query_selector(&self.gate.config.checkbox_selector)? {
            return Ok(Some(node));
        }

        // Theme variants mangle the property name; fall back to a pattern
        // match over every checkbox's name attribute.
        for node in self.dom.all_element_nodes() {
            if !self.dom.is_checkbox_input(node) {
                continue;
            }
            let Some(name) = self.dom.attr(node, "name") else {
                continue;
            };
            if self.gate.checkbox_pattern.is_match(&name).unwrap_or(false) {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    fn resolve_field_control(&self, field: &RequiredField) -> Result<Option<NodeId>> {
        for selector in &field.selectors {
            if let Some(node) = self.dom.query_selector(selector)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    fn field_label(&self, key: FieldKey) -> Option<String> {
        self.gate
            .config
            .fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.label.clone())
    }

    fn focus_first_missing(&mut self, missing: &[FieldKey]) -> Result<()> {
        let Some(first) = missing.first().copied() else {
            return Ok(());
        };
        let field = self
            .gate
            .config
            .fields
            .iter()
            .find(|field| field.key == first)
            .cloned();
        if let Some(field) = field {
            if let Some(control) = self.resolve_field_control(&field)? {
                self.focus_node(control)?;
            }
        }
        Ok(())
    }

    /// Interval body for reservation-embed discovery. Once the button shows
    /// up, rebinds everything and cancels the interval.
    pub(crate) fn run_discovery_poll(&mut self) -> Result<()> {
        let reservation_selector = self.gate.config.reservation_button_selector.clone();
        if self.dom.query_selector(&reservation_selector)?.is_none() {
            self.trace_line("[gate] discovery poll: no reservation button yet".to_string());
            return Ok(());
        }

        self.bind_gate_listeners()?;
        let result = self.evaluate()?;
        self.sync_gate_targets(&result)?;
        if let Some(id) = self.gate.poll_timer.take() {
            self.clear_timeout(id);
        }
        self.trace_line("[gate] discovery poll: reservation button bound".to_string());
        Ok(())
    }
}

/// Trimmed-emptiness after NFC normalization, so composed and decomposed
/// input classify the same way.
fn is_blank(value: &str) -> bool {
    value.nfc().collect::<String>().trim().is_empty()
}
