use crate::dom::NodeId;
use crate::{Error, FieldKey, Harness, Result};

fn product_page() -> &'static str {
    r#"
<div class="product">
  <form data-type="add-to-cart-form" id="product-form">
    <div class="recipient-fields">
      <label for="gift-toggle">Enviar como regalo</label>
      <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle">
      <input type="text" name="properties[Sender name]" id="sender-name">
      <input type="text" name="properties[Recipient name]" id="recipient-name">
      <input type="email" name="properties[Recipient email]" id="recipient-email">
    </div>
    <div class="product-form__buttons">
      <button type="submit" id="add-to-cart">Agregar al carrito</button>
    </div>
  </form>
  <button type="button" class="cowlendar-btn" id="book-now">Reservar</button>
</div>
"#
}

fn no_reservation_page() -> &'static str {
    r#"
<div class="product">
  <form data-type="add-to-cart-form" id="product-form">
    <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle">
    <input type="text" name="properties[Sender name]" id="sender-name">
    <input type="text" name="properties[Recipient name]" id="recipient-name">
    <input type="email" name="properties[Recipient email]" id="recipient-email">
    <button type="submit" id="add-to-cart">Agregar al carrito</button>
  </form>
</div>
"#
}

fn fill_all_fields(harness: &mut Harness) -> Result<()> {
    harness.type_text("#sender-name", "Ana")?;
    harness.type_text("#recipient-name", "Luis")?;
    harness.type_text("#recipient-email", "luis@example.com")?;
    Ok(())
}

fn child_position(harness: &Harness, parent: NodeId, node: NodeId) -> Option<usize> {
    harness.dom.nodes[parent.index()]
        .children
        .iter()
        .position(|child| *child == node)
}

#[test]
fn parses_storefront_markup() -> Result<()> {
    let harness = Harness::from_html(product_page())?;
    assert!(harness.exists("#gift-toggle")?);
    assert_eq!(harness.count("form")?, 1);
    assert_eq!(harness.count("input")?, 4);
    harness.assert_text("label", "Enviar como regalo")?;
    Ok(())
}

#[test]
fn script_bodies_stay_inert() -> Result<()> {
    let harness = Harness::from_html(
        r#"<div id="host"></div><script>if (a < b) { document.write("<p>never</p>"); }</script>"#,
    )?;
    assert_eq!(harness.count("p")?, 0);
    assert_eq!(harness.count("script")?, 1);
    assert!(harness.text("script")?.contains("a < b"));
    Ok(())
}

#[test]
fn textarea_text_becomes_its_value() -> Result<()> {
    let harness = Harness::from_html("<textarea id=\"note\">hola</textarea>")?;
    harness.assert_value("#note", "hola")?;
    Ok(())
}

#[test]
fn selector_quoted_values_may_contain_brackets() -> Result<()> {
    let harness = Harness::from_html(product_page())?;
    assert_eq!(
        harness.count(r#"input[name="properties[Sender name]"]"#)?,
        1
    );
    assert_eq!(
        harness.count(r#"input[name="properties[__shopify_send_gift_card_to_recipient]"]"#)?,
        1
    );
    Ok(())
}

#[test]
fn selector_pseudo_classes_groups_and_combinators() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    assert_eq!(harness.count("input[type=\"checkbox\"]:checked")?, 0);
    harness.set_checked("#gift-toggle", true)?;
    assert_eq!(harness.count("input[type=\"checkbox\"]:checked")?, 1);
    assert_eq!(harness.count("#sender-name, #recipient-name")?, 2);
    assert_eq!(harness.count("form > .recipient-fields")?, 1);
    assert_eq!(harness.count("form > #sender-name")?, 0);
    assert_eq!(harness.count("button:not([type])")?, 0);
    Ok(())
}

#[test]
fn unsupported_selector_is_a_typed_error() -> Result<()> {
    let harness = Harness::from_html(product_page())?;
    assert!(matches!(
        harness.count("div + p"),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(
        harness.count("li:nth-child(2)"),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(
        harness.count("input[name=\"unterminated]"),
        Err(Error::UnsupportedSelector(_))
    ));
    Ok(())
}

#[test]
fn unchecked_checkbox_short_circuits_to_valid() -> Result<()> {
    let harness = Harness::from_html(product_page())?;
    let result = harness.evaluate()?;
    assert!(result.is_valid);
    assert!(result.missing.is_empty());
    harness.assert_disabled("#book-now", false)?;
    Ok(())
}

#[test]
fn absent_checkbox_is_valid() -> Result<()> {
    let harness = Harness::from_html(
        r#"<form data-type="add-to-cart-form"><button type="submit" id="go">Ir</button></form>"#,
    )?;
    assert!(harness.evaluate()?.is_valid);
    Ok(())
}

#[test]
fn checked_with_blank_fields_reports_all_in_declaration_order() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    let result = harness.evaluate()?;
    assert!(!result.is_valid);
    assert_eq!(
        result.missing,
        vec![
            FieldKey::SenderName,
            FieldKey::RecipientName,
            FieldKey::RecipientEmail
        ]
    );
    Ok(())
}

#[test]
fn whitespace_only_values_classify_as_missing() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.type_text("#sender-name", " \t\u{00A0} ")?;
    harness.type_text("#recipient-name", "Luis")?;
    harness.type_text("#recipient-email", "luis@example.com")?;
    let result = harness.evaluate()?;
    assert_eq!(result.missing, vec![FieldKey::SenderName]);

    harness.type_text("#sender-name", "Ana")?;
    harness.type_text("#recipient-email", "   ")?;
    let result = harness.evaluate()?;
    assert_eq!(result.missing, vec![FieldKey::RecipientEmail]);
    Ok(())
}

#[test]
fn node_matching_and_connectivity() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    let toggle = harness.select_one("#gift-toggle")?;
    assert!(harness.dom.matches_selector(toggle, "input[type=\"checkbox\"]")?);
    assert!(!harness.dom.matches_selector(toggle, "button")?);
    assert!(harness.dom.is_connected(toggle));

    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;
    let panel = harness.select_one(".gift-recipient-validation-error")?;
    harness.advance_time(5000)?;
    assert!(!harness.dom.is_connected(panel));
    Ok(())
}

#[test]
fn missing_control_counts_as_missing() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<form data-type="add-to-cart-form">
  <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle">
  <input type="text" name="properties[Recipient name]" id="recipient-name" value="Luis">
  <input type="email" name="properties[Recipient email]" id="recipient-email" value="luis@example.com">
</form>
"#,
    )?;
    harness.set_checked("#gift-toggle", true)?;
    assert_eq!(harness.evaluate()?.missing, vec![FieldKey::SenderName]);
    Ok(())
}

#[test]
fn checkbox_name_pattern_fallback() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<form data-type="add-to-cart-form">
  <input type="checkbox" name="attributes[send_gift_card_to_recipient]" id="gift-toggle">
  <input type="text" name="properties[Sender name]" id="sender-name">
  <input type="text" name="properties[Recipient name]" id="recipient-name">
  <input type="email" name="properties[Recipient email]" id="recipient-email">
</form>
"#,
    )?;
    harness.set_checked("#gift-toggle", true)?;
    assert!(!harness.evaluate()?.is_valid);
    harness.set_checked("#gift-toggle", false)?;
    assert!(harness.evaluate()?.is_valid);
    Ok(())
}

#[test]
fn field_id_fallback_locators() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<form data-type="add-to-cart-form">
  <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle">
  <input type="text" id="gift-sender-name">
  <input type="text" id="gift-recipient-name">
  <input type="email" id="gift-recipient-email">
</form>
"#,
    )?;
    harness.set_checked("#gift-toggle", true)?;
    assert!(!harness.evaluate()?.is_valid);
    harness.type_text("#gift-sender-name", "Ana")?;
    harness.type_text("#gift-recipient-name", "Luis")?;
    harness.type_text("#gift-recipient-email", "luis@example.com")?;
    assert!(harness.evaluate()?.is_valid);
    Ok(())
}

#[test]
fn invalid_state_disables_gate_targets() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    for selector in ["#book-now", "#add-to-cart"] {
        harness.assert_disabled(selector, true)?;
        assert!(harness.has_class(selector, "gift-gate-disabled")?);
        assert_eq!(harness.style(selector, "opacity")?, "0.5");
        assert_eq!(harness.style(selector, "cursor")?, "not-allowed");
    }
    Ok(())
}

#[test]
fn valid_state_restores_gate_targets() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    fill_all_fields(&mut harness)?;
    for selector in ["#book-now", "#add-to-cart"] {
        harness.assert_disabled(selector, false)?;
        assert!(!harness.has_class(selector, "gift-gate-disabled")?);
        assert_eq!(harness.style(selector, "opacity")?, "");
        assert_eq!(harness.style(selector, "cursor")?, "");
    }
    Ok(())
}

#[test]
fn disabled_reservation_button_swallows_clicks() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.click("#book-now")?;
    assert_eq!(harness.count(".gift-recipient-validation-error")?, 0);
    assert_eq!(harness.accepted_submit_count(), 0);
    Ok(())
}

#[test]
fn reservation_click_event_shows_error_and_focuses() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.dispatch("#book-now", "click")?;
    assert_eq!(harness.count(".gift-recipient-validation-error")?, 1);
    harness.assert_focused("#sender-name")?;
    assert_eq!(harness.accepted_submit_count(), 0);
    Ok(())
}

#[test]
fn invalid_form_submit_is_canceled() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.type_text("#sender-name", "Ana")?;
    harness.type_text("#recipient-email", "luis@example.com")?;
    harness.submit("#product-form")?;
    assert_eq!(harness.accepted_submit_count(), 0);
    assert_eq!(harness.count(".gift-recipient-validation-error")?, 1);
    assert!(harness.was_scrolled_into_view(".gift-recipient-validation-error")?);
    harness.assert_focused("#recipient-name")?;
    Ok(())
}

#[test]
fn valid_form_submit_is_accepted() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    fill_all_fields(&mut harness)?;
    harness.submit("#product-form")?;
    assert_eq!(harness.accepted_submit_count(), 1);
    assert_eq!(harness.count(".gift-recipient-validation-error")?, 0);
    Ok(())
}

#[test]
fn submit_preview_gives_feedback_without_canceling() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.dispatch("#add-to-cart", "click")?;
    assert_eq!(harness.count(".gift-recipient-validation-error")?, 1);
    assert_eq!(harness.accepted_submit_count(), 0);

    fill_all_fields(&mut harness)?;
    harness.show_error(&[FieldKey::SenderName])?;
    harness.dispatch("#add-to-cart", "click")?;
    harness.assert_not_exists(".gift-recipient-validation-error")?;
    Ok(())
}

#[test]
fn error_panel_is_singular() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;
    harness.submit("#product-form")?;
    harness.dispatch("#book-now", "click")?;
    assert_eq!(harness.count(".gift-recipient-validation-error")?, 1);
    Ok(())
}

#[test]
fn error_panel_content_is_localized() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.type_text("#sender-name", "Ana")?;
    harness.submit("#product-form")?;
    harness.assert_text(
        ".gift-recipient-validation-error p",
        "Por favor completa los datos del regalo antes de continuar.",
    )?;
    assert_eq!(harness.count(".gift-recipient-validation-error li")?, 2);
    let items = harness.text(".gift-recipient-validation-error ul")?;
    assert!(items.contains("el nombre del destinatario"));
    assert!(items.contains("el email del destinatario"));
    assert!(!items.contains("el nombre del remitente"));
    Ok(())
}

#[test]
fn error_placement_prefers_dedicated_slot() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<form data-type="add-to-cart-form" id="product-form">
  <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle">
  <div data-form-error>Mensaje antiguo</div>
  <div class="product-form__buttons"><button type="submit">Agregar</button></div>
</form>
"#,
    )?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;
    harness.assert_exists("[data-form-error] > .gift-recipient-validation-error")?;
    assert!(!harness.text("[data-form-error]")?.contains("Mensaje antiguo"));
    Ok(())
}

#[test]
fn error_placement_before_buttons_wrapper() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;

    let panel = harness.select_one(".gift-recipient-validation-error")?;
    let wrapper = harness.select_one(".product-form__buttons")?;
    let parent = harness.dom.parent(wrapper).unwrap();
    assert_eq!(harness.dom.parent(panel), Some(parent));
    let panel_pos = child_position(&harness, parent, panel).unwrap();
    let wrapper_pos = child_position(&harness, parent, wrapper).unwrap();
    assert_eq!(panel_pos + 1, wrapper_pos);
    Ok(())
}

#[test]
fn error_placement_before_reservation_button() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<div class="product">
  <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle" checked>
  <button type="button" class="cowlendar-btn" id="book-now">Reservar</button>
</div>
"#,
    )?;
    harness.dispatch("#book-now", "click")?;

    let panel = harness.select_one(".gift-recipient-validation-error")?;
    let button = harness.select_one("#book-now")?;
    let parent = harness.dom.parent(button).unwrap();
    assert_eq!(harness.dom.parent(panel), Some(parent));
    let panel_pos = child_position(&harness, parent, panel).unwrap();
    let button_pos = child_position(&harness, parent, button).unwrap();
    assert_eq!(panel_pos + 1, button_pos);
    Ok(())
}

#[test]
fn error_placement_after_recipient_fields() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<div class="wrapper">
  <div class="recipient-fields">
    <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle" checked>
  </div>
  <p id="after">contenido</p>
</div>
"#,
    )?;
    harness.show_error(&[FieldKey::RecipientEmail])?;

    let panel = harness.select_one(".gift-recipient-validation-error")?;
    let fields = harness.select_one(".recipient-fields")?;
    let parent = harness.dom.parent(fields).unwrap();
    assert_eq!(harness.dom.parent(panel), Some(parent));
    let panel_pos = child_position(&harness, parent, panel).unwrap();
    let fields_pos = child_position(&harness, parent, fields).unwrap();
    assert_eq!(fields_pos + 1, panel_pos);
    Ok(())
}

#[test]
fn error_placement_falls_back_to_document() -> Result<()> {
    let mut harness = Harness::from_html("<p>hola</p>")?;
    harness.show_error(&[FieldKey::SenderName])?;
    let panel = harness.select_one(".gift-recipient-validation-error")?;
    assert_eq!(harness.dom.parent(panel), Some(harness.dom.root));
    Ok(())
}

#[test]
fn error_auto_dismisses_after_five_seconds() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;
    harness.advance_time(4999)?;
    harness.assert_exists(".gift-recipient-validation-error")?;
    harness.advance_time(1)?;
    harness.assert_not_exists(".gift-recipient-validation-error")?;
    Ok(())
}

#[test]
fn newer_error_supersedes_pending_dismissal() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;
    harness.advance_time(3000)?;
    harness.submit("#product-form")?;

    // The first panel's dismiss timer fires here; the replacement stays.
    harness.advance_time(2000)?;
    harness.assert_exists(".gift-recipient-validation-error")?;

    harness.advance_time(3000)?;
    harness.assert_not_exists(".gift-recipient-validation-error")?;
    Ok(())
}

#[test]
fn clear_error_removes_every_panel() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;
    harness.clear_error()?;
    harness.assert_not_exists(".gift-recipient-validation-error")?;
    Ok(())
}

#[test]
fn rebinding_never_duplicates_listeners() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.bind_gate_listeners()?;
    harness.bind_gate_listeners()?;
    harness.bind_gate_listeners()?;

    let form = harness.select_one("#product-form")?;
    let toggle = harness.select_one("#gift-toggle")?;
    let button = harness.select_one("#book-now")?;
    assert_eq!(harness.listeners.listener_count(form, "submit"), 1);
    assert_eq!(harness.listeners.listener_count(toggle, "change"), 1);
    assert_eq!(harness.listeners.listener_count(button, "click"), 1);
    Ok(())
}

#[test]
fn duplicate_discovery_passes_fire_handlers_once() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.bind_gate_listeners()?;
    harness.bind_gate_listeners()?;

    harness.enable_trace(true);
    harness.dispatch("#gift-toggle", "change")?;
    let logs = harness.take_trace_logs();
    let invocations = logs
        .iter()
        .filter(|line| line.starts_with("[event]") && line.contains("GiftControlsChanged"))
        .count();
    assert_eq!(invocations, 1);
    Ok(())
}

#[test]
fn no_poll_when_reservation_button_is_present() -> Result<()> {
    let harness = Harness::from_html(product_page())?;
    assert!(harness.pending_timers().is_empty());
    Ok(())
}

#[test]
fn discovery_poll_waits_for_reservation_embed() -> Result<()> {
    let mut harness = Harness::from_html(no_reservation_page())?;
    let pending = harness.pending_timers();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].interval_ms, Some(1000));

    // One empty poll; the interval keeps running, rescheduled from the tick.
    harness.advance_time(2500)?;
    assert_eq!(harness.pending_timers().len(), 1);
    assert_eq!(harness.pending_timers()[0].due_at, 3500);

    harness.append_html(
        ".product",
        r#"<button type="button" class="cowlendar-btn" id="late-button">Reservar</button>"#,
    )?;
    harness.advance_time(1000)?;
    assert!(harness.pending_timers().is_empty());

    harness.set_checked("#gift-toggle", true)?;
    harness.assert_disabled("#late-button", true)?;
    Ok(())
}

#[test]
fn discovery_poll_can_be_cleared_by_hand() -> Result<()> {
    let mut harness = Harness::from_html(no_reservation_page())?;
    let id = harness.pending_timers()[0].id;
    assert!(harness.clear_timer(id));
    assert!(!harness.clear_timer(id));
    assert!(harness.pending_timers().is_empty());
    Ok(())
}

#[test]
fn click_toggles_checkbox_and_reevaluates() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.click("#gift-toggle")?;
    harness.assert_checked("#gift-toggle", true)?;
    harness.assert_disabled("#add-to-cart", true)?;
    harness.click("#gift-toggle")?;
    harness.assert_checked("#gift-toggle", false)?;
    harness.assert_disabled("#add-to-cart", false)?;
    Ok(())
}

#[test]
fn radio_groups_keep_single_selection() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<form>
  <input type="radio" name="wrap" id="wrap-classic" checked>
  <input type="radio" name="wrap" id="wrap-festive">
</form>
"#,
    )?;
    harness.click("#wrap-festive")?;
    harness.assert_checked("#wrap-festive", true)?;
    harness.assert_checked("#wrap-classic", false)?;
    Ok(())
}

#[test]
fn focus_moves_between_controls() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.focus("#sender-name")?;
    harness.assert_focused("#sender-name")?;
    harness.focus("#recipient-name")?;
    harness.assert_focused("#recipient-name")?;
    assert!(harness.assert_focused("#sender-name").is_err());
    Ok(())
}

#[test]
fn clock_reads_and_absolute_advance() -> Result<()> {
    let mut harness = Harness::from_html(no_reservation_page())?;
    assert_eq!(harness.now_ms(), 0);

    harness.advance_time_to(1000)?;
    assert_eq!(harness.now_ms(), 1000);
    assert_eq!(harness.pending_timers()[0].due_at, 2000);

    assert!(matches!(
        harness.advance_time_to(500),
        Err(Error::DomRuntime(_))
    ));
    assert!(matches!(harness.advance_time(-1), Err(Error::DomRuntime(_))));
    assert_eq!(harness.now_ms(), 1000);
    Ok(())
}

#[test]
fn clear_all_timers_drops_every_pending_task() -> Result<()> {
    let mut harness = Harness::from_html(no_reservation_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;

    // Discovery poll plus the dismiss timer.
    assert_eq!(harness.pending_timers().len(), 2);
    assert_eq!(harness.clear_all_timers(), 2);
    assert!(harness.pending_timers().is_empty());

    // The dismiss timer is gone, so the panel outlives its usual 5 s.
    harness.advance_time(10_000)?;
    harness.assert_exists(".gift-recipient-validation-error")?;
    Ok(())
}

#[test]
fn timer_step_limit_is_enforced() -> Result<()> {
    let mut harness = Harness::from_html(no_reservation_page())?;
    harness.set_checked("#gift-toggle", true)?;
    harness.submit("#product-form")?;

    assert!(matches!(
        harness.set_timer_step_limit(0),
        Err(Error::DomRuntime(_))
    ));
    harness.set_timer_step_limit(1)?;

    // Poll at 1 s and dismiss at 5 s are both due; the second step trips.
    assert!(matches!(
        harness.advance_time(5000),
        Err(Error::DomRuntime(_))
    ));
    Ok(())
}

#[test]
fn trace_log_limit_bounds_the_buffer() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.enable_trace(true);
    harness.set_trace_stderr(true);
    harness.set_trace_stderr(false);
    assert!(matches!(
        harness.set_trace_log_limit(0),
        Err(Error::DomRuntime(_))
    ));
    harness.set_trace_log_limit(2)?;

    harness.set_checked("#gift-toggle", true)?;
    harness.type_text("#sender-name", "Ana")?;
    let logs = harness.take_trace_logs();
    assert_eq!(logs.len(), 2);
    Ok(())
}

#[test]
fn blur_clears_focus() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.focus("#sender-name")?;
    harness.assert_focused("#sender-name")?;
    harness.blur("#sender-name")?;
    assert!(harness.assert_focused("#sender-name").is_err());

    // Blurring an unfocused control is a no-op.
    harness.blur("#recipient-name")?;
    Ok(())
}

#[test]
fn value_reads_back_typed_text() -> Result<()> {
    let mut harness = Harness::from_html(product_page())?;
    harness.type_text("#sender-name", "Ana María")?;
    assert_eq!(harness.value("#sender-name")?, "Ana María");
    Ok(())
}

#[test]
fn character_entities_decode_in_text_and_attributes() -> Result<()> {
    let mut harness = Harness::from_html(
        r#"
<form data-type="add-to-cart-form" id="product-form">
  <input type="checkbox" name="properties[__shopify_send_gift_card_to_recipient]" id="gift-toggle">
  <input type="text" name="properties[Sender name]" id="sender-name" value="&nbsp;">
  <input type="text" name="properties[Recipient name]" id="recipient-name" value="Tom &amp; Ana">
  <input type="email" name="properties[Recipient email]" id="recipient-email" value="t@example.com">
  <p id="msg">1 &lt; 2 &amp; 3 &#233; &#xe9;</p>
</form>
"#,
    )?;
    assert_eq!(harness.value("#recipient-name")?, "Tom & Ana");
    harness.assert_text("#msg", "1 < 2 & 3 é é")?;

    // A non-breaking-space value is still blank for validation.
    harness.set_checked("#gift-toggle", true)?;
    assert_eq!(harness.evaluate()?.missing, vec![FieldKey::SenderName]);
    Ok(())
}

#[test]
fn dump_escapes_markup_characters() -> Result<()> {
    let harness = Harness::from_html(
        r#"<p id="esc" data-note='say "hola" &amp; more'>1 &lt; 2</p>"#,
    )?;
    let node = harness.select_one("#esc")?;
    let dump = harness.dom.dump_node(node);
    assert!(dump.contains("say &quot;hola&quot; &amp; more"));
    assert!(dump.contains("1 &lt; 2"));
    Ok(())
}

#[test]
fn assertion_failures_carry_a_snippet() -> Result<()> {
    let harness = Harness::from_html(product_page())?;
    let err = harness
        .assert_text("label", "texto equivocado")
        .unwrap_err();
    match err {
        Error::AssertionFailed { dom_snippet, .. } => {
            assert!(dom_snippet.contains("label"));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
