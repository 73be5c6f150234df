use gift_gate::Harness;
use proptest::prelude::*;

proptest! {
    // Malformed selectors must surface as typed errors, never panics.
    #[test]
    fn arbitrary_selectors_never_panic(selector in "\\PC{0,40}") {
        let harness = Harness::from_html("<div id=\"a\" class=\"b\"><p>x</p></div>").unwrap();
        let _ = harness.count(&selector);
    }

    // Quoted attribute values may contain brackets, parens, and spaces, the
    // shape Shopify line-item property names take.
    #[test]
    fn quoted_attr_values_with_brackets_match(value in "[A-Za-z0-9 _()\\[\\]-]{1,24}") {
        let html = format!("<input name=\"{value}\" id=\"probe\">");
        let harness = Harness::from_html(&html).unwrap();
        let selector = format!("input[name=\"{value}\"]");
        prop_assert_eq!(harness.count(&selector).unwrap(), 1);
    }
}
