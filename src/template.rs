//! Placeholder substitution for campaign subject and body templates.
//!
//! Substitution is purely textual: each `{{token}}` whose token is bound in
//! the per-recipient mapping is replaced by its value. Unbound tokens pass
//! through verbatim, so a template written against a newer binding set still
//! renders under an older engine. Rendering never fails.

use std::collections::HashMap;

/// A subject and body with all placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Render a single template against a binding map.
///
/// Deterministic and side-effect free; safe to call concurrently with
/// shared template inputs.
pub fn render(template: &str, bindings: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let token = &after_open[..end];
                match bindings.get(token.trim()) {
                    Some(value) => out.push_str(value),
                    // Unbound token passes through untouched.
                    None => {
                        out.push_str("{{");
                        out.push_str(token);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[end + 2..];
            }
            // Unterminated opener is literal text.
            None => {
                out.push_str("{{");
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Render subject and body templates for one recipient.
pub fn render_message(
    subject: &str,
    body: &str,
    bindings: &HashMap<String, String>,
) -> RenderedMessage {
    RenderedMessage {
        subject: render(subject, bindings),
        body: render(body, bindings),
    }
}

/// Standard per-recipient bindings: `email` is the full address, `name` its
/// local part.
pub fn recipient_bindings(email: &str) -> HashMap<String, String> {
    let name = email.split('@').next().unwrap_or(email);
    HashMap::from([
        ("email".to_string(), email.to_string()),
        ("name".to_string(), name.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_bound_placeholder() {
        let out = render("Hi {{name}}", &bindings(&[("name", "Ann")]));
        assert_eq!(out, "Hi Ann");
    }

    #[test]
    fn test_unbound_placeholder_passes_through() {
        let out = render("Hi {{name}} from {{company}}", &bindings(&[("name", "Ann")]));
        assert_eq!(out, "Hi Ann from {{company}}");
    }

    #[test]
    fn test_repeated_placeholder() {
        let out = render("{{x}} and {{x}}", &bindings(&[("x", "1")]));
        assert_eq!(out, "1 and 1");
    }

    #[test]
    fn test_token_whitespace_tolerated() {
        let out = render("Hi {{ name }}", &bindings(&[("name", "Ann")]));
        assert_eq!(out, "Hi Ann");
    }

    #[test]
    fn test_unterminated_opener_is_literal() {
        let out = render("Hi {{name", &bindings(&[("name", "Ann")]));
        assert_eq!(out, "Hi {{name");
    }

    #[test]
    fn test_no_placeholders() {
        let out = render("plain text", &HashMap::new());
        assert_eq!(out, "plain text");
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(render("", &bindings(&[("name", "Ann")])), "");
    }

    #[test]
    fn test_render_message() {
        let msg = render_message(
            "Welcome {{name}}",
            "Your address is {{email}}",
            &recipient_bindings("ann@example.com"),
        );
        assert_eq!(msg.subject, "Welcome ann");
        assert_eq!(msg.body, "Your address is ann@example.com");
    }

    #[test]
    fn test_recipient_bindings() {
        let b = recipient_bindings("ann@example.com");
        assert_eq!(b.get("email").map(String::as_str), Some("ann@example.com"));
        assert_eq!(b.get("name").map(String::as_str), Some("ann"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let b = bindings(&[("name", "Ann")]);
        let first = render("Hi {{name}} {{other}}", &b);
        let second = render("Hi {{name}} {{other}}", &b);
        assert_eq!(first, second);
    }
}
