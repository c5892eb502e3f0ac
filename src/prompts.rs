pub const CLARIFY_SYSTEM: &str = include_str!("../data/prompts/clarify_system.txt");
pub const CLARIFY_USER: &str = include_str!("../data/prompts/clarify_user.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("{{a}} and {{b}}", &[("a", "cats")]), "cats and {{b}}");
    }

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!CLARIFY_SYSTEM.is_empty());
        assert!(!CLARIFY_USER.is_empty());
    }

    #[test]
    fn test_clarify_user_has_request_placeholder() {
        assert!(CLARIFY_USER.contains("{{request}}"));
        assert_eq!(
            render(CLARIFY_USER, &[("request", "like this video")]),
            "ORIGINAL: like this video"
        );
    }
}
