/// Cleans reviewer feedback before it is stored.
///
/// Whitelist sanitization through `ammonia`: formatting tags such as <b> and <p>
/// survive, <script>/<iframe> and event-handler attributes are stripped.
/// Surrounding whitespace is trimmed after cleaning.
pub fn clean_comment(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_comment_strips_scripts() {
        let cleaned = clean_comment("  Good work <script>alert(1)</script><b>keep</b> ");
        assert_eq!(cleaned, "Good work <b>keep</b>");
    }

    #[test]
    fn test_clean_comment_can_become_empty() {
        assert_eq!(clean_comment("<script>x</script>"), "");
    }
}
