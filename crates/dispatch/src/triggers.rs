//! Command trigger matching on the trimmed working text.

/// `true` when `text` equals one of `triggers` exactly.
pub fn matches_exact(triggers: &[String], text: &str) -> bool {
    let text = text.trim();
    triggers
        .iter()
        .map(|t| t.trim())
        .any(|t| !t.is_empty() && t == text)
}

/// Strip the first matching trigger prefix and return the trimmed argument.
///
/// Every trigger, CJK included, must be followed by whitespace or the end of
/// the text: `/picture` does not match `/pictures` and `角色扮演` does not
/// match `角色扮演游戏推荐`. A configured trailing space is the separator
/// itself, so `"角色扮演 "` also matches the bare word with an empty argument.
pub fn strip_trigger<'a>(triggers: &[String], text: &'a str) -> Option<&'a str> {
    let text = text.trim();
    triggers
        .iter()
        .map(|t| t.trim_end())
        .filter(|t| !t.is_empty())
        .find_map(|trigger| {
            let rest = text.strip_prefix(trigger)?;
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return None;
            }
            Some(rest.trim())
        })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("/clear", true)]
    #[case("  清除 ", true)]
    #[case("/clear now", false)]
    #[case("", false)]
    fn exact(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(matches_exact(&list(&["/clear", "清除"]), text), expected);
    }

    #[test]
    fn blank_triggers_never_match() {
        assert!(!matches_exact(&list(&["  "]), ""));
        assert_eq!(strip_trigger(&list(&[""]), "anything"), None);
    }

    #[rstest]
    #[case("/picture a red fox", Some("a red fox"))]
    #[case("/picture", Some(""))]
    #[case("/pictures of cats", None)]
    #[case("图片创作有哪些技巧", None)]
    #[case("图片创作 一只猫", Some("一只猫"))]
    #[case("draw a cat", None)]
    fn prefix(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(strip_trigger(&list(&["/picture", "图片创作"]), text), expected);
    }

    #[rstest]
    #[case("角色扮演 一个海盗", Some("一个海盗"))]
    #[case("角色扮演", Some(""))]
    #[case("角色扮演游戏推荐", None)]
    #[case("/system you are a pirate", Some("you are a pirate"))]
    #[case("/systemd status", None)]
    fn configured_trailing_space_is_the_separator(
        #[case] text: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(strip_trigger(&list(&["/system ", "角色扮演 "]), text), expected);
    }
}
