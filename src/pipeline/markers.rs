use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::vocab::CommonTermFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    New,
    Review,
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*(new|review)\s*:\s*([^{}]+?)\s*\}\}").expect("valid regex")
    })
}

fn kind_of(caps: &Captures) -> MarkerKind {
    match &caps[1] {
        "review" => MarkerKind::Review,
        _ => MarkerKind::New,
    }
}

// Replaces every marker with the bare word.
pub fn strip_markers(text: &str) -> String {
    marker_re().replace_all(text, "$2").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubbedBody {
    pub body: String,
    pub new_count: u32,
    pub review_count: u32,
    pub demoted: Vec<String>,
}

// Unmarks trivial words, leaving the word itself in place, and counts the
// markers that survive.
pub fn demote_trivial(body: &str, filter: &CommonTermFilter) -> ScrubbedBody {
    let mut new_count = 0;
    let mut review_count = 0;
    let mut demoted = Vec::new();

    let scrubbed = marker_re().replace_all(body, |caps: &Captures| {
        let word = &caps[2];
        if filter.is_trivial(word) {
            demoted.push(word.to_string());
            return word.to_string();
        }
        match kind_of(caps) {
            MarkerKind::New => new_count += 1,
            MarkerKind::Review => review_count += 1,
        }
        caps[0].to_string()
    });

    ScrubbedBody {
        body: scrubbed.into_owned(),
        new_count,
        review_count,
        demoted,
    }
}

// Visible character count of a body, markers and whitespace excluded.
pub fn visible_length(body: &str) -> u32 {
    strip_markers(body)
        .chars()
        .filter(|c| !c.is_whitespace())
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markers() {
        assert_eq!(
            strip_markers("今年{{new:经济}}{{ review : 发展 }}很快。"),
            "今年经济发展很快。"
        );
    }

    #[test]
    fn test_demote_keeps_visible_text() {
        let filter = CommonTermFilter::new();
        let body = "{{new:我们}}看到{{new:经济}}的{{review:发展}}{{new:了}}。";
        let scrubbed = demote_trivial(body, &filter);

        assert_eq!(scrubbed.body, "我们看到{{new:经济}}的{{review:发展}}了。");
        assert_eq!(scrubbed.new_count, 1);
        assert_eq!(scrubbed.review_count, 1);
        assert_eq!(scrubbed.demoted, vec!["我们".to_string(), "了".to_string()]);
        assert_eq!(strip_markers(&scrubbed.body), strip_markers(body));
    }

    #[test]
    fn test_visible_length_ignores_markup() {
        assert_eq!(visible_length("{{new:经济}} 很好"), 4);
    }
}
