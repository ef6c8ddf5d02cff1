use std::collections::HashSet;
use std::sync::OnceLock;

use crate::models::VocabularyCandidate;

use super::normalize::{fold, fold_compact};

// Grammatical particles, copulas, pronouns, sentence-final auxiliaries and
// the most basic verbs and nouns. Simplified and traditional forms both
// appear where they differ.
const TRIVIAL_HANZI: &[&str] = &[
    // structural and aspect particles
    "的", "得", "地", "了", "着", "著", "过", "過", "之",
    // sentence-final particles
    "吗", "嗎", "呢", "吧", "啊", "呀", "嘛", "么", "麼", "哦", "啦",
    // copulas, negation, adverbs of degree
    "是", "有", "在", "不", "没", "沒", "没有", "沒有", "很", "太", "也", "都", "就", "才",
    "还", "還", "又", "再", "最", "更",
    // pronouns and demonstratives
    "我", "你", "您", "他", "她", "它", "我们", "我們", "你们", "你們", "他们", "他們",
    "她们", "她們", "它们", "它們", "咱们", "咱們", "自己", "大家", "这", "這", "那", "哪",
    "这个", "這個", "那个", "那個", "这些", "這些", "那些", "什么", "什麼", "怎么", "怎麼",
    "谁", "誰", "个", "個",
    // prepositions and conjunctions
    "和", "与", "與", "跟", "把", "被", "给", "給", "从", "從", "到", "对", "對", "为", "為",
    "让", "讓", "但是", "可是", "因为", "因為", "所以", "如果", "然后", "然後", "或者",
    // modal and basic verbs
    "会", "會", "能", "可以", "要", "想", "去", "来", "來", "说", "說", "看", "做", "吃",
    "喝", "走", "听", "聽", "知道", "觉得", "覺得",
    // basic nouns, numerals and positions
    "人", "天", "年", "月", "日", "时候", "時候", "东西", "東西", "今天", "明天", "昨天",
    "一", "二", "两", "兩", "三", "四", "五", "六", "七", "八", "九", "十", "上", "下",
    "中", "里", "裡", "裏", "大", "小", "好", "多", "少",
];

// Pinyin spellings for passages rendered in pinyin. Tone marks are folded
// before lookup, so `shì` and `SHI` both hit.
const TRIVIAL_PINYIN: &[&str] = &[
    "de", "le", "zhe", "guò", "ma", "ne", "ba", "a", "ya", "me", "shì", "yǒu", "zài", "bù",
    "méi", "méiyǒu", "hěn", "tài", "yě", "dōu", "jiù", "hái", "wǒ", "nǐ", "nín", "tā",
    "wǒmen", "nǐmen", "tāmen", "zánmen", "zìjǐ", "dàjiā", "zhè", "nà", "nǎ", "zhège",
    "nàge", "shénme", "zěnme", "shéi", "gè", "hé", "gēn", "bǎ", "bèi", "gěi", "cóng",
    "dào", "duì", "wèi", "ràng", "dànshì", "kěshì", "yīnwèi", "suǒyǐ", "rúguǒ", "ránhòu",
    "huì", "néng", "kěyǐ", "yào", "xiǎng", "qù", "lái", "shuō", "kàn", "zuò", "chī", "hē",
    "rén", "tiān", "nián", "jīntiān", "míngtiān", "zuótiān", "yī", "èr", "sān", "hǎo",
    "dà", "xiǎo", "duō", "shǎo",
];

fn trivial_set() -> &'static HashSet<String> {
    static SET: OnceLock<HashSet<String>> = OnceLock::new();
    SET.get_or_init(|| {
        TRIVIAL_HANZI
            .iter()
            .chain(TRIVIAL_PINYIN.iter())
            .map(|term| fold_compact(term))
            .collect()
    })
}

// Decides whether a token is too basic to count as new vocabulary, no matter
// what the generator claimed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonTermFilter;

impl CommonTermFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn is_trivial(&self, token: &str) -> bool {
        let folded = fold_compact(fold(token).trim());
        !folded.is_empty() && trivial_set().contains(&folded)
    }

    // Candidates are judged by their character forms; pinyin is only used
    // when no characters were supplied, since many content words share a
    // toneless spelling with a particle.
    pub fn is_trivial_candidate(&self, candidate: &VocabularyCandidate) -> bool {
        let hanzi = [Some(candidate.simplified.as_str()), candidate.traditional.as_deref()];
        let mut any_hanzi = false;
        for form in hanzi.into_iter().flatten() {
            if form.trim().is_empty() {
                continue;
            }
            any_hanzi = true;
            if self.is_trivial(form) {
                return true;
            }
        }
        !any_hanzi && self.is_trivial(&candidate.pinyin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(simplified: &str, traditional: Option<&str>, pinyin: &str) -> VocabularyCandidate {
        VocabularyCandidate {
            simplified: simplified.to_string(),
            traditional: traditional.map(String::from),
            pinyin: pinyin.to_string(),
            meaning: "m".to_string(),
            part_of_speech: None,
            level: None,
            category: None,
            context_sentence: None,
            is_new: true,
            is_review: false,
        }
    }

    #[test]
    fn test_every_listed_term_is_trivial() {
        let filter = CommonTermFilter::new();
        for term in TRIVIAL_HANZI.iter().chain(TRIVIAL_PINYIN.iter()) {
            assert!(filter.is_trivial(term), "{} should be trivial", term);
            assert!(filter.is_trivial(&term.to_uppercase()), "{} uppercased", term);
            assert!(filter.is_trivial(&fold(term)), "{} folded", term);
        }
    }

    #[test]
    fn test_tone_and_case_variants() {
        let filter = CommonTermFilter::new();
        assert!(filter.is_trivial("SHÌ"));
        assert!(filter.is_trivial("shi"));
        assert!(filter.is_trivial(" Wǒmen "));
        assert!(filter.is_trivial("wo men"));
    }

    #[test]
    fn test_content_words_are_not_trivial() {
        let filter = CommonTermFilter::new();
        assert!(!filter.is_trivial("经济"));
        assert!(!filter.is_trivial("jīngjì"));
        assert!(!filter.is_trivial("可持续发展"));
        assert!(!filter.is_trivial(""));
    }

    #[test]
    fn test_candidate_judged_by_characters() {
        let filter = CommonTermFilter::new();
        assert!(filter.is_trivial_candidate(&candidate("我们", Some("我們"), "wǒmen")));
        assert!(filter.is_trivial_candidate(&candidate("这个", Some("這個"), "zhège")));
        // 事 shares its toneless pinyin with 是 but is a content word
        assert!(!filter.is_trivial_candidate(&candidate("事", None, "shì")));
        assert!(filter.is_trivial_candidate(&candidate("", None, "shì")));
    }
}
