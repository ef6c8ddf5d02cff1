// Strips tone diacritics and lowercases. Characters outside the Latin range
// pass through untouched.
pub fn fold(term: &str) -> String {
    term.chars()
        .flat_map(char::to_lowercase)
        .filter_map(fold_char)
        .collect()
}

// `fold` plus removal of whitespace, apostrophes, hyphens and middle dots.
pub fn fold_compact(term: &str) -> String {
    fold(term)
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\'' | '’' | '-' | '·' | '・'))
        .collect()
}

// Pinyin alone would merge homophones such as 事 and 市.
pub fn merge_key(simplified: &str, pinyin: &str) -> String {
    let chars = fold_compact(simplified);
    let sound = fold_compact(pinyin);
    match (chars.is_empty(), sound.is_empty()) {
        (false, false) => format!("{}|{}", chars, sound),
        (false, true) => chars,
        _ => sound,
    }
}

fn fold_char(c: char) -> Option<char> {
    // Combining marks left over from decomposed input.
    if ('\u{0300}'..='\u{036f}').contains(&c) {
        return None;
    }
    let folded = match c {
        'ā' | 'á' | 'ǎ' | 'à' | 'â' | 'ä' => 'a',
        'ē' | 'é' | 'ě' | 'è' | 'ê' | 'ë' => 'e',
        'ī' | 'í' | 'ǐ' | 'ì' | 'î' | 'ï' => 'i',
        'ō' | 'ó' | 'ǒ' | 'ò' | 'ô' | 'ö' => 'o',
        'ū' | 'ú' | 'ǔ' | 'ù' | 'û' => 'u',
        'ü' | 'ǖ' | 'ǘ' | 'ǚ' | 'ǜ' => 'u',
        'ń' | 'ň' | 'ǹ' => 'n',
        'ḿ' => 'm',
        other => other,
    };
    Some(folded)
}
