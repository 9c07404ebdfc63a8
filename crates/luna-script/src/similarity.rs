/// Score above which an utterance counts as following the script.
pub const ON_SCRIPT_THRESHOLD: f32 = 0.3;

/// Tokens of this many characters or fewer are ignored.
const MIN_TOKEN_CHARS: usize = 2;

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .collect()
}

/// Scores how closely a spoken utterance matches the expected line.
///
/// Both texts are split on whitespace, lower-cased, and stripped of tokens of
/// two characters or fewer. A user token matches when it equals, contains, or
/// is contained in any expected token. The score is the number of matching
/// user tokens divided by the larger of the two token counts, so it always
/// lies in `[0.0, 1.0]`. Either side having no tokens yields `0.0`.
pub fn utterance_similarity(utterance: &str, expected: &str) -> f32 {
    let user_tokens = tokenize(utterance);
    let expected_tokens = tokenize(expected);

    if user_tokens.is_empty() || expected_tokens.is_empty() {
        return 0.0;
    }

    let matched = user_tokens
        .iter()
        .filter(|user| {
            expected_tokens
                .iter()
                .any(|exp| user.contains(exp.as_str()) || exp.contains(user.as_str()))
        })
        .count();

    matched as f32 / user_tokens.len().max(expected_tokens.len()) as f32
}

/// Returns `true` when the utterance is close enough to count as on script.
pub fn is_on_script(utterance: &str, expected: &str) -> bool {
    utterance_similarity(utterance, expected) > ON_SCRIPT_THRESHOLD
}
