use crate::emotion::Emotion;
use crate::lexicon::{self, INTENSITY_BANDS, NEGATORS, POSITIVE_WORDS, TIME_INDICATORS};

const NEGATION_FACTOR: f64 = -0.7;
const POSITIVE_FACTOR: f64 = 1.3;
const POSITION_SPREAD: f64 = 0.5;
const NEAR_TIE_GAP: f64 = 0.2;

/// Accumulated score per emotion, indexed in `Emotion::ALL` order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmotionScores([f64; 6]);

impl EmotionScores {
    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0[index_of(emotion)]
    }

    fn add(&mut self, emotion: Emotion, value: f64) {
        self.0[index_of(emotion)] += value;
    }

    fn clamp_negative(&mut self) {
        for score in self.0.iter_mut() {
            *score = score.max(0.0);
        }
    }

    /// Emotions with a positive score, highest first. Equal scores keep
    /// `Emotion::ALL` order.
    pub fn ranked(&self) -> Vec<(Emotion, f64)> {
        let mut ranked: Vec<(Emotion, f64)> = Emotion::ALL
            .into_iter()
            .map(|emotion| (emotion, self.get(emotion)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL
            .into_iter()
            .map(move |emotion| (emotion, self.get(emotion)))
    }
}

fn index_of(emotion: Emotion) -> usize {
    emotion as usize
}

/// Splits on sentence terminals and newlines, dropping blank fragments.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.trim()
        .split(['.', '!', '?', '。', '\n'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Later sentences weigh more, up to just under 1.5x for the last one.
pub fn position_weight(index: usize, count: usize) -> f64 {
    if count == 0 {
        return 1.0;
    }
    1.0 + (index as f64 / count as f64) * POSITION_SPREAD
}

fn adjacent_before(sentence: &str, modifier: &str, keyword: &str) -> bool {
    sentence.contains(&format!("{modifier}{keyword}"))
        || sentence.contains(&format!("{modifier} {keyword}"))
}

fn adjacent_either(sentence: &str, modifier: &str, keyword: &str) -> bool {
    adjacent_before(sentence, modifier, keyword)
        || sentence.contains(&format!("{keyword} {modifier}"))
}

fn time_multiplier(sentence: &str) -> f64 {
    TIME_INDICATORS
        .iter()
        .flat_map(|group| {
            group
                .words
                .iter()
                .filter(move |word| sentence.contains(**word))
                .map(move |_| group.weight)
        })
        .product()
}

/// Modifiers count only when concatenated with the keyword or one space
/// away. A negator further off, or after the keyword as in `행복하지
/// 않았다`, is not seen. Several adjacent negators still flip the sign once.
fn keyword_score(sentence: &str, keyword: &str, time_weight: f64, position: f64) -> f64 {
    let mut score = time_weight;

    for band in INTENSITY_BANDS.iter() {
        for word in band.words {
            if adjacent_either(sentence, word, keyword) {
                score *= band.weight;
            }
        }
    }

    if NEGATORS
        .iter()
        .any(|negator| adjacent_before(sentence, negator, keyword))
    {
        score *= NEGATION_FACTOR;
    }

    for word in POSITIVE_WORDS {
        if adjacent_before(sentence, word, keyword) {
            score *= POSITIVE_FACTOR;
        }
    }

    score * position
}

/// Score vector for `text`, negative totals clamped to zero.
pub fn score(text: &str) -> EmotionScores {
    let sentences = split_sentences(text);
    let count = sentences.len();
    let mut scores = EmotionScores::default();

    for (index, sentence) in sentences.iter().enumerate() {
        let position = position_weight(index, count);
        let time_weight = time_multiplier(sentence);

        for emotion in Emotion::ALL {
            for keyword in lexicon::keywords(emotion) {
                if sentence.contains(keyword) {
                    scores.add(emotion, keyword_score(sentence, keyword, time_weight, position));
                }
            }
        }
    }

    scores.clamp_negative();
    scores
}

/// Picks the winning emotion from a clamped score vector.
pub fn resolve(scores: &EmotionScores) -> Emotion {
    let ranked = scores.ranked();
    let Some(&(leader, top)) = ranked.first() else {
        return Emotion::Calm;
    };

    if let Some(&(runner_up, second)) = ranked.get(1) {
        if (top - second) / top < NEAR_TIE_GAP {
            match (leader, runner_up) {
                (Emotion::Stressed, Emotion::Sad) | (Emotion::Sad, Emotion::Stressed) => {
                    return Emotion::Stressed;
                }
                (Emotion::Happy, Emotion::Excited) | (Emotion::Excited, Emotion::Happy) => {
                    return Emotion::Excited;
                }
                _ => {}
            }
        }
    }

    leader
}

/// Classifies diary text. Never fails; text without any signal is calm.
pub fn classify(text: &str) -> Emotion {
    resolve(&score(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_and_blank_input_is_calm() {
        assert_eq!(classify(""), Emotion::Calm);
        assert_eq!(classify("   "), Emotion::Calm);
        assert_eq!(classify("\n\n. !"), Emotion::Calm);
    }

    #[test]
    fn text_without_keywords_is_calm() {
        assert_eq!(classify("밥을 먹었다. 집에 갔다"), Emotion::Calm);
        assert_eq!(score("hello world").ranked(), Vec::new());
    }

    #[test]
    fn splits_on_terminals_and_newlines() {
        let sentences = split_sentences("  첫 문장. 둘째!셋째?\n넷째。 ");
        assert_eq!(sentences, vec!["첫 문장", "둘째", "셋째", "넷째"]);
    }

    #[test]
    fn position_weight_grows_with_index() {
        approx(position_weight(0, 4), 1.0);
        approx(position_weight(2, 4), 1.25);
        approx(position_weight(3, 4), 1.375);
    }

    #[test]
    fn single_strong_cue_is_happy() {
        let scores = score("오늘 정말 행복했다");
        // "행복" and "행복했" both match: today x2, high band x1.5, booster x1.3
        approx(scores.get(Emotion::Happy), 2.0 * (2.0 * 1.5 * 1.3));
        assert_eq!(classify("오늘 정말 행복했다"), Emotion::Happy);
    }

    #[test]
    fn adjacent_negation_cancels_to_calm() {
        let unnegated = score("오늘 행복했다");
        let negated = score("오늘 안 행복했다");
        assert!(unnegated.get(Emotion::Happy) > 0.0);
        approx(negated.get(Emotion::Happy), 0.0);
        assert_eq!(classify("오늘 안 행복했다"), Emotion::Calm);
    }

    #[test]
    fn negated_keyword_offsets_other_matches_of_same_emotion() {
        // "안 우울" flips to -0.7, "눈물" adds 1.0
        let scores = score("안 우울 눈물");
        approx(scores.get(Emotion::Sad), 1.0 - 0.7);
    }

    #[test]
    fn trailing_negation_is_not_detected() {
        assert_eq!(classify("오늘 행복하지 않았다"), Emotion::Happy);
    }

    #[test]
    fn multiple_adjacent_negators_flip_once() {
        // both "못행복" and "안 행복" are adjacent; a double flip would give 1.49
        approx(score("못행복 안 행복 기쁨").get(Emotion::Happy), 0.3);
        assert_eq!(classify("못행복 안 행복 기쁨"), Emotion::Happy);
    }

    #[test]
    fn time_indicators_compound() {
        // "오늘" (2.0) and "어제" (1.5) both present
        approx(score("어제 오늘 슬픔").get(Emotion::Sad), 3.0);
        approx(score("예전 슬픔").get(Emotion::Sad), 1.0);
    }

    #[test]
    fn intensity_applies_on_either_side() {
        approx(score("슬픔 조금").get(Emotion::Sad), 1.2);
        approx(score("가끔슬픔").get(Emotion::Sad), 0.8);
        approx(score("슬픔 가끔").get(Emotion::Sad), 0.8);
    }

    #[test]
    fn later_sentence_contributes_more() {
        let first = score("슬픔. 밥을 먹었다").get(Emotion::Sad);
        let last = score("밥을 먹었다. 슬픔").get(Emotion::Sad);
        approx(first, 1.0);
        approx(last, 1.25);
        assert!(last > first);
    }

    #[test]
    fn stressed_beats_sad_on_near_tie() {
        let text = "회의 압박. 슬픔도 있었다. 밥을 먹었다. 집에 갔다. 잠을 잤다";
        let scores = score(text);
        approx(scores.get(Emotion::Stressed), 1.0);
        approx(scores.get(Emotion::Sad), 1.1);
        assert_eq!(scores.ranked()[0].0, Emotion::Sad);
        assert_eq!(classify(text), Emotion::Stressed);
    }

    #[test]
    fn excited_beats_happy_on_near_tie() {
        let text = "두근. 기쁨. 밥을 먹었다. 집에 갔다. 잠을 잤다";
        let scores = score(text);
        approx(scores.get(Emotion::Excited), 1.0);
        approx(scores.get(Emotion::Happy), 1.1);
        assert_eq!(classify(text), Emotion::Excited);
    }

    #[test]
    fn clear_lead_is_not_overridden() {
        assert_eq!(classify("압박. 슬픔. 눈물"), Emotion::Sad);
    }

    #[test]
    fn other_near_ties_keep_the_leader() {
        assert_eq!(
            classify("평온. 기쁨. 밥을 먹었다. 집에 갔다. 잠을 잤다"),
            Emotion::Happy
        );
        assert_eq!(
            classify("기쁨. 평온. 밥을 먹었다. 집에 갔다. 잠을 잤다"),
            Emotion::Calm
        );
    }

    #[test]
    fn exact_ties_resolve_in_enumeration_order() {
        let scores = score("평온 피곤");
        approx(scores.get(Emotion::Calm), 1.0);
        approx(scores.get(Emotion::Exhausted), 1.0);
        assert_eq!(resolve(&scores), Emotion::Calm);
    }

    #[test]
    fn classification_is_repeatable() {
        let text = "요즘 너무 피곤하다. 해야 할 일이 많아서 머리가 복잡해";
        let first = classify(text);
        for _ in 0..5 {
            assert_eq!(classify(text), first);
        }
    }
}
