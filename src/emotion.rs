use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of labels a diary entry can be tagged with.
///
/// The Korean label is the canonical form: it is what gets stored on diary
/// and mood rows and what the music catalog is searched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emotion {
    #[serde(rename = "행복함")]
    Happy,
    #[serde(rename = "우울함")]
    Sad,
    #[serde(rename = "스트레스")]
    Stressed,
    #[serde(rename = "설렘")]
    Excited,
    #[serde(rename = "평온함")]
    Calm,
    #[serde(rename = "지침")]
    Exhausted,
}

impl Emotion {
    /// Ranking order. Exact score ties resolve to the earlier entry.
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Stressed,
        Emotion::Excited,
        Emotion::Calm,
        Emotion::Exhausted,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Happy => "행복함",
            Emotion::Sad => "우울함",
            Emotion::Stressed => "스트레스",
            Emotion::Excited => "설렘",
            Emotion::Calm => "평온함",
            Emotion::Exhausted => "지침",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Emotion::Happy => "당신의 긍정적인 에너지가 느껴져요! 기쁜 마음을 더욱 북돋워줄 음악을 추천해드릴게요.",
            Emotion::Sad => "마음이 무겁고 슬픈 하루였군요. 따뜻한 위로가 담긴 음악으로 마음을 달래보세요.",
            Emotion::Stressed => "긴장되고 스트레스 받는 하루였네요. 마음을 진정시켜줄 편안한 음악을 들려드릴게요.",
            Emotion::Excited => "두근두근 설레는 마음이 느껴져요! 로맨틱하고 기분 좋은 음악으로 설렘을 더해보세요.",
            Emotion::Calm => "차분하고 평온한 하루였군요. 여유롭고 편안한 음악으로 마음의 평화를 유지해보세요.",
            Emotion::Exhausted => "지치고 피곤한 하루였네요. 힐링이 되는 음악으로 마음을 달래보세요.",
        }
    }

    /// Mood value (1-10) stored alongside each entry for trend charts.
    pub fn mood_score(self) -> i32 {
        match self {
            Emotion::Happy => 9,
            Emotion::Excited => 8,
            Emotion::Calm => 7,
            Emotion::Exhausted => 4,
            Emotion::Stressed => 3,
            Emotion::Sad => 2,
        }
    }

    pub fn search_term(self) -> &'static str {
        match self {
            Emotion::Happy => "신나는 노래",
            Emotion::Sad => "위로 발라드",
            Emotion::Stressed => "힐링 음악",
            Emotion::Excited => "설레는 노래",
            Emotion::Calm => "잔잔한 음악",
            Emotion::Exhausted => "피로 회복 음악",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Emotion::ALL
            .into_iter()
            .find(|emotion| {
                emotion.label() == value || format!("{emotion:?}").eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| UnknownEmotion(value.to_string()))
    }
}

/// Description for a stored label; anything unrecognised reads as calm.
pub fn describe(label: &str) -> &'static str {
    label
        .parse::<Emotion>()
        .unwrap_or(Emotion::Calm)
        .description()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.label().parse::<Emotion>(), Ok(emotion));
        }
    }

    #[test]
    fn english_names_parse_case_insensitively() {
        assert_eq!("stressed".parse::<Emotion>(), Ok(Emotion::Stressed));
        assert_eq!("EXHAUSTED".parse::<Emotion>(), Ok(Emotion::Exhausted));
        assert!("angry".parse::<Emotion>().is_err());
    }

    #[test]
    fn describe_falls_back_to_calm() {
        assert_eq!(describe("분노"), Emotion::Calm.description());
        assert_eq!(describe("설렘"), Emotion::Excited.description());
    }

    #[test]
    fn serializes_as_korean_label() {
        let json = serde_json::to_string(&Emotion::Sad).unwrap();
        assert_eq!(json, "\"우울함\"");
        let parsed: Emotion = serde_json::from_str("\"지침\"").unwrap();
        assert_eq!(parsed, Emotion::Exhausted);
    }

    #[test]
    fn mood_scores_stay_in_range() {
        for emotion in Emotion::ALL {
            assert!((1..=10).contains(&emotion.mood_score()));
        }
    }
}
