use crate::emotion::Emotion;

pub struct WeightedWords {
    pub words: &'static [&'static str],
    pub weight: f64,
}

/// Surface forms matched as plain substrings. A keyword listed twice for the
/// same emotion counts twice.
pub fn keywords(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => HAPPY,
        Emotion::Sad => SAD,
        Emotion::Stressed => STRESSED,
        Emotion::Excited => EXCITED,
        Emotion::Calm => CALM,
        Emotion::Exhausted => EXHAUSTED,
    }
}

const HAPPY: &[&str] = &[
    "행복", "기쁨", "즐거움", "웃음", "좋아", "만족", "성취", "축하", "축하해", "기뻐",
    "웃었", "즐거웠", "행복했", "성공", "완료", "끝냈", "해냈", "좋았", "멋있", "최고",
    "신나", "신났", "재밌", "재미있", "흥미", "놀라", "감동", "뿌듯", "자랑", "뛰어",
    "환상", "대박", "훌륭", "완벽", "근사", "아름다", "예쁘", "사랑스러", "달달", "달콤",
];

const SAD: &[&str] = &[
    "우울", "슬픔", "눈물", "힘들어", "지쳐", "외로워", "허전", "아파", "상처", "절망",
    "슬펐", "우울했", "외로웠", "허전했", "아팠", "상처받", "실패", "망했", "끝났", "이별",
    "울었", "눈물이", "서럽", "비참", "막막", "답답", "암울", "어둡", "침울", "처량",
    "쓸쓸", "고독", "공허", "무너", "좌절", "포기", "체념", "한숨", "후회", "미안",
];

const STRESSED: &[&str] = &[
    "스트레스", "짜증", "화나", "분노", "열받", "짜증나", "힘들어", "압박", "긴장", "불안",
    "화났", "짜증났", "분노했", "열받았", "압박받", "긴장했", "불안했", "짜증", "화남", "분노",
    "답답", "골치", "머리", "복잡", "바빠", "바쁘", "급해", "쫓기", "빡쳐", "빡치",
    "신경", "예민", "민감", "날카로", "과로", "피로", "지겨", "귀찮", "성가", "골치",
];

const EXCITED: &[&str] = &[
    "설렘", "두근", "떨려", "긴장", "기대", "새롭", "첫", "만남", "데이트", "로맨스",
    "설렜", "두근거렸", "떨렸", "기대했", "새로웠", "첫번째", "만났", "사랑", "연애", "고백",
    "심장", "가슴", "떨림", "들뜸", "들떠", "흥분", "궁금", "호기심", "관심", "매력",
    "아름답", "예쁘", "멋있", "좋아해", "호감", "끌려", "반해", "매혹", "황홀", "달콤",
];

const CALM: &[&str] = &[
    "평온", "차분", "고요", "여유", "편안", "안정", "조용", "힐링", "휴식", "명상",
    "평온했", "차분했", "고요했", "여유로웠", "편안했", "안정적", "조용했", "힐링했", "휴식했", "명상했",
    "진정", "정적", "고즈넉", "한적", "느긋", "천천히", "여유", "릴렉스", "쉬었", "쉼",
    "평범", "일상", "소소", "담담", "무난", "괜찮", "적당", "알맞", "자연스러", "순수",
];

const EXHAUSTED: &[&str] = &[
    "지침", "피곤", "졸려", "힘들어", "버거워", "복잡", "혼란", "막막", "어려워", "어려움",
    "지쳤", "피곤했", "졸렸", "버거웠", "복잡했", "혼란스러웠", "막막했", "어려웠", "힘들었", "지쳤",
    "무기력", "나른", "둔해", "느려", "정신없", "멍해", "멍하", "흐려", "흐린", "흐림",
    "벅차", "부담", "무거", "짐", "책임", "의무", "해야", "못하", "안되", "실수",
];

pub const NEGATORS: &[&str] = &[
    "안", "못", "없", "아니", "싫", "별로", "그만", "끝", "그만두", "더이상", "이제",
];

/// Generic boosters, applied on top of any intensity band.
pub const POSITIVE_WORDS: &[&str] = &[
    "정말", "너무", "완전", "진짜", "대박", "최고", "완벽", "완전히", "엄청", "진심", "매우", "굉장히",
];

/// Present, recent and past markers. Every marker found in a sentence
/// compounds into the keyword score.
pub static TIME_INDICATORS: [WeightedWords; 3] = [
    WeightedWords {
        words: &["지금", "현재", "요즘", "오늘", "이번", "방금", "막"],
        weight: 2.0,
    },
    WeightedWords {
        words: &["어제", "이틀", "며칠", "최근", "요새", "근래", "lately"],
        weight: 1.5,
    },
    WeightedWords {
        words: &["전에", "옛날", "예전", "과거", "이전", "그때"],
        weight: 1.0,
    },
];

/// High, medium and low intensity bands.
pub static INTENSITY_BANDS: [WeightedWords; 3] = [
    WeightedWords {
        words: &["엄청", "정말", "너무", "완전", "진짜", "대박", "극도로", "최고로"],
        weight: 1.5,
    },
    WeightedWords {
        words: &["좀", "조금", "살짝", "약간", "어느정도", "그럭저럭"],
        weight: 1.2,
    },
    WeightedWords {
        words: &["가끔", "때때로", "간혹", "종종", "이따금"],
        weight: 0.8,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_emotion_has_forty_keywords() {
        for emotion in Emotion::ALL {
            assert_eq!(keywords(emotion).len(), 40, "{emotion}");
        }
    }

    #[test]
    fn duplicates_are_preserved() {
        let count = keywords(Emotion::Stressed)
            .iter()
            .filter(|word| **word == "짜증")
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn no_empty_entries() {
        let modifiers = NEGATORS
            .iter()
            .chain(POSITIVE_WORDS)
            .chain(TIME_INDICATORS.iter().flat_map(|group| group.words))
            .chain(INTENSITY_BANDS.iter().flat_map(|band| band.words));
        for word in Emotion::ALL
            .into_iter()
            .flat_map(keywords)
            .chain(modifiers)
        {
            assert!(!word.is_empty());
        }
    }
}
