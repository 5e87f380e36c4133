//! Static coding questions for the standard (non-generated) practice mode.

use prepai_types::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsaDifficulty {
    Easy,
    Medium,
    Hard,
}

impl DsaDifficulty {
    /// Unknown or missing values map to `Easy`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("medium") => Self::Medium,
            Some("hard") => Self::Hard,
            _ => Self::Easy,
        }
    }
}

pub fn dsa_question(difficulty: DsaDifficulty) -> Question {
    match difficulty {
        DsaDifficulty::Easy => Question::new(
            "Two Sum",
            "Given an array of integers and a target, return the indices of the two numbers that add up to the target.",
            "nums = [2,7,11,15], target = 9",
            "[0,1]",
        ),
        DsaDifficulty::Medium => Question::new(
            "Longest Substring Without Repeating Characters",
            "Find the length of the longest substring without repeating characters.",
            "s = 'abcabcbb'",
            "3",
        ),
        DsaDifficulty::Hard => Question::new(
            "Median of Two Sorted Arrays",
            "Given two sorted arrays, return the median of the combined data in O(log(m+n)) time.",
            "nums1 = [1,3], nums2 = [2]",
            "2.0",
        ),
    }
}
