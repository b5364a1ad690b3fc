use serde::{Deserialize, Serialize};

use crate::models::domain::quiz_item::{
    Difficulty, IdentificationItem, MatchSet, MultipleChoiceItem, TrueFalseItem,
};

/// Values keyed by difficulty tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DifficultyTiers<T> {
    pub easy: T,
    pub medium: T,
    pub hard: T,
}

impl<T> DifficultyTiers<T> {
    pub fn get(&self, difficulty: Difficulty) -> &T {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn get_mut(&mut self, difficulty: Difficulty) -> &mut T {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }

    pub fn from_fn(mut build: impl FnMut(Difficulty) -> T) -> Self {
        Self {
            easy: build(Difficulty::Easy),
            medium: build(Difficulty::Medium),
            hard: build(Difficulty::Hard),
        }
    }
}

/// Quiz record keyed by quiz type, then difficulty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub true_false: DifficultyTiers<Vec<TrueFalseItem>>,
    pub multiple_choice: DifficultyTiers<Vec<MultipleChoiceItem>>,
    pub identification: DifficultyTiers<Vec<IdentificationItem>>,
    pub matching: DifficultyTiers<MatchSet>,
}

impl QuestionSet {
    pub fn total_items(&self) -> usize {
        Difficulty::ALL
            .iter()
            .map(|d| {
                self.true_false.get(*d).len()
                    + self.multiple_choice.get(*d).len()
                    + self.identification.get(*d).len()
                    + self.matching.get(*d).pairs.len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}
