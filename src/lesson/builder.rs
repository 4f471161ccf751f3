use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::LessonError;
use crate::lesson::types::{AnswerOption, CardId, Lesson, Task, WordCard};

pub const LESSON_LEN: usize = 15;
pub const HARD_COUNT: usize = 5;
pub const OPTIONS_PER_TASK: usize = 4;

/// Hard words that open the lesson; the rest of the hard set closes it.
const HARD_OPENING: usize = 3;

/// Builds the fixed 15-task curriculum for one session.
///
/// The five highest-rated cards are shuffled and split around ten randomly
/// sampled remaining cards: three open the lesson and two close it. Each task
/// then draws distractors from a freshly shuffled copy of the whole pool,
/// preferring cards of the same category as the task's card.
pub struct LessonBuilder;

impl LessonBuilder {
    pub fn build<R: Rng + ?Sized>(pool: &[WordCard], rng: &mut R) -> Result<Lesson, LessonError> {
        let pool = distinct_cards(pool);
        if pool.len() < LESSON_LEN {
            return Err(LessonError::InsufficientWords(pool.len()));
        }

        let order = lesson_order(&pool, rng);
        let tasks = order
            .into_iter()
            .map(|main| build_task(main, &pool, rng))
            .collect::<Vec<_>>();

        tracing::debug!(pool_size = pool.len(), tasks = tasks.len(), "lesson built");
        Ok(Lesson::new(tasks))
    }
}

fn distinct_cards(pool: &[WordCard]) -> Vec<&WordCard> {
    let mut seen = HashSet::with_capacity(pool.len());
    pool.iter().filter(|card| seen.insert(card.id)).collect()
}

fn lesson_order<'a, R: Rng + ?Sized>(pool: &[&'a WordCard], rng: &mut R) -> Vec<&'a WordCard> {
    let mut ranked = pool.to_vec();
    ranked.sort_by(|a, b| b.difficulty_rating.cmp(&a.difficulty_rating));

    let mut rest = ranked.split_off(HARD_COUNT);
    let mut hard = ranked;
    hard.shuffle(rng);
    rest.shuffle(rng);
    rest.truncate(LESSON_LEN - HARD_COUNT);

    let closing = hard.split_off(HARD_OPENING);
    let mut order = hard;
    order.extend(rest);
    order.extend(closing);
    order
}

fn build_task<R: Rng + ?Sized>(main: &WordCard, pool: &[&WordCard], rng: &mut R) -> Task {
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);

    let mut picked: Vec<&WordCard> = Vec::with_capacity(OPTIONS_PER_TASK);
    let mut used: HashSet<CardId> = HashSet::with_capacity(OPTIONS_PER_TASK);
    picked.push(main);
    used.insert(main.id);

    for card in &shuffled {
        if picked.len() == OPTIONS_PER_TASK {
            break;
        }
        if card.category == main.category && used.insert(card.id) {
            picked.push(card);
        }
    }

    // Not enough cards share the category; fill from the same shuffled pool.
    for card in &shuffled {
        if picked.len() == OPTIONS_PER_TASK {
            break;
        }
        if used.insert(card.id) {
            picked.push(card);
        }
    }

    let pattern = main.normalized_word();
    let mut options = picked
        .into_iter()
        .map(|card| AnswerOption {
            is_correct: card.normalized_word() == pattern,
            is_main: card.id == main.id,
            card: card.clone(),
        })
        .collect::<Vec<_>>();
    options.shuffle(rng);

    Task::new(into_array(options))
}

fn into_array(mut options: Vec<AnswerOption>) -> [AnswerOption; OPTIONS_PER_TASK] {
    let d = options.pop();
    let c = options.pop();
    let b = options.pop();
    let a = options.pop();
    match (a, b, c, d) {
        (Some(a), Some(b), Some(c), Some(d)) => [a, b, c, d],
        // The pool holds at least LESSON_LEN distinct cards, so four are always found.
        _ => unreachable!("task assembled with fewer than four options"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(id: CardId, word: &str, category: &str, rating: i64) -> WordCard {
        WordCard {
            id,
            word: word.to_string(),
            description: format!("meaning of {word}"),
            example: format!("an example using {word}"),
            category: category.to_string(),
            difficulty_rating: rating,
        }
    }

    fn pool(n: usize) -> Vec<WordCard> {
        (0..n)
            .map(|i| {
                let category = if i % 2 == 0 { "noun" } else { "verb" };
                card(i as CardId, &format!("word{i}"), category, 0)
            })
            .collect()
    }

    #[test]
    fn test_rejects_small_pool_with_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = LessonBuilder::build(&pool(14), &mut rng).unwrap_err();
        assert!(matches!(err, LessonError::InsufficientWords(14)));
    }

    #[test]
    fn test_rejects_duplicate_identities_counted_once() {
        let mut cards = pool(14);
        cards.push(cards[0].clone());
        let mut rng = StdRng::seed_from_u64(1);
        let err = LessonBuilder::build(&cards, &mut rng).unwrap_err();
        assert!(matches!(err, LessonError::InsufficientWords(14)));
    }

    #[test]
    fn test_builds_fifteen_tasks_of_four_distinct_cards() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let lesson = LessonBuilder::build(&pool(40), &mut rng).unwrap();
            assert_eq!(lesson.len(), LESSON_LEN);
            for task in lesson.tasks() {
                let ids: HashSet<_> = task.options().map(|(_, o)| o.card.id).collect();
                assert_eq!(ids.len(), OPTIONS_PER_TASK);
                assert!(!task.correct_keys().is_empty());
                assert_eq!(task.options().filter(|(_, o)| o.is_main).count(), 1);
            }
        }
    }

    #[test]
    fn test_main_cards_are_distinct_across_lesson() {
        let mut rng = StdRng::seed_from_u64(7);
        let lesson = LessonBuilder::build(&pool(30), &mut rng).unwrap();
        let mains: HashSet<_> = lesson.tasks().iter().map(|t| t.main_card().id).collect();
        assert_eq!(mains.len(), LESSON_LEN);
    }

    #[test]
    fn test_hardest_cards_open_and_close_the_lesson() {
        let cards: Vec<_> = (0..15)
            .map(|i| card(i, &format!("w{i}"), "noun", if i < 5 { 10 + i } else { -i }))
            .collect();
        let hard: HashSet<CardId> = (0..5).collect();

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let lesson = LessonBuilder::build(&cards, &mut rng).unwrap();
            for (index, task) in lesson.tasks().iter().enumerate() {
                let is_hard = hard.contains(&task.main_card().id);
                let at_edge = index < 3 || index >= 13;
                assert_eq!(is_hard, at_edge, "index {index} seed {seed}");
            }
        }
    }

    #[test]
    fn test_large_pool_subsamples_easy_words() {
        let mut cards = pool(60);
        for card in cards.iter_mut().take(5) {
            card.difficulty_rating = 100;
        }
        let mut rng = StdRng::seed_from_u64(3);
        let lesson = LessonBuilder::build(&cards, &mut rng).unwrap();
        let middle: Vec<_> = lesson.tasks()[3..13].iter().map(|t| t.main_card().id).collect();
        assert!(middle.iter().all(|id| *id >= 5));
        assert_eq!(middle.iter().collect::<HashSet<_>>().len(), 10);
    }

    #[test]
    fn test_prefers_same_category_distractors() {
        let mut cards: Vec<_> = (0..4).map(|i| card(i, &format!("n{i}"), "noun", 0)).collect();
        cards.extend((4..20).map(|i| card(i, &format!("v{i}"), "verb", 0)));

        let mut rng = StdRng::seed_from_u64(11);
        let lesson = LessonBuilder::build(&cards, &mut rng).unwrap();
        for task in lesson.tasks() {
            let main = task.main_card();
            if main.category == "noun" {
                assert!(task.options().all(|(_, o)| o.card.category == "noun"));
            }
        }
    }

    #[test]
    fn test_degrades_to_other_categories_when_short() {
        let mut cards = vec![card(0, "alpha", "adverb", 50), card(1, "beta", "adverb", 0)];
        cards.extend((2..15).map(|i| card(i, &format!("n{i}"), "noun", 0)));

        let mut rng = StdRng::seed_from_u64(5);
        let lesson = LessonBuilder::build(&cards, &mut rng).unwrap();
        let task = lesson
            .tasks()
            .iter()
            .find(|t| t.main_card().id == 0)
            .expect("hardest card is in the lesson");

        let categories: Vec<_> = task.options().map(|(_, o)| o.card.category.as_str()).collect();
        assert_eq!(categories.iter().filter(|c| **c == "adverb").count(), 2);
        assert_eq!(categories.iter().filter(|c| **c == "noun").count(), 2);
    }

    #[test]
    fn test_duplicate_word_text_marks_every_match_correct() {
        let mut cards = vec![card(0, "Bank", "noun", 9), card(1, " bank ", "noun", 0)];
        cards.extend((2..15).map(|i| card(i, &format!("w{i}"), "verb", 0)));

        let mut rng = StdRng::seed_from_u64(2);
        let lesson = LessonBuilder::build(&cards, &mut rng).unwrap();
        let task = lesson
            .tasks()
            .iter()
            .find(|t| t.main_card().id == 0)
            .expect("card 0 is a task");

        assert_eq!(task.correct_keys().len(), 2);
    }

    #[test]
    fn test_same_seed_gives_same_lesson() {
        let cards = pool(25);
        let a = LessonBuilder::build(&cards, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = LessonBuilder::build(&cards, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
