#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;

use word_lessons::lesson::{CardId, OptionKey, WordCard};
use word_lessons::store::NewWord;
use word_lessons::{LessonService, SubmitResult};

pub const USER: &str = "user-1";

pub fn card(id: CardId, word: &str, category: &str, rating: i64) -> WordCard {
    WordCard {
        id,
        word: word.to_string(),
        description: format!("the meaning of {word}"),
        example: format!("a sentence with {word} in it"),
        category: category.to_string(),
        difficulty_rating: rating,
    }
}

pub fn cards(n: usize) -> Vec<WordCard> {
    (0..n)
        .map(|i| {
            let category = ["noun", "verb", "adjective"][i % 3];
            card(i as CardId + 1, &format!("word{i}"), category, (i % 4) as i64)
        })
        .collect()
}

pub fn new_words(n: usize) -> Vec<NewWord> {
    (0..n)
        .map(|i| NewWord {
            word: format!("word{i}"),
            description: format!("the meaning of word{i}"),
            example: format!("a sentence with word{i} in it"),
            category: Some(["noun", "verb"][i % 2].to_string()),
        })
        .collect()
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

async fn current_keys(service: &LessonService, user_id: &str) -> (Vec<OptionKey>, Vec<OptionKey>) {
    let progress = service.progress(user_id).await.expect("session exists");
    let lesson = service.lesson(user_id).await.expect("session exists");
    let task = lesson.task(progress.task_index).expect("task in range");
    (task.correct_keys(), task.wrong_keys())
}

pub async fn answer_correctly(service: &LessonService, user_id: &str) -> SubmitResult {
    let (correct, _) = current_keys(service, user_id).await;
    service
        .submit_answer(user_id, &correct[0].to_string())
        .await
        .expect("answer accepted")
}

pub async fn answer_wrongly(service: &LessonService, user_id: &str) -> SubmitResult {
    let (_, wrong) = current_keys(service, user_id).await;
    service
        .submit_answer(user_id, &wrong[0].to_string())
        .await
        .expect("answer accepted")
}
