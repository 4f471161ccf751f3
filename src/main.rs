use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use word_lessons::config::Config;
use word_lessons::db::SqliteWordStore;
use word_lessons::lesson::{PromptMode, TaskView, LESSON_LEN};
use word_lessons::logging::init_tracing;
use word_lessons::store::NewWord;
use word_lessons::{LessonError, LessonService, SubmitResult};

const HELP: &str = "\
commands:
  /lesson                                   start a lesson (15 tasks)
  /again                                    start another lesson after finishing
  /cancel                                   drop the current lesson, nothing is saved
  /stat                                     streak, points and the last seven days
  /add word | description | example | tag   add a word
  /exit                                     quit
answer a task with a, b, c, d, 1-4, or the word itself when asked for a word";

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let store = match SqliteWordStore::open(&config.db_path).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(error = %err, path = %config.db_path.display(), "failed to open word store");
            std::process::exit(1);
        }
    };

    let service = LessonService::new(store.clone(), config.lesson_points);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    run(&service, &store, &config.user_id, &mut lines).await;

    store.close().await;
}

async fn run<R>(service: &LessonService, store: &SqliteWordStore, user_id: &str, lines: &mut Lines<R>)
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "failed to read input");
                break;
            }
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/exit" | "/quit" => {
                service.cancel_session(user_id).await;
                break;
            }
            "/help" => println!("{HELP}"),
            "/lesson" | "/again" => start(service, user_id).await,
            "/cancel" => {
                service.cancel_session(user_id).await;
                println!("lesson cancelled, progress discarded");
            }
            "/stat" => show_statistics(service, user_id).await,
            _ if input.starts_with("/add") => add_word(store, user_id, &input["/add".len()..]).await,
            _ if input.starts_with('/') => println!("unknown command, try /help"),
            _ => answer(service, user_id, input).await,
        }
    }
}

async fn start(service: &LessonService, user_id: &str) {
    match service.start_session(user_id).await {
        Ok(started) => {
            println!(
                "lesson of {} tasks built from {} words; all progress is lost if you cancel",
                started.total_tasks, started.pool_size
            );
            show_task(service, user_id).await;
        }
        Err(LessonError::InsufficientWords(count)) => {
            println!("you need at least {LESSON_LEN} words to start a lesson, you have {count}; use /add");
        }
        Err(err) => {
            tracing::error!(user_id, error = %err, "failed to start lesson");
            println!("could not build a lesson right now");
        }
    }
}

async fn answer(service: &LessonService, user_id: &str, input: &str) {
    if !service.has_session(user_id).await {
        println!("no lesson running, type /lesson");
        return;
    }

    match service.submit_answer(user_id, input).await {
        Ok(SubmitResult::Retry { chosen, attempts }) => {
            println!("{chosen} is not it (attempt {attempts}), try again");
            show_task(service, user_id).await;
        }
        Ok(SubmitResult::Advanced { .. }) => {
            println!("correct");
            show_task(service, user_id).await;
        }
        Ok(SubmitResult::SessionComplete { summary, .. }) => {
            println!("end of the lesson");
            println!(
                "result {}%: {} first-try answers, {} mistakes",
                summary.success_percent, summary.first_try_count, summary.total_mistakes
            );
            if summary.failed_writes > 0 {
                println!("some results could not be saved");
            }
            println!("/again for another lesson, /exit to quit");
        }
        Err(LessonError::InvalidInput(_)) => {
            println!("answer with a, b, c or d");
        }
        Err(LessonError::SessionFinished) => {
            println!("the lesson is over, /again or /exit");
        }
        Err(err) if err.is_user_facing() => println!("{err}"),
        Err(err) => {
            tracing::error!(user_id, error = %err, "failed to process answer");
        }
    }
}

async fn show_task(service: &LessonService, user_id: &str) {
    match service.current_task_view(user_id).await {
        Ok(view) => print_task(&view),
        Err(LessonError::SessionFinished) => {}
        Err(err) => tracing::error!(user_id, error = %err, "failed to issue task"),
    }
}

fn print_task(view: &TaskView) {
    println!();
    match view.mode {
        PromptMode::ChooseDescription => {
            println!("{}/{} pick the description of the word", view.number + 1, view.total);
            if let Some(word) = &view.word {
                println!("  \"{word}\"");
            }
            if let Some(example) = &view.example {
                println!("  e.g. {example}");
            }
        }
        PromptMode::ChooseWord => {
            println!("{}/{} pick the word for the description", view.number + 1, view.total);
            if let Some(description) = &view.description {
                println!("  \"{description}\"");
            }
        }
    }
    for (key, text) in &view.options {
        println!("  {key}. {text}");
    }
}

async fn show_statistics(service: &LessonService, user_id: &str) {
    match service.statistics(user_id).await {
        Ok(stats) => {
            println!("streak: {} days", stats.profile.streak);
            println!("points: {}", stats.profile.points);
            println!("words: {}", stats.profile.word_count);
            for (i, day) in stats.series.days.iter().enumerate() {
                println!(
                    "  {day}: first try {}, mistakes {}, points {}",
                    stats.series.first_try[i], stats.series.mistakes[i], stats.series.points[i]
                );
            }
        }
        Err(LessonError::Store(word_lessons::StoreError::NotFound(_))) => {
            println!("no statistics yet, add some words first");
        }
        Err(err) => tracing::error!(user_id, error = %err, "failed to load statistics"),
    }
}

async fn add_word(store: &SqliteWordStore, user_id: &str, args: &str) {
    let parts: Vec<&str> = args.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        println!("usage: /add word | description | example | tag");
        return;
    }
    let new_word = NewWord {
        word: parts[0].to_string(),
        description: parts[1].to_string(),
        example: parts[2].to_string(),
        category: parts.get(3).map(|c| c.to_string()),
    };

    match store.add_word(user_id, &new_word).await {
        Ok(card) => println!("added \"{}\" ({})", card.word, card.category),
        Err(word_lessons::StoreError::Validation(msg)) => println!("not added: {msg}"),
        Err(err) => tracing::error!(user_id, error = %err, "failed to add word"),
    }
}
