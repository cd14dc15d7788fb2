//! Scripted classroom sessions, end to end, without API calls.

use story_core::testing::{
    assert_last_prompt_contains, assert_locked, assert_no_story, assert_step_text, TestHarness,
};
use story_core::{Action, Outcome, Rejection, StoryError, StoryTemplate, StudentInfo};

const PROFILE: &str = "하늘이는 바닷가에 사는 용감한 토끼예요. 별을 보는 걸 좋아해요.";

async fn harness_with_character() -> TestHarness {
    let mut harness = TestHarness::new();
    harness.expect_text(PROFILE);
    harness
        .submit_words("토끼", "별", "바다")
        .await
        .expect("words accepted");
    harness
}

// =============================================================================
// SEED WORDS
// =============================================================================

#[tokio::test]
async fn test_missing_word_makes_no_call() {
    let mut harness = TestHarness::new();
    let err = harness.submit_words("토끼", " ", "바다").await.unwrap_err();

    assert!(matches!(err, StoryError::Validation(Rejection::MissingWord)));
    assert!(harness.prompts().is_empty());
    assert!(harness.session.character().is_empty());
}

#[tokio::test]
async fn test_banned_word_makes_no_call() {
    let mut harness = TestHarness::new();
    let err = harness.submit_words("knife", "star", "moon").await.unwrap_err();

    assert!(matches!(
        err,
        StoryError::Validation(Rejection::BannedContent { ref word }) if word == "knife"
    ));
    assert!(harness.prompts().is_empty());
}

#[tokio::test]
async fn test_regenerating_character_overwrites() {
    let mut harness = harness_with_character().await;
    harness.expect_text("새 주인공");
    harness.submit_words("고양이", "구름", "피아노").await.unwrap();

    assert_eq!(harness.session.character(), "새 주인공");
    assert_last_prompt_contains(&harness, "'고양이', '구름', '피아노'");
}

#[tokio::test]
async fn test_character_service_error_keeps_nothing() {
    let mut harness = TestHarness::new();
    harness.expect_error("invalid api key");
    let err = harness.submit_words("토끼", "별", "바다").await.unwrap_err();

    assert!(err.to_string().contains("invalid api key"));
    assert!(harness.session.character().is_empty());
    assert!(harness.session.words().is_none());
}

// =============================================================================
// STEPS
// =============================================================================

#[tokio::test]
async fn test_context_chaining_across_authors() {
    let mut harness = harness_with_character().await;

    harness.write(0, "옛날에 바닷가에 하늘이가 살았어요.").await.unwrap();
    harness.expect_text("하늘이는 별을 세었어요.");
    harness.generate(1).await.unwrap();
    assert_step_text(&harness, 1, "그리고 매일 하늘이는 별을 세었어요.");

    harness.write(2, "그러던 어느 날 별똥별이 떨어졌어요.").await.unwrap();
    harness.expect_text("하늘이는 별똥별을 찾으러 갔어요.");
    harness.generate(3).await.unwrap();

    assert_last_prompt_contains(
        &harness,
        "지금까지의 이야기 (참고만 하세요): 옛날에 바닷가에 하늘이가 살았어요. \
         그리고 매일 하늘이는 별을 세었어요. 그러던 어느 날 별똥별이 떨어졌어요.",
    );
    assert_last_prompt_contains(&harness, PROFILE);
    assert_last_prompt_contains(&harness, "'그래서'로 시작하는");
}

#[tokio::test]
async fn test_context_skips_empty_slots() {
    let mut harness = harness_with_character().await;
    harness.write(0, "옛날에 하늘이가 살았어요.").await.unwrap();
    harness.write(2, "그러던 어느 날 비가 왔어요.").await.unwrap();

    assert_eq!(
        harness.session.build_prev_context(3),
        "옛날에 하늘이가 살았어요. 그러던 어느 날 비가 왔어요."
    );
}

#[tokio::test]
async fn test_regenerate_overwrites_step() {
    let mut harness = harness_with_character().await;
    harness.expect_text("첫 번째 시도예요.");
    harness.generate(1).await.unwrap();
    harness.expect_text("두 번째 시도예요.");
    harness.generate(1).await.unwrap();

    assert_step_text(&harness, 1, "그리고 매일 두 번째 시도예요.");
}

#[tokio::test]
async fn test_failed_generation_leaves_step() {
    let mut harness = harness_with_character().await;
    harness.expect_text("처음 장면이에요.");
    harness.generate(1).await.unwrap();

    harness.expect_error("timeout");
    assert!(matches!(harness.generate(1).await, Err(StoryError::Service(_))));
    harness.expect_text("결말이 궁금하죠?");
    assert!(matches!(harness.generate(1).await, Err(StoryError::EmptyGeneration)));

    assert_step_text(&harness, 1, "그리고 매일 처음 장면이에요.");
}

#[tokio::test]
async fn test_lock_and_unlock() {
    let mut harness = harness_with_character().await;
    harness.expect_text("별을 봤어요.");
    harness.generate(1).await.unwrap();

    let outcome = harness.session.dispatch(Action::FinishStep(1)).await.unwrap();
    assert_eq!(outcome, Outcome::StepFinished(1));
    assert_locked(&harness, 1, true);
    assert!(matches!(harness.generate(1).await, Err(StoryError::StepLocked(1))));

    harness.session.dispatch(Action::UnlockStep(1)).await.unwrap();
    assert_locked(&harness, 1, false);
    harness.expect_text("달을 봤어요.");
    harness.generate(1).await.unwrap();
    assert_step_text(&harness, 1, "그리고 매일 달을 봤어요.");
}

#[tokio::test]
async fn test_ai_first_opening_rule() {
    let mut harness = TestHarness::with_template(StoryTemplate::ai_first());
    harness.expect_text("바다 마을에 살았어요. 매일 노래를 불렀어요.");
    harness.generate(0).await.unwrap();

    assert_step_text(
        &harness,
        0,
        "옛날에 한 친구가 바다 마을에 살았어요. 매일 노래를 불렀어요.",
    );
    assert_last_prompt_contains(&harness, "옛날 옛적");
    assert!(matches!(
        harness.write(0, "x").await,
        Err(StoryError::NotManual(0))
    ));
}

// =============================================================================
// ASSEMBLY AND EXPORT
// =============================================================================

#[tokio::test]
async fn test_assembled_view_appears_with_first_step() {
    let mut harness = TestHarness::new();
    assert_no_story(&harness);

    harness.write(0, "옛날에 토끼가 살았어요.").await.unwrap();
    let story = harness.session.assembled_story().expect("story shown");
    assert_eq!(story.to_markdown(), "**옛날에**\n옛날에 토끼가 살았어요.");
    assert_eq!(harness.session.progress().completed, 1);
}

#[tokio::test]
async fn test_polish_fallback_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = harness_with_character().await;
    harness.write(0, "옛날에 하늘이가 살았어요.").await.unwrap();
    harness.write(2, "그러던 어느 날 비가 왔어요.").await.unwrap();
    harness
        .session
        .dispatch(Action::SetStudent(StudentInfo::new("3-2", "", "7", "김하늘")))
        .await
        .unwrap();

    harness.expect_error("server overloaded");
    harness.session.dispatch(Action::Polish).await.unwrap();
    let plain = harness.session.assembled_story().unwrap().to_plain_text();
    assert_eq!(harness.session.polished(), Some(plain.as_str()));

    let outcome = harness
        .session
        .dispatch(Action::Export(Some(dir.path().to_path_buf())))
        .await
        .unwrap();
    let Outcome::Exported(path) = outcome else {
        panic!("expected export outcome");
    };
    assert_eq!(path, dir.path().join("3-2_7_김하늘_story.txt"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), plain);
}

#[tokio::test]
async fn test_polished_text_is_exported_until_edit() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = TestHarness::new();
    harness.write(0, "옛날에 토끼가 살았어요.").await.unwrap();

    harness.expect_text("매끄럽게 다듬은 이야기");
    harness.session.dispatch(Action::Polish).await.unwrap();
    let path = harness.session.export(Some(dir.path().to_path_buf())).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "매끄럽게 다듬은 이야기");
    assert_eq!(path.file_name().unwrap(), "my_story.txt");

    harness.write(0, "옛날에 곰이 살았어요.").await.unwrap();
    assert!(harness.session.polished().is_none());
}

#[tokio::test]
async fn test_export_empty_story() {
    let harness = TestHarness::new();
    assert!(matches!(
        harness.session.export(None).await,
        Err(StoryError::NothingToExport)
    ));
}
